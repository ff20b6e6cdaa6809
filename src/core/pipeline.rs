//! Pipeline definitions

use crate::core::{
    state::{PipelineState, StepState},
    step::Step,
};
use crate::steps::{
    console::UpdateConsoleUi,
    gateway::{FetchGatewayConf, GenerateApiConf, GenerateUpstream},
    sites::{CustomSites, EnvSites, SitesPhase},
    ssl::{ResetSslDomains, WriteSslDomains},
    templates::{ImportTemplate, TemplateTarget},
};
use std::fmt;

/// A recorded step and its state
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub name: &'static str,
    pub state: StepState,
}

/// An ordered list of steps plus their execution records
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Steps, in execution order
    steps: Vec<Box<dyn Step>>,

    /// One record per step, same order as `steps`
    records: Vec<StepRecord>,

    /// Execution state
    pub state: PipelineState,
}

impl Pipeline {
    /// Build a pipeline from an ordered list of steps
    pub fn new(name: impl Into<String>, steps: Vec<Box<dyn Step>>) -> Self {
        let records = steps
            .iter()
            .map(|step| StepRecord {
                name: step.name(),
                state: StepState::Pending,
            })
            .collect();

        Self {
            name: name.into(),
            steps,
            records,
            state: PipelineState::new(),
        }
    }

    /// Pre-install pipeline: sites from the environment, then custom sites
    pub fn deploy() -> Self {
        Self::new(
            "deploy",
            vec![
                Box::new(EnvSites::new(SitesPhase::Deploy)),
                Box::new(CustomSites::new(SitesPhase::Deploy)),
            ],
        )
    }

    /// Install pipeline
    ///
    /// Gateway-dependent steps sit between gateway resolution and the template
    /// imports so that imported templates never clobber generated fragments.
    pub fn install() -> Self {
        Self::new(
            "install",
            vec![
                Box::new(ResetSslDomains),
                Box::new(WriteSslDomains),
                Box::new(FetchGatewayConf),
                Box::new(GenerateUpstream),
                Box::new(GenerateApiConf),
                Box::new(UpdateConsoleUi),
                Box::new(ImportTemplate::new(TemplateTarget::SitesEnabled)),
                Box::new(ImportTemplate::new(TemplateTarget::NginxConf)),
                Box::new(EnvSites::new(SitesPhase::Install)),
                Box::new(CustomSites::new(SitesPhase::Install)),
            ],
        )
    }

    /// Number of steps
    pub(crate) fn len(&self) -> usize {
        self.steps.len()
    }

    /// Step names in execution order
    pub fn step_names(&self) -> Vec<&'static str> {
        self.records.iter().map(|r| r.name).collect()
    }

    /// Records of every step
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// State of a step by name
    pub fn step_state(&self, name: &str) -> Option<&StepState> {
        self.records
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.state)
    }

    pub(crate) fn step_at(&self, index: usize) -> &dyn Step {
        self.steps[index].as_ref()
    }

    pub(crate) fn set_state(&mut self, index: usize, state: StepState) {
        self.records[index].state = state;
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("records", &self.records)
            .field("state", &self.state)
            .finish()
    }
}
