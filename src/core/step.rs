//! Step abstraction shared by the deploy and install pipelines

use crate::core::{config::EnvConfig, context::PipelineContext, error::DeployError};
use crate::services::Services;
use async_trait::async_trait;

/// What a step did when it returned without error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step did its work (collaborator failures that are only logged still count)
    Completed,
    /// The step's guard did not hold; context untouched
    Skipped(String),
}

impl StepOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        StepOutcome::Skipped(reason.into())
    }
}

/// Read-only inputs handed to every step
#[derive(Clone, Copy)]
pub struct StepInputs<'a> {
    pub env: &'a EnvConfig,
    pub services: &'a Services,
}

/// A single pipeline step
///
/// Returning `Err` aborts the rest of the pipeline.
#[async_trait]
pub trait Step: Send + Sync {
    /// Stable identifier used in logs and step records
    fn name(&self) -> &'static str;

    /// Run the step against the shared context
    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        inputs: StepInputs<'_>,
    ) -> Result<StepOutcome, DeployError>;
}
