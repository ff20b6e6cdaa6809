//! Sites steps for both lifecycle moments

use crate::core::{
    config::EnvBlob,
    context::PipelineContext,
    error::DeployError,
    step::{Step, StepInputs, StepOutcome},
};
use crate::services::ContentRef;
use async_trait::async_trait;
use tracing::warn;

/// Lifecycle moment a sites step belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitesPhase {
    Deploy,
    Install,
}

/// Apply the environment-supplied sites configuration, if present and parseable
pub struct EnvSites {
    phase: SitesPhase,
}

impl EnvSites {
    pub fn new(phase: SitesPhase) -> Self {
        Self { phase }
    }
}

#[async_trait]
impl Step for EnvSites {
    fn name(&self) -> &'static str {
        match self.phase {
            SitesPhase::Deploy => "deploy-env-sites",
            SitesPhase::Install => "install-env-sites",
        }
    }

    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        inputs: StepInputs<'_>,
    ) -> Result<StepOutcome, DeployError> {
        let sites = match inputs.env.sites_config() {
            EnvBlob::Absent => return Ok(StepOutcome::skipped("no sites configuration")),
            EnvBlob::Malformed(reason) => {
                warn!("Unable to parse the content of the sites configuration: {}", reason);
                return Ok(StepOutcome::skipped("malformed sites configuration"));
            }
            EnvBlob::Parsed(sites) => sites,
        };

        let content = ContentRef::nginx_sites();
        let service = &inputs.services.sites;
        match self.phase {
            SitesPhase::Deploy => service.sites_deploy(ctx, &content, &sites).await?,
            SitesPhase::Install => service.sites_install(ctx, &content, &sites).await?,
        }
        Ok(StepOutcome::Completed)
    }
}

/// Apply the custom site definitions shipped with the templates; always runs
pub struct CustomSites {
    phase: SitesPhase,
}

impl CustomSites {
    pub fn new(phase: SitesPhase) -> Self {
        Self { phase }
    }
}

#[async_trait]
impl Step for CustomSites {
    fn name(&self) -> &'static str {
        match self.phase {
            SitesPhase::Deploy => "deploy-custom-sites",
            SitesPhase::Install => "install-custom-sites",
        }
    }

    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        inputs: StepInputs<'_>,
    ) -> Result<StepOutcome, DeployError> {
        let content = ContentRef::nginx_sites();
        let service = &inputs.services.sites;
        match self.phase {
            SitesPhase::Deploy => service.custom_deploy(ctx, &content).await?,
            SitesPhase::Install => service.custom_install(ctx, &content).await?,
        }
        Ok(StepOutcome::Completed)
    }
}
