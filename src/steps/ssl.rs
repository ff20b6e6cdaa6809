//! SSL domain steps

use crate::core::{
    config::EnvBlob,
    context::PipelineContext,
    error::DeployError,
    step::{Step, StepInputs, StepOutcome},
};
use async_trait::async_trait;
use tracing::{info, warn};

/// Seed step of the install pipeline: start from an empty SSL domain list
pub struct ResetSslDomains;

#[async_trait]
impl Step for ResetSslDomains {
    fn name(&self) -> &'static str {
        "reset-ssl-domains"
    }

    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        _inputs: StepInputs<'_>,
    ) -> Result<StepOutcome, DeployError> {
        ctx.ssl_domain.clear();
        Ok(StepOutcome::Completed)
    }
}

/// Parse the SSL blob and persist its domains to `<cert>/domains`
///
/// Runs before gateway resolution, so the file never lists the gateway domain.
pub struct WriteSslDomains;

#[async_trait]
impl Step for WriteSslDomains {
    fn name(&self) -> &'static str {
        "write-ssl-domains"
    }

    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        inputs: StepInputs<'_>,
    ) -> Result<StepOutcome, DeployError> {
        ctx.ssl_configuration = None;

        let config = match inputs.env.ssl_config() {
            EnvBlob::Absent => return Ok(StepOutcome::skipped("no SSL configuration")),
            EnvBlob::Malformed(reason) => {
                warn!("Unable to parse the content of the SSL configuration: {}", reason);
                return Ok(StepOutcome::skipped("malformed SSL configuration"));
            }
            EnvBlob::Parsed(config) => config,
        };

        ctx.extend_ssl_domains(config.domains.iter().cloned());
        ctx.ssl_configuration = Some(config);

        let Some(line) = ctx.ssl_domain_line() else {
            return Ok(StepOutcome::Completed);
        };

        let path = ctx.ssl_domains_file();
        tokio::fs::write(&path, line.as_bytes()).await.map_err(|source| {
            warn!("An error occurred while writing {}, for ssl domain", path.display());
            DeployError::Write {
                path: path.clone(),
                source,
            }
        })?;
        info!("Wrote {} SSL domain(s) to {}", ctx.ssl_domain.len(), path.display());

        Ok(StepOutcome::Completed)
    }
}
