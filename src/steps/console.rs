//! Console UI update step

use crate::core::{
    context::PipelineContext,
    error::DeployError,
    step::{Step, StepInputs, StepOutcome},
};
use crate::services::{ConsoleUpdateRequest, Outcome};
use async_trait::async_trait;
use tracing::{info, warn};

/// Point the console UI at the resolved gateway, in the console environment only
pub struct UpdateConsoleUi;

#[async_trait]
impl Step for UpdateConsoleUi {
    fn name(&self) -> &'static str {
        "update-console-ui"
    }

    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        inputs: StepInputs<'_>,
    ) -> Result<StepOutcome, DeployError> {
        let Some(gateway) = &ctx.gateway_conf else {
            return Ok(StepOutcome::skipped("no gateway configuration"));
        };
        if !inputs.env.is_console_env() {
            return Ok(StepOutcome::skipped("not the console environment"));
        }

        info!("Updating console UI with the external key");
        let request = ConsoleUpdateRequest {
            location: ctx.options.console_ui_dir(),
            domain_prefix: gateway.domain_prefix.clone(),
            ext_key: inputs.env.ext_key.clone(),
        };

        match inputs.services.console.update_config(&request).await {
            Ok(Outcome::Success) => info!("Console UI updated successfully"),
            Ok(Outcome::Failure) => warn!("Console UI was not updated"),
            Err(e) => warn!("Console UI update failed: {}", e),
        }
        Ok(StepOutcome::Completed)
    }
}
