//! Gateway resolution and gateway-dependent fragment generation

use crate::core::{
    context::PipelineContext,
    error::DeployError,
    step::{Step, StepInputs, StepOutcome},
};
use crate::services::{ApiConfRequest, UpstreamRequest};
use async_trait::async_trait;
use tracing::{info, warn};

const NO_GATEWAY: &str = "no gateway configuration";

/// Resolve the gateway descriptor from the environment locator
pub struct FetchGatewayConf;

#[async_trait]
impl Step for FetchGatewayConf {
    fn name(&self) -> &'static str {
        "fetch-gateway-conf"
    }

    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        inputs: StepInputs<'_>,
    ) -> Result<StepOutcome, DeployError> {
        let Some(locator) = inputs.env.gateway_locator.as_deref() else {
            return Ok(StepOutcome::skipped("no gateway locator"));
        };

        info!("Fetching gateway configuration");
        match inputs.services.gateway.fetch_conf(locator).await {
            Some(descriptor) => ctx.set_gateway_conf(descriptor),
            None => warn!("Gateway configuration could not be resolved"),
        }
        Ok(StepOutcome::Completed)
    }
}

/// Write the upstream fragment under `<conf>/conf.d/`
pub struct GenerateUpstream;

#[async_trait]
impl Step for GenerateUpstream {
    fn name(&self) -> &'static str {
        "generate-upstream"
    }

    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        inputs: StepInputs<'_>,
    ) -> Result<StepOutcome, DeployError> {
        let Some(gateway) = &ctx.gateway_conf else {
            return Ok(StepOutcome::skipped(NO_GATEWAY));
        };

        info!("Creating gateway upstream");
        let request = UpstreamRequest {
            location: ctx.options.upstream_dir(),
            ip: gateway.ip.clone(),
            port: gateway.port.clone(),
            label: ctx.label().to_string(),
        };

        if inputs.services.gateway.upstream(&request).await.is_success() {
            info!("Upstream created successfully");
        } else {
            warn!("Upstream could not be created");
        }
        Ok(StepOutcome::Completed)
    }
}

/// Write the api server block under `<conf>/sites-enabled/`
pub struct GenerateApiConf;

#[async_trait]
impl Step for GenerateApiConf {
    fn name(&self) -> &'static str {
        "generate-api-conf"
    }

    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        inputs: StepInputs<'_>,
    ) -> Result<StepOutcome, DeployError> {
        let Some(gateway) = &ctx.gateway_conf else {
            return Ok(StepOutcome::skipped(NO_GATEWAY));
        };

        info!("Creating gateway api.conf");
        let request = ApiConfRequest {
            location: ctx.options.sites_enabled_dir(),
            domain: gateway.gateway_domain().map(String::from),
            label: ctx.label().to_string(),
            ssl: ctx.ssl_configuration.clone(),
            ssl_domains: ctx.ssl_domain.clone(),
            cert_dir: ctx.options.paths.nginx.cert.clone(),
        };

        if inputs.services.gateway.api(&request).await.is_success() {
            info!("api.conf created successfully");
        } else {
            warn!("api.conf could not be created");
        }
        Ok(StepOutcome::Completed)
    }
}
