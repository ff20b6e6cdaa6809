//! Template import steps

use crate::core::{
    context::PipelineContext,
    error::DeployError,
    step::{Step, StepInputs, StepOutcome},
};
use crate::services::{ContentRef, ImportRequest};
use async_trait::async_trait;
use tracing::{error, info};

/// Which static template a step imports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateTarget {
    /// Default sites into `<conf>/sites-enabled/`, never overwriting
    SitesEnabled,
    /// The main `nginx.conf` into `<conf>/`
    NginxConf,
}

/// Import a static template; failure aborts the pipeline
pub struct ImportTemplate {
    target: TemplateTarget,
}

impl ImportTemplate {
    pub fn new(target: TemplateTarget) -> Self {
        Self { target }
    }

    fn request(&self, ctx: &PipelineContext) -> ImportRequest {
        let (kind, target, overwrite) = match self.target {
            TemplateTarget::SitesEnabled => ("sites-enabled", ctx.options.sites_enabled_dir(), false),
            TemplateTarget::NginxConf => ("nginx.conf", ctx.options.paths.nginx.conf.clone(), true),
        };

        ImportRequest {
            source: ContentRef::new("nginx", kind),
            target,
            overwrite,
            variables: ctx.template_variables(),
        }
    }
}

#[async_trait]
impl Step for ImportTemplate {
    fn name(&self) -> &'static str {
        match self.target {
            TemplateTarget::SitesEnabled => "import-sites-enabled",
            TemplateTarget::NginxConf => "import-nginx-conf",
        }
    }

    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        inputs: StepInputs<'_>,
    ) -> Result<StepOutcome, DeployError> {
        let request = self.request(ctx);
        inputs
            .services
            .templates
            .import(&ctx.options, &request)
            .await
            .inspect_err(|e| error!("Template import {} failed: {}", request.source.kind, e))?;

        info!(
            "Imported {} into {}",
            request.source.kind,
            request.target.display()
        );
        Ok(StepOutcome::Completed)
    }
}
