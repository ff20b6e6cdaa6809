//! Public entry points: `deploy`, `install` and `run`

use crate::core::{
    config::{EnvConfig, NginxOptions},
    context::PipelineContext,
    error::PipelineError,
    pipeline::Pipeline,
};
use crate::execution::{ExecutionEngine, ExecutionEvent, NginxRunner, RunnerError, RunnerState};
use crate::services::Services;
use std::sync::Arc;

/// Drives the pipelines and the nginx process for one set of options
///
/// Each call builds a fresh [`PipelineContext`]; nothing carries over between
/// calls. Errors from `deploy`/`install` are fatal and the embedding process
/// is expected to exit on them.
#[derive(Clone)]
pub struct Deployer {
    options: NginxOptions,
    env: EnvConfig,
    services: Services,
    on_event: Option<Arc<dyn Fn(ExecutionEvent) + Send + Sync>>,
}

impl Deployer {
    pub fn new(options: NginxOptions, env: EnvConfig, services: Services) -> Self {
        Self {
            options,
            env,
            services,
            on_event: None,
        }
    }

    /// Deployer using the process environment and filesystem collaborators
    pub fn from_env(options: NginxOptions) -> Self {
        Self::new(options, EnvConfig::from_env(), Services::filesystem())
    }

    /// Receive engine events for every pipeline run
    pub fn with_event_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.on_event = Some(Arc::new(handler));
        self
    }

    pub fn options(&self) -> &NginxOptions {
        &self.options
    }

    fn engine(&self) -> ExecutionEngine {
        let engine = ExecutionEngine::new(self.env.clone(), self.services.clone());
        match &self.on_event {
            Some(handler) => {
                let handler = handler.clone();
                engine.with_event_handler(move |event| handler(event))
            }
            None => engine,
        }
    }

    /// Run a pipeline on a fresh context and hand the final context back
    pub async fn execute(&self, mut pipeline: Pipeline) -> Result<(Pipeline, PipelineContext), PipelineError> {
        let mut ctx = PipelineContext::new(self.options.clone());
        self.engine().execute(&mut pipeline, &mut ctx).await?;
        Ok((pipeline, ctx))
    }

    /// Pre-install sites deployment
    pub async fn deploy(&self) -> Result<(), PipelineError> {
        self.execute(Pipeline::deploy()).await.map(|_| ())
    }

    /// Generate and import the nginx configuration
    pub async fn install(&self) -> Result<(), PipelineError> {
        self.execute(Pipeline::install()).await.map(|_| ())
    }

    /// Runner for the configured nginx binary and arguments
    pub fn runner(&self) -> NginxRunner {
        let settings = &self.options.nginx;
        NginxRunner::new(settings.binary.clone(), settings.args.clone())
    }

    /// Run nginx in the foreground until it exits, returning its final state
    pub async fn run(&self) -> Result<RunnerState, RunnerError> {
        let mut runner = self.runner();
        runner.run().await?;
        Ok(runner.state().clone())
    }
}
