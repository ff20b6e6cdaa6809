//! nginx-deployer - prepares the gateway nginx configuration and runs nginx

pub mod cli;
pub mod core;
pub mod deployer;
pub mod execution;
pub mod services;
pub mod steps;

// Re-export commonly used types
pub use self::core::{DeployError, EnvConfig, NginxOptions, Pipeline, PipelineContext, PipelineError, StepState};
pub use deployer::Deployer;
pub use execution::{ExecutionEngine, ExecutionEvent, NginxRunner, RunnerError, RunnerState};
pub use services::{Outcome, Services};
