//! Error types for deploy/install pipelines

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a pipeline step or one of its collaborators
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template source {} does not exist", .path.display())]
    MissingTemplate { path: PathBuf },

    #[error("invalid gateway descriptor: {0}")]
    Gateway(String),

    #[error("sites {phase} failed: {reason}")]
    Sites { phase: &'static str, reason: String },

    #[error("invalid options: {0}")]
    Options(String),
}

/// A fatal pipeline failure. The caller is expected to terminate the process.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{pipeline} pipeline aborted at step '{step}': {source}")]
    Aborted {
        pipeline: String,
        step: String,
        #[source]
        source: DeployError,
    },
}

impl PipelineError {
    /// Name of the step that aborted the pipeline
    pub fn step(&self) -> &str {
        match self {
            PipelineError::Aborted { step, .. } => step,
        }
    }
}
