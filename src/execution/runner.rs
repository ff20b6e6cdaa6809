//! nginx process runner - spawns nginx in the foreground and waits for it

use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info};

/// Error types for the process runner
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Lifecycle of the supervised process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerState {
    Starting,
    Running { pid: Option<u32> },
    /// Exit code is `None` when the process was killed by a signal
    Exited(Option<i32>),
    Failed(String),
}

/// Single-shot foreground supervisor
///
/// The child inherits stdin/stdout/stderr, so nginx logs stream straight
/// to the caller's output. No restart, no health check.
#[derive(Debug, Clone)]
pub struct NginxRunner {
    program: String,
    args: Vec<String>,
    state: RunnerState,
}

impl NginxRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            state: RunnerState::Starting,
        }
    }

    pub fn state(&self) -> &RunnerState {
        &self.state
    }

    /// Spawn the process and wait for it to exit
    ///
    /// Any exit code counts as success; only spawn or wait failures are errors.
    pub async fn run(&mut self) -> Result<(), RunnerError> {
        info!("Starting {} {}", self.program, self.args.join(" "));

        let spawned = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(source) => {
                error!("nginx process failed with error: {}", source);
                self.state = RunnerState::Failed(source.to_string());
                return Err(RunnerError::Spawn {
                    program: self.program.clone(),
                    source,
                });
            }
        };

        self.state = RunnerState::Running { pid: child.id() };

        match child.wait().await {
            Ok(status) => {
                let code = status.code();
                match code {
                    Some(code) => info!("nginx process exited with code: {}", code),
                    None => info!("nginx process terminated by signal"),
                }
                self.state = RunnerState::Exited(code);
                Ok(())
            }
            Err(source) => {
                error!("nginx process failed with error: {}", source);
                self.state = RunnerState::Failed(source.to_string());
                Err(RunnerError::Wait {
                    program: self.program.clone(),
                    source,
                })
            }
        }
    }
}
