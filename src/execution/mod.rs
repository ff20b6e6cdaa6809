//! Pipeline execution and the nginx process runner

pub mod engine;
pub mod runner;

pub use engine::{EventHandler, ExecutionEngine, ExecutionEvent};
pub use runner::{NginxRunner, RunnerError, RunnerState};
