//! Core domain models
//!
//! Options, environment blobs, the per-run context, step and pipeline
//! definitions, and their execution state.

pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod state;
pub mod step;

pub use config::*;
pub use context::*;
pub use error::*;
pub use pipeline::*;
pub use state::*;
pub use step::*;
