//! Concrete steps of the deploy and install pipelines

pub mod console;
pub mod gateway;
pub mod sites;
pub mod ssl;
pub mod templates;
