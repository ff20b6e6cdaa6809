//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::OptionsArgs;
use std::ffi::OsString;

/// Prepares nginx for the platform gateway and runs it in the foreground
#[derive(Debug, Parser, Clone)]
#[command(name = "nginx-deployer")]
#[command(version = "0.1.0")]
#[command(about = "Prepares nginx for the platform gateway and runs it in the foreground", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub options: OptionsArgs,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Apply sites configuration before install
    Deploy,

    /// Generate and import the nginx configuration
    Install,

    /// Run nginx in the foreground
    Run,

    /// Deploy, install, then run nginx
    Up,
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
