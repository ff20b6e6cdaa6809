//! Option flags shared by every command

use crate::core::{config::NginxOptions, error::DeployError};
use clap::Args;
use std::path::PathBuf;

/// Options file and per-field overrides
#[derive(Debug, Args, Clone, Default)]
pub struct OptionsArgs {
    /// Path to a YAML options file
    #[arg(long, global = true)]
    pub options: Option<PathBuf>,

    /// nginx configuration directory
    #[arg(long, global = true)]
    pub conf_dir: Option<PathBuf>,

    /// Certificate directory
    #[arg(long, global = true)]
    pub cert_dir: Option<PathBuf>,

    /// Sites root directory
    #[arg(long, global = true)]
    pub site_dir: Option<PathBuf>,

    /// Templates root directory
    #[arg(long, global = true)]
    pub templates_dir: Option<PathBuf>,

    /// nginx label
    #[arg(long, global = true)]
    pub label: Option<String>,

    /// Program started by `run`
    #[arg(long, global = true)]
    pub nginx_bin: Option<String>,
}

impl OptionsArgs {
    /// Load the options file (if any) and apply the flag overrides
    pub fn resolve(&self) -> Result<NginxOptions, DeployError> {
        let mut options = match &self.options {
            Some(path) => NginxOptions::from_file(path)?,
            None => NginxOptions::default(),
        };

        if let Some(conf) = &self.conf_dir {
            options.paths.nginx.conf = conf.clone();
        }
        if let Some(cert) = &self.cert_dir {
            options.paths.nginx.cert = cert.clone();
        }
        if let Some(site) = &self.site_dir {
            options.paths.nginx.site = site.clone();
        }
        if let Some(templates) = &self.templates_dir {
            options.paths.templates = templates.clone();
        }
        if let Some(label) = &self.label {
            options.nginx.label = label.clone();
        }
        if let Some(binary) = &self.nginx_bin {
            options.nginx.binary = binary.clone();
        }

        Ok(options)
    }
}
