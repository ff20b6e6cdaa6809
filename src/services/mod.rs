//! Collaborators the pipelines drive
//!
//! Each concern sits behind a trait so the pipelines can run against the
//! filesystem implementations in production and recording mocks in tests.

pub mod console;
pub mod gateway;
pub mod sites;
pub mod templates;

use crate::core::{
    config::{GatewayDescriptor, NginxOptions, SitesConfig, SslConfig},
    context::PipelineContext,
    error::DeployError,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

pub use console::FileConsoleService;
pub use gateway::FileGatewayService;
pub use sites::FileSitesService;
pub use templates::FileTemplateImporter;

/// Success signal of collaborators that never raise errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl From<bool> for Outcome {
    fn from(done: bool) -> Self {
        if done {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

/// Names a piece of template content, e.g. `nginx` / `sites-enabled`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRef {
    pub content: String,
    pub kind: String,
}

impl ContentRef {
    pub fn new(content: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: kind.into(),
        }
    }

    /// The sites content both sites collaborators work with
    pub fn nginx_sites() -> Self {
        Self::new("nginx", "sites")
    }
}

/// Parameters for the gateway upstream fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub location: PathBuf,
    pub ip: String,
    pub port: String,
    pub label: String,
}

/// Parameters for the gateway api server block
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfRequest {
    pub location: PathBuf,
    pub domain: Option<String>,
    pub label: String,
    pub ssl: Option<SslConfig>,
    /// SSL domains known when the fragment is generated
    pub ssl_domains: Vec<String>,
    pub cert_dir: PathBuf,
}

/// Parameters for the console UI configuration rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleUpdateRequest {
    pub location: PathBuf,
    pub domain_prefix: Option<String>,
    pub ext_key: Option<String>,
}

/// Parameters for a template import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRequest {
    pub source: ContentRef,
    pub target: PathBuf,
    /// Whether existing files in the target are replaced
    pub overwrite: bool,
    pub variables: HashMap<String, String>,
}

/// Resolves the gateway and generates its nginx fragments
#[async_trait]
pub trait GatewayService: Send + Sync {
    /// Resolve a gateway descriptor from an opaque locator
    async fn fetch_conf(&self, locator: &str) -> Option<GatewayDescriptor>;

    /// Write the upstream fragment
    async fn upstream(&self, request: &UpstreamRequest) -> Outcome;

    /// Write the api server block
    async fn api(&self, request: &ApiConfRequest) -> Outcome;
}

/// Rewrites the deployed console UI's embedded configuration
#[async_trait]
pub trait ConsoleService: Send + Sync {
    async fn update_config(&self, request: &ConsoleUpdateRequest) -> Result<Outcome, DeployError>;
}

/// Copies static nginx templates into place
#[async_trait]
pub trait TemplateImporter: Send + Sync {
    async fn import(&self, options: &NginxOptions, request: &ImportRequest) -> Result<(), DeployError>;
}

/// Applies sites configuration before (deploy) and after (install) nginx setup
#[async_trait]
pub trait SitesService: Send + Sync {
    async fn sites_deploy(
        &self,
        ctx: &PipelineContext,
        content: &ContentRef,
        sites: &SitesConfig,
    ) -> Result<(), DeployError>;

    async fn sites_install(
        &self,
        ctx: &PipelineContext,
        content: &ContentRef,
        sites: &SitesConfig,
    ) -> Result<(), DeployError>;

    async fn custom_deploy(&self, ctx: &PipelineContext, content: &ContentRef) -> Result<(), DeployError>;

    async fn custom_install(&self, ctx: &PipelineContext, content: &ContentRef) -> Result<(), DeployError>;
}

/// The set of collaborators a pipeline run uses
#[derive(Clone)]
pub struct Services {
    pub gateway: Arc<dyn GatewayService>,
    pub console: Arc<dyn ConsoleService>,
    pub templates: Arc<dyn TemplateImporter>,
    pub sites: Arc<dyn SitesService>,
}

impl Services {
    /// Filesystem-backed collaborators
    pub fn filesystem() -> Self {
        Self {
            gateway: Arc::new(FileGatewayService::new()),
            console: Arc::new(FileConsoleService::new()),
            templates: Arc::new(FileTemplateImporter::new()),
            sites: Arc::new(FileSitesService::new()),
        }
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::filesystem()
    }
}
