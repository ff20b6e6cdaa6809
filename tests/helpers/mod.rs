//! Shared test utilities: recording mock collaborators

#![allow(dead_code)]

use async_trait::async_trait;
use nginx_deployer::core::config::{EnvConfig, GatewayDescriptor, NginxOptions, SitesConfig};
use nginx_deployer::core::context::PipelineContext;
use nginx_deployer::core::error::DeployError;
use nginx_deployer::services::{
    ApiConfRequest, ConsoleService, ConsoleUpdateRequest, ContentRef, GatewayService, ImportRequest,
    Outcome, Services, SitesService, TemplateImporter, UpstreamRequest,
};
use nginx_deployer::{Deployer, Pipeline, PipelineError};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Ordered log of collaborator calls shared by all mocks
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn record(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, call: &str) -> bool {
        self.calls().iter().any(|c| c == call)
    }

    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls().iter().position(|c| c == call)
    }
}

/// Gateway mock returning a fixed descriptor
pub struct MockGateway {
    pub log: CallLog,
    pub descriptor: Option<GatewayDescriptor>,
    pub outcome: Outcome,
    pub locators: Mutex<Vec<String>>,
    pub api_requests: Mutex<Vec<ApiConfRequest>>,
    pub upstream_requests: Mutex<Vec<UpstreamRequest>>,
}

#[async_trait]
impl GatewayService for MockGateway {
    async fn fetch_conf(&self, locator: &str) -> Option<GatewayDescriptor> {
        self.log.record("gateway.fetch");
        self.locators.lock().unwrap().push(locator.to_string());
        self.descriptor.clone()
    }

    async fn upstream(&self, request: &UpstreamRequest) -> Outcome {
        self.log.record("gateway.upstream");
        self.upstream_requests.lock().unwrap().push(request.clone());
        self.outcome
    }

    async fn api(&self, request: &ApiConfRequest) -> Outcome {
        self.log.record("gateway.api");
        self.api_requests.lock().unwrap().push(request.clone());
        self.outcome
    }
}

/// Console mock
pub struct MockConsole {
    pub log: CallLog,
    pub fail_with_error: bool,
    pub requests: Mutex<Vec<ConsoleUpdateRequest>>,
}

#[async_trait]
impl ConsoleService for MockConsole {
    async fn update_config(&self, request: &ConsoleUpdateRequest) -> Result<Outcome, DeployError> {
        self.log.record("console.update");
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_with_error {
            return Err(DeployError::Options("console exploded".to_string()));
        }
        Ok(Outcome::Success)
    }
}

/// Template importer mock; fails for the listed template kinds
pub struct MockTemplates {
    pub log: CallLog,
    pub fail_kinds: Vec<String>,
}

#[async_trait]
impl TemplateImporter for MockTemplates {
    async fn import(&self, _options: &NginxOptions, request: &ImportRequest) -> Result<(), DeployError> {
        self.log.record(format!("templates.{}", request.source.kind));
        if self.fail_kinds.contains(&request.source.kind) {
            return Err(DeployError::MissingTemplate {
                path: PathBuf::from(format!("/templates/nginx/{}", request.source.kind)),
            });
        }
        Ok(())
    }
}

/// Sites mock; optionally fails the environment-sites calls
pub struct MockSites {
    pub log: CallLog,
    pub fail_env_sites: bool,
    pub received: Mutex<Vec<SitesConfig>>,
}

impl MockSites {
    fn env_result(&self, phase: &'static str) -> Result<(), DeployError> {
        if self.fail_env_sites {
            Err(DeployError::Sites {
                phase,
                reason: "rejected".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SitesService for MockSites {
    async fn sites_deploy(
        &self,
        _ctx: &PipelineContext,
        _content: &ContentRef,
        sites: &SitesConfig,
    ) -> Result<(), DeployError> {
        self.log.record("sites.deploy");
        self.received.lock().unwrap().push(sites.clone());
        self.env_result("deploy")
    }

    async fn sites_install(
        &self,
        _ctx: &PipelineContext,
        _content: &ContentRef,
        sites: &SitesConfig,
    ) -> Result<(), DeployError> {
        self.log.record("sites.install");
        self.received.lock().unwrap().push(sites.clone());
        self.env_result("install")
    }

    async fn custom_deploy(&self, _ctx: &PipelineContext, _content: &ContentRef) -> Result<(), DeployError> {
        self.log.record("sites.custom_deploy");
        Ok(())
    }

    async fn custom_install(&self, _ctx: &PipelineContext, _content: &ContentRef) -> Result<(), DeployError> {
        self.log.record("sites.custom_install");
        Ok(())
    }
}

/// Builder for a mocked set of collaborators
pub struct MockServices {
    pub log: CallLog,
    pub gateway: Arc<MockGateway>,
    pub console: Arc<MockConsole>,
    pub templates: Arc<MockTemplates>,
    pub sites: Arc<MockSites>,
}

impl MockServices {
    pub fn new() -> Self {
        Self::build(None, Outcome::Success, false, Vec::new(), false)
    }

    pub fn with_gateway(descriptor: GatewayDescriptor) -> Self {
        Self::build(Some(descriptor), Outcome::Success, false, Vec::new(), false)
    }

    pub fn build(
        descriptor: Option<GatewayDescriptor>,
        outcome: Outcome,
        console_error: bool,
        fail_kinds: Vec<&str>,
        fail_env_sites: bool,
    ) -> Self {
        let log = CallLog::default();
        Self {
            gateway: Arc::new(MockGateway {
                log: log.clone(),
                descriptor,
                outcome,
                locators: Mutex::new(Vec::new()),
                api_requests: Mutex::new(Vec::new()),
                upstream_requests: Mutex::new(Vec::new()),
            }),
            console: Arc::new(MockConsole {
                log: log.clone(),
                fail_with_error: console_error,
                requests: Mutex::new(Vec::new()),
            }),
            templates: Arc::new(MockTemplates {
                log: log.clone(),
                fail_kinds: fail_kinds.into_iter().map(String::from).collect(),
            }),
            sites: Arc::new(MockSites {
                log: log.clone(),
                fail_env_sites,
                received: Mutex::new(Vec::new()),
            }),
            log,
        }
    }

    pub fn services(&self) -> Services {
        Services {
            gateway: self.gateway.clone(),
            console: self.console.clone(),
            templates: self.templates.clone(),
            sites: self.sites.clone(),
        }
    }
}

/// Gateway descriptor used across tests
pub fn gateway(domain: Option<&str>) -> GatewayDescriptor {
    GatewayDescriptor {
        domain: domain.map(String::from),
        domain_prefix: Some("api".to_string()),
        ip: "10.0.0.5".to_string(),
        port: "4000".to_string(),
    }
}

/// Environment snapshot from key/value pairs
pub fn env(pairs: &[(&str, &str)]) -> EnvConfig {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    EnvConfig::from_lookup(|key| vars.get(key).cloned())
}

/// Options rooted in a temporary directory
pub fn temp_options(root: &std::path::Path) -> NginxOptions {
    let mut options = NginxOptions::default();
    options.paths.nginx.conf = root.join("nginx");
    options.paths.nginx.cert = root.join("cert");
    options.paths.nginx.site = root.join("site");
    options.paths.templates = root.join("templates");
    std::fs::create_dir_all(&options.paths.nginx.cert).unwrap();
    options
}

/// Run the install pipeline and return the final pipeline and context
pub async fn run_install(
    options: NginxOptions,
    env: EnvConfig,
    mocks: &MockServices,
) -> Result<(Pipeline, PipelineContext), PipelineError> {
    Deployer::new(options, env, mocks.services())
        .execute(Pipeline::install())
        .await
}

/// Run the deploy pipeline and return the final pipeline and context
pub async fn run_deploy(
    options: NginxOptions,
    env: EnvConfig,
    mocks: &MockServices,
) -> Result<(Pipeline, PipelineContext), PipelineError> {
    Deployer::new(options, env, mocks.services())
        .execute(Pipeline::deploy())
        .await
}
