//! Filesystem gateway collaborator: descriptor lookup and nginx fragments

use crate::core::{config::GatewayDescriptor, error::DeployError};
use crate::services::{ApiConfRequest, GatewayService, Outcome, UpstreamRequest};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the generated api server block
pub const API_CONF_FILE: &str = "api.conf";

/// Gateway collaborator backed by local files
#[derive(Debug, Clone, Default)]
pub struct FileGatewayService;

impl FileGatewayService {
    pub fn new() -> Self {
        Self
    }

    /// Decode a locator: inline JSON when it starts with `{`, otherwise a file path
    pub async fn resolve(&self, locator: &str) -> Result<GatewayDescriptor, DeployError> {
        let trimmed = locator.trim();
        let content = if trimmed.starts_with('{') {
            trimmed.to_string()
        } else {
            let path = PathBuf::from(trimmed);
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| DeployError::Read { path, source })?
        };

        serde_json::from_str(&content).map_err(|e| DeployError::Gateway(e.to_string()))
    }

    /// File name of the upstream fragment for a label
    pub fn upstream_file_name(label: &str) -> String {
        format!("{}.upstream.conf", label)
    }
}

/// Render the upstream block
pub fn render_upstream(request: &UpstreamRequest) -> String {
    format!(
        "upstream {label} {{\n    server {ip}:{port};\n    keepalive 16;\n}}\n",
        label = request.label,
        ip = request.ip,
        port = request.port,
    )
}

/// Render the api server block(s)
///
/// A TLS server is added when the gateway domain is one of the SSL domains.
pub fn render_api_conf(request: &ApiConfRequest) -> String {
    let domain = request.domain.as_deref().filter(|domain| !domain.is_empty());
    let server_name = domain.unwrap_or("_");
    let proxy = format!(
        "    location / {{\n        proxy_pass http://{label};\n        proxy_http_version 1.1;\n        proxy_set_header Connection \"\";\n        proxy_set_header Host $host;\n        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;\n        proxy_set_header X-Forwarded-Proto $scheme;\n    }}\n",
        label = request.label
    );

    let mut conf = format!(
        "server {{\n    listen 80;\n    server_name {server_name};\n{proxy}}}\n"
    );

    let tls_domain = domain
        .filter(|domain| request.ssl.is_some() && request.ssl_domains.iter().any(|d| d == domain));

    if let Some(domain) = tls_domain {
        let cert_dir = request.cert_dir.join(domain);
        conf.push_str(&format!(
            "\nserver {{\n    listen 443 ssl;\n    server_name {server_name};\n    ssl_certificate {};\n    ssl_certificate_key {};\n{proxy}}}\n",
            cert_dir.join("fullchain.pem").display(),
            cert_dir.join("privkey.pem").display(),
        ));
    }

    conf
}

async fn write_fragment(dir: &Path, file_name: &str, content: &str) -> Outcome {
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!("Unable to create {}: {}", dir.display(), e);
        return Outcome::Failure;
    }

    let path = dir.join(file_name);
    match tokio::fs::write(&path, content).await {
        Ok(()) => {
            debug!("Wrote {}", path.display());
            Outcome::Success
        }
        Err(e) => {
            warn!("Unable to write {}: {}", path.display(), e);
            Outcome::Failure
        }
    }
}

#[async_trait]
impl GatewayService for FileGatewayService {
    async fn fetch_conf(&self, locator: &str) -> Option<GatewayDescriptor> {
        match self.resolve(locator).await {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                warn!("Unable to resolve gateway configuration: {}", e);
                None
            }
        }
    }

    async fn upstream(&self, request: &UpstreamRequest) -> Outcome {
        write_fragment(
            &request.location,
            &Self::upstream_file_name(&request.label),
            &render_upstream(request),
        )
        .await
    }

    async fn api(&self, request: &ApiConfRequest) -> Outcome {
        write_fragment(&request.location, API_CONF_FILE, &render_api_conf(request)).await
    }
}
