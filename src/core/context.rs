//! Pipeline context - state shared by the steps of one pipeline run

use crate::core::config::{GatewayDescriptor, NginxOptions, SslConfig};
use std::collections::HashMap;
use std::path::PathBuf;

/// Mutable record threaded through every step of a single pipeline run
///
/// Created fresh for each `deploy`/`install` call and never persisted.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Caller-supplied options (paths and label), read-only for the steps
    pub options: NginxOptions,

    /// SSL-relevant domains, in append order; duplicates are kept
    pub ssl_domain: Vec<String>,

    /// Parsed SSL configuration, if one was supplied
    pub ssl_configuration: Option<SslConfig>,

    /// Resolved gateway descriptor
    pub gateway_conf: Option<GatewayDescriptor>,
}

impl PipelineContext {
    /// Create a new context for the given options
    pub fn new(options: NginxOptions) -> Self {
        Self {
            options,
            ssl_domain: Vec::new(),
            ssl_configuration: None,
            gateway_conf: None,
        }
    }

    /// nginx label from the options
    pub fn label(&self) -> &str {
        &self.options.nginx.label
    }

    /// Append domains to the SSL domain list
    pub fn extend_ssl_domains<I>(&mut self, domains: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.ssl_domain.extend(domains);
    }

    /// SSL domains joined the way the `domains` file stores them
    pub fn ssl_domain_line(&self) -> Option<String> {
        if self.ssl_domain.is_empty() {
            None
        } else {
            Some(self.ssl_domain.join(","))
        }
    }

    /// Path of the file listing SSL domains
    pub fn ssl_domains_file(&self) -> PathBuf {
        self.options.paths.nginx.cert.join("domains")
    }

    /// Record the resolved gateway. Later calls are ignored.
    ///
    /// A non-empty gateway domain is appended to the SSL domains.
    pub fn set_gateway_conf(&mut self, descriptor: GatewayDescriptor) {
        if self.gateway_conf.is_some() {
            return;
        }
        if let Some(domain) = descriptor.gateway_domain() {
            self.ssl_domain.push(domain.to_string());
        }
        self.gateway_conf = Some(descriptor);
    }

    /// Whether gateway-dependent steps should run
    pub fn has_gateway(&self) -> bool {
        self.gateway_conf.is_some()
    }

    /// Variables available for template rendering
    pub fn template_variables(&self) -> HashMap<String, String> {
        let paths = &self.options.paths.nginx;
        let mut vars = HashMap::new();
        vars.insert("label".to_string(), self.label().to_string());
        vars.insert("conf_dir".to_string(), paths.conf.display().to_string());
        vars.insert("cert_dir".to_string(), paths.cert.display().to_string());
        vars.insert("site_dir".to_string(), paths.site.display().to_string());

        if let Some(domain) = self.gateway_conf.as_ref().and_then(GatewayDescriptor::gateway_domain) {
            vars.insert("gateway_domain".to_string(), domain.to_string());
        }

        vars
    }
}
