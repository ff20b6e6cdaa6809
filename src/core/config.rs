//! Deployer configuration: options file, environment snapshot and JSON blobs

use crate::core::error::DeployError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Environment variable holding the SSL configuration blob
pub const SSL_CONFIG_VAR: &str = "SOAJS_SSL_CONFIG";
/// Environment variable holding the sites configuration blob
pub const SITES_CONFIG_VAR: &str = "SOAJS_SITES_CONFIG";
/// Environment variable locating the gateway configuration
pub const GATEWAY_CONFIG_VAR: &str = "SOAJS_GATEWAY_CONFIG";
/// Environment variable naming the running environment
pub const ENV_NAME_VAR: &str = "SOAJS_ENV";
/// Environment variable holding the console external key
pub const EXT_KEY_VAR: &str = "SOAJS_EXTKEY";

/// Environment name (lowercase) that enables the console UI update
pub const CONSOLE_ENV_NAME: &str = "dashboard";

/// Options supplied by the caller of `deploy`, `install` and `run`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NginxOptions {
    #[serde(default)]
    pub paths: Paths,

    #[serde(default)]
    pub nginx: NginxSettings,
}

/// Filesystem locations used by the pipelines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    #[serde(default)]
    pub nginx: NginxPaths,

    /// Root of the template content, laid out as `<templates>/<content>/<type>`
    #[serde(default = "default_templates_dir")]
    pub templates: PathBuf,
}

/// nginx directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NginxPaths {
    /// nginx configuration directory (holds nginx.conf, conf.d/, sites-enabled/)
    #[serde(default = "default_conf_dir")]
    pub conf: PathBuf,

    /// Certificate directory (holds the `domains` file)
    #[serde(default = "default_cert_dir")]
    pub cert: PathBuf,

    /// Root of the deployed sites
    #[serde(default = "default_site_dir")]
    pub site: PathBuf,
}

/// nginx process settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NginxSettings {
    /// Label used to name the gateway upstream
    #[serde(default = "default_label")]
    pub label: String,

    /// Program spawned by `run`
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Arguments passed to the program
    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("./templates")
}

fn default_conf_dir() -> PathBuf {
    PathBuf::from("/etc/nginx")
}

fn default_cert_dir() -> PathBuf {
    PathBuf::from("/etc/nginx/ssl")
}

fn default_site_dir() -> PathBuf {
    PathBuf::from("/opt/soajs/site")
}

fn default_label() -> String {
    "nginx".to_string()
}

fn default_binary() -> String {
    "nginx".to_string()
}

fn default_args() -> Vec<String> {
    vec!["-g".to_string(), "daemon off;".to_string()]
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            nginx: NginxPaths::default(),
            templates: default_templates_dir(),
        }
    }
}

impl Default for NginxPaths {
    fn default() -> Self {
        Self {
            conf: default_conf_dir(),
            cert: default_cert_dir(),
            site: default_site_dir(),
        }
    }
}

impl Default for NginxSettings {
    fn default() -> Self {
        Self {
            label: default_label(),
            binary: default_binary(),
            args: default_args(),
        }
    }
}

impl NginxOptions {
    /// Load options from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, DeployError> {
        let content = std::fs::read_to_string(path).map_err(|source| DeployError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Load options from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, DeployError> {
        serde_yaml::from_str(yaml).map_err(|e| DeployError::Options(e.to_string()))
    }

    /// Directory receiving the gateway upstream fragment
    pub fn upstream_dir(&self) -> PathBuf {
        self.paths.nginx.conf.join("conf.d")
    }

    /// The nginx sites-enabled directory
    pub fn sites_enabled_dir(&self) -> PathBuf {
        self.paths.nginx.conf.join("sites-enabled")
    }

    /// Directory of the deployed console UI
    pub fn console_ui_dir(&self) -> PathBuf {
        self.paths.nginx.site.join("soajs.dashboard.ui")
    }
}

/// Result of decoding an environment-supplied JSON blob
#[derive(Debug, Clone, PartialEq)]
pub enum EnvBlob<T> {
    /// Variable unset or empty
    Absent,
    /// Variable set but not decodable
    Malformed(String),
    /// Variable decoded
    Parsed(T),
}

impl<T> EnvBlob<T> {
    pub fn parsed(self) -> Option<T> {
        match self {
            EnvBlob::Parsed(value) => Some(value),
            _ => None,
        }
    }
}

/// Snapshot of the environment variables the pipelines read
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub ssl_config: Option<String>,
    pub sites_config: Option<String>,
    pub gateway_locator: Option<String>,
    pub env_name: Option<String>,
    pub ext_key: Option<String>,
}

impl EnvConfig {
    /// Capture the current process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        Self {
            ssl_config: get(SSL_CONFIG_VAR),
            sites_config: get(SITES_CONFIG_VAR),
            gateway_locator: get(GATEWAY_CONFIG_VAR),
            env_name: get(ENV_NAME_VAR),
            ext_key: get(EXT_KEY_VAR),
        }
    }

    /// Decode the SSL configuration blob
    pub fn ssl_config(&self) -> EnvBlob<SslConfig> {
        match decode_blob(self.ssl_config.as_deref()) {
            EnvBlob::Parsed(value) => match SslConfig::from_value(value) {
                Some(config) => EnvBlob::Parsed(config),
                None => EnvBlob::Absent,
            },
            EnvBlob::Malformed(reason) => EnvBlob::Malformed(reason),
            EnvBlob::Absent => EnvBlob::Absent,
        }
    }

    /// Decode the sites configuration blob
    pub fn sites_config(&self) -> EnvBlob<SitesConfig> {
        match decode_blob(self.sites_config.as_deref()) {
            EnvBlob::Parsed(value) => EnvBlob::Parsed(SitesConfig(value)),
            EnvBlob::Malformed(reason) => EnvBlob::Malformed(reason),
            EnvBlob::Absent => EnvBlob::Absent,
        }
    }

    /// Whether the running environment is the one whose console UI gets updated
    pub fn is_console_env(&self) -> bool {
        self.env_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase() == CONSOLE_ENV_NAME)
    }
}

fn decode_blob(raw: Option<&str>) -> EnvBlob<Value> {
    match raw {
        None => EnvBlob::Absent,
        Some(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Null) => EnvBlob::Absent,
            Ok(value) => EnvBlob::Parsed(value),
            Err(e) => EnvBlob::Malformed(e.to_string()),
        },
    }
}

/// SSL configuration supplied through the environment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SslConfig {
    /// Domains listed under `domains`, in order
    pub domains: Vec<String>,

    /// The blob as supplied, forwarded verbatim to certificate-aware generators
    pub raw: Value,
}

impl SslConfig {
    /// Interpret a decoded blob. `domains` is only honoured when it is an array.
    pub fn from_value(raw: Value) -> Option<Self> {
        if raw.is_null() {
            return None;
        }
        let domains = match raw.get("domains") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        };
        Some(Self { domains, raw })
    }
}

/// Sites configuration, opaque to the pipelines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitesConfig(pub Value);

impl SitesConfig {
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Gateway descriptor resolved once per install run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayDescriptor {
    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default)]
    pub domain_prefix: Option<String>,

    pub ip: String,

    #[serde(deserialize_with = "port_from_number_or_string")]
    pub port: String,
}

impl GatewayDescriptor {
    /// Gateway domain, with an empty string treated as unset
    pub fn gateway_domain(&self) -> Option<&str> {
        self.domain.as_deref().filter(|domain| !domain.is_empty())
    }
}

fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u64),
        Text(String),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Number(n) => n.to_string(),
        Port::Text(s) => s,
    })
}
