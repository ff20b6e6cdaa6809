//! Console UI configuration rewrite

use crate::core::error::DeployError;
use crate::services::{ConsoleService, ConsoleUpdateRequest, Outcome};
use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

/// Configuration file embedded in the console UI bundle
pub const CONSOLE_CONFIG_FILE: &str = "config.js";

/// Console updater that edits `config.js` in place
#[derive(Debug, Clone, Default)]
pub struct FileConsoleService;

impl FileConsoleService {
    pub fn new() -> Self {
        Self
    }
}

/// Replace the string value assigned to `key` (`key: "..."` or `key = '...'`)
///
/// Returns the rewritten text and the number of replacements made.
pub fn replace_string_value(source: &str, key: &str, value: &str) -> (String, usize) {
    let pattern = format!(
        r#"(\b{}["']?\s*[:=]\s*)(["'])[^"']*(["'])"#,
        regex::escape(key)
    );
    let Ok(regex) = Regex::new(&pattern) else {
        return (source.to_string(), 0);
    };

    let count = regex.find_iter(source).count();
    let replaced = regex.replace_all(source, |caps: &regex::Captures<'_>| {
        format!("{}{}{}{}", &caps[1], &caps[2], value, &caps[3])
    });
    (replaced.into_owned(), count)
}

#[async_trait]
impl ConsoleService for FileConsoleService {
    async fn update_config(&self, request: &ConsoleUpdateRequest) -> Result<Outcome, DeployError> {
        let path = request.location.join(CONSOLE_CONFIG_FILE);
        let mut content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Console UI configuration {} not readable: {}", path.display(), e);
                return Ok(Outcome::Failure);
            }
        };

        let mut replacements = 0;
        if let Some(ext_key) = &request.ext_key {
            let (updated, count) = replace_string_value(&content, "extKey", ext_key);
            content = updated;
            replacements += count;
        }
        if let Some(prefix) = &request.domain_prefix {
            let (updated, count) = replace_string_value(&content, "domainPrefix", prefix);
            content = updated;
            replacements += count;
        }

        if replacements == 0 {
            debug!("No console UI settings matched in {}", path.display());
            return Ok(Outcome::Failure);
        }

        tokio::fs::write(&path, content)
            .await
            .map_err(|source| DeployError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(Outcome::Success)
    }
}
