//! Sites collaborator: environment-supplied and custom site definitions

use crate::core::{config::SitesConfig, context::PipelineContext, error::DeployError};
use crate::services::templates::{
    copy_file, copy_tree, create_dir, path_kind, read_entries, CopyMode, EntryKind, FileTemplateImporter,
};
use crate::services::{ContentRef, SitesService};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A site as described in the sites blob
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SiteDefinition {
    pub name: String,

    #[serde(default)]
    pub domains: Vec<String>,

    /// Document root, defaults to `<site>/<name>`
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Verbatim nginx server configuration
    #[serde(default)]
    pub conf: Option<String>,
}

/// Extract site definitions from `{"sites": [...]}` or a bare array
pub fn site_definitions(sites: &SitesConfig) -> Result<Vec<SiteDefinition>, String> {
    let list = match sites.as_value() {
        Value::Array(_) => sites.as_value().clone(),
        Value::Object(map) => map.get("sites").cloned().unwrap_or(Value::Array(Vec::new())),
        other => return Err(format!("expected an object or array, got {}", other)),
    };

    let definitions: Vec<SiteDefinition> =
        serde_json::from_value(list).map_err(|e| e.to_string())?;

    if let Some(bad) = definitions
        .iter()
        .find(|site| site.name.is_empty() || site.name.contains(['/', '\\']) || site.name == "..")
    {
        return Err(format!("invalid site name '{}'", bad.name));
    }

    Ok(definitions)
}

/// Static server block for a site without verbatim configuration
pub fn render_site_conf(site: &SiteDefinition, root: &Path) -> String {
    let server_name = if site.domains.is_empty() {
        "_".to_string()
    } else {
        site.domains.join(" ")
    };

    format!(
        "server {{\n    listen 80;\n    server_name {};\n    root {};\n    index index.html;\n\n    location / {{\n        try_files $uri $uri/ /index.html;\n    }}\n}}\n",
        server_name,
        root.display()
    )
}

/// Sites collaborator working on the nginx and site directories
#[derive(Debug, Clone, Default)]
pub struct FileSitesService;

impl FileSitesService {
    pub fn new() -> Self {
        Self
    }

    fn site_root(ctx: &PipelineContext, site: &SiteDefinition) -> PathBuf {
        site.root
            .clone()
            .unwrap_or_else(|| ctx.options.paths.nginx.site.join(&site.name))
    }

    fn definitions(phase: &'static str, sites: &SitesConfig) -> Result<Vec<SiteDefinition>, DeployError> {
        site_definitions(sites).map_err(|reason| DeployError::Sites { phase, reason })
    }

    async fn custom_entries(
        ctx: &PipelineContext,
        content: &ContentRef,
    ) -> Result<Vec<(PathBuf, EntryKind)>, DeployError> {
        let dir = FileTemplateImporter::source_path(&ctx.options, content);
        if path_kind(&dir).await != Some(EntryKind::Dir) {
            debug!("No custom sites under {}", dir.display());
            return Ok(Vec::new());
        }
        read_entries(&dir).await
    }
}

#[async_trait]
impl SitesService for FileSitesService {
    async fn sites_deploy(
        &self,
        ctx: &PipelineContext,
        _content: &ContentRef,
        sites: &SitesConfig,
    ) -> Result<(), DeployError> {
        for site in Self::definitions("deploy", sites)? {
            let root = Self::site_root(ctx, &site);
            create_dir(&root).await?;
            info!("Prepared site {} at {}", site.name, root.display());
        }
        Ok(())
    }

    async fn sites_install(
        &self,
        ctx: &PipelineContext,
        _content: &ContentRef,
        sites: &SitesConfig,
    ) -> Result<(), DeployError> {
        let sites_enabled = ctx.options.sites_enabled_dir();
        create_dir(&sites_enabled).await?;

        for site in Self::definitions("install", sites)? {
            let conf = match &site.conf {
                Some(conf) => conf.clone(),
                None => render_site_conf(&site, &Self::site_root(ctx, &site)),
            };
            let path = sites_enabled.join(format!("{}.conf", site.name));
            tokio::fs::write(&path, conf)
                .await
                .map_err(|source| DeployError::Write { path: path.clone(), source })?;
            info!("Enabled site {}", site.name);
        }
        Ok(())
    }

    async fn custom_deploy(&self, ctx: &PipelineContext, content: &ContentRef) -> Result<(), DeployError> {
        for (entry, kind) in Self::custom_entries(ctx, content).await? {
            let Some(name) = entry.file_name() else {
                continue;
            };
            if kind != EntryKind::Dir {
                continue;
            }
            let target = ctx.options.paths.nginx.site.join(name);
            copy_tree(&entry, &target, CopyMode::verbatim()).await?;
            debug!("Deployed custom site content {}", target.display());
        }
        Ok(())
    }

    async fn custom_install(&self, ctx: &PipelineContext, content: &ContentRef) -> Result<(), DeployError> {
        let sites_enabled = ctx.options.sites_enabled_dir();
        for (entry, kind) in Self::custom_entries(ctx, content).await? {
            let is_conf = entry.extension().is_some_and(|ext| ext == "conf");
            let Some(name) = entry.file_name() else {
                continue;
            };
            if !is_conf || kind != EntryKind::File {
                continue;
            }
            create_dir(&sites_enabled).await?;
            copy_file(&entry, &sites_enabled.join(name), CopyMode::verbatim()).await?;
            debug!("Enabled custom site {}", entry.display());
        }
        Ok(())
    }
}
