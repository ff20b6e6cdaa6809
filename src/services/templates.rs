//! Template import: copy `<templates>/<content>/<type>` into place

use crate::core::{config::NginxOptions, error::DeployError};
use crate::services::{ContentRef, ImportRequest, TemplateImporter};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Importer copying from the templates directory of the options
#[derive(Debug, Clone, Default)]
pub struct FileTemplateImporter;

impl FileTemplateImporter {
    pub fn new() -> Self {
        Self
    }

    /// Location of a piece of content under the templates root
    pub fn source_path(options: &NginxOptions, content: &ContentRef) -> PathBuf {
        options
            .paths
            .templates
            .join(&content.content)
            .join(&content.kind)
    }
}

/// Replace `{{ name }}` placeholders
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> String {
    let mut rendered = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("{{{{ {} }}}}", key);
        rendered = rendered.replace(&placeholder, value);
    }

    rendered
}

/// How [`copy_file`] and [`copy_tree`] write their targets
#[derive(Debug, Clone, Copy)]
pub struct CopyMode<'a> {
    pub overwrite: bool,

    /// Render UTF-8 files with these variables; `None` copies bytes as-is
    pub variables: Option<&'a HashMap<String, String>>,
}

impl CopyMode<'static> {
    /// Plain copy that replaces existing files
    pub fn verbatim() -> Self {
        Self {
            overwrite: true,
            variables: None,
        }
    }
}

impl<'a> CopyMode<'a> {
    /// Rendered copy following the overwrite flag of an import
    pub fn rendered(request: &'a ImportRequest) -> Self {
        Self {
            overwrite: request.overwrite,
            variables: Some(&request.variables),
        }
    }
}

/// What a filesystem entry is, for the purpose of copying it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
    /// Symlinked directories, dangling links and special files
    Skipped,
}

/// Kind of the entry at `path`, following symlinks; `None` when it does not exist
pub async fn path_kind(path: &Path) -> Option<EntryKind> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    Some(if metadata.is_dir() {
        EntryKind::Dir
    } else if metadata.is_file() {
        EntryKind::File
    } else {
        EntryKind::Skipped
    })
}

async fn entry_kind(entry: &tokio::fs::DirEntry) -> Result<EntryKind, DeployError> {
    let path = entry.path();
    let file_type = entry
        .file_type()
        .await
        .map_err(|source| DeployError::Read { path: path.clone(), source })?;

    if file_type.is_dir() {
        return Ok(EntryKind::Dir);
    }
    if file_type.is_file() {
        return Ok(EntryKind::File);
    }
    if !file_type.is_symlink() {
        return Ok(EntryKind::Skipped);
    }

    // Linked files are copied; linked directories are never descended into.
    match path_kind(&path).await {
        Some(EntryKind::File) => Ok(EntryKind::File),
        _ => {
            debug!("Skipping link {}", path.display());
            Ok(EntryKind::Skipped)
        }
    }
}

/// Entries of a directory, sorted by path
pub async fn read_entries(dir: &Path) -> Result<Vec<(PathBuf, EntryKind)>, DeployError> {
    let read_error = |source| DeployError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_error)?;
    let mut listed = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
        listed.push((entry.path(), entry_kind(&entry).await?));
    }
    listed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(listed)
}

pub async fn create_dir(path: &Path) -> Result<(), DeployError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| DeployError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Copy one file, returning whether it was written
pub async fn copy_file(from: &Path, to: &Path, mode: CopyMode<'_>) -> Result<bool, DeployError> {
    if !mode.overwrite && tokio::fs::try_exists(to).await.unwrap_or(false) {
        debug!("Keeping existing {}", to.display());
        return Ok(false);
    }

    let bytes = tokio::fs::read(from).await.map_err(|source| DeployError::Read {
        path: from.to_path_buf(),
        source,
    })?;

    let output = match mode.variables {
        Some(variables) => match String::from_utf8(bytes) {
            Ok(text) => render_template(&text, variables).into_bytes(),
            Err(raw) => raw.into_bytes(),
        },
        None => bytes,
    };

    tokio::fs::write(to, output)
        .await
        .map_err(|source| DeployError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })?;
    Ok(true)
}

/// Copy a directory tree into `target`, returning the number of files written
pub async fn copy_tree(source: &Path, target: &Path, mode: CopyMode<'_>) -> Result<usize, DeployError> {
    let mut written = 0;
    let mut pending = vec![(source.to_path_buf(), target.to_path_buf())];

    while let Some((from_dir, to_dir)) = pending.pop() {
        create_dir(&to_dir).await?;

        for (from, kind) in read_entries(&from_dir).await? {
            let Some(name) = from.file_name() else {
                continue;
            };
            let to = to_dir.join(name);
            match kind {
                EntryKind::Dir => pending.push((from, to)),
                EntryKind::File => {
                    if copy_file(&from, &to, mode).await? {
                        written += 1;
                    }
                }
                EntryKind::Skipped => {}
            }
        }
    }

    Ok(written)
}

#[async_trait]
impl TemplateImporter for FileTemplateImporter {
    async fn import(&self, options: &NginxOptions, request: &ImportRequest) -> Result<(), DeployError> {
        let source = Self::source_path(options, &request.source);
        let mode = CopyMode::rendered(request);

        match path_kind(&source).await {
            Some(EntryKind::Dir) => {
                let written = copy_tree(&source, &request.target, mode).await?;
                debug!("Imported {} file(s) from {}", written, source.display());
            }
            Some(EntryKind::File) => {
                create_dir(&request.target).await?;
                let file_name = source
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(&request.source.kind));
                copy_file(&source, &request.target.join(file_name), mode).await?;
            }
            _ => return Err(DeployError::MissingTemplate { path: source }),
        }
        Ok(())
    }
}
