//! File storage contract and the local filesystem backend.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use basekit_errors::{Problem, catalog};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage path '{0}'")]
    InvalidPath(String),

    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn to_problem(&self) -> Problem {
        let def = match self {
            StorageError::InvalidPath(_) => catalog::INVALID_VALUE,
            StorageError::Io(_) => catalog::INTERNAL,
        };
        def.as_problem(self.to_string())
    }
}

/// An uploaded file held in memory.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            data: data.into(),
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Lowercased extension of the original filename, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(str::to_lowercase)
    }
}

/// Where uploaded files are kept.
///
/// Implementations are interchangeable; a stored path returned by `save` is
/// the only handle callers keep.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Persist `file` under `folder` with a fresh name. Returns the stored path
    /// `folder/<uuid>.<ext>`.
    async fn save(&self, file: &UploadFile, folder: &str) -> Result<String>;

    /// Remove a stored file. A missing file is not an error.
    ///
    /// `path` is either a stored path or a name relative to `folder`.
    async fn delete(&self, path: &str, folder: &str) -> Result<()>;

    /// Public URL of a stored path.
    fn url(&self, path: &str) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Root directory for stored files.
    pub media_dir: PathBuf,
    /// URL prefix under which `media_dir` is served.
    pub media_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_dir: PathBuf::from("media"),
            media_url: "/media/".to_owned(),
        }
    }
}

/// Stores files below a media directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    media_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, media_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            media_url: media_url.into(),
        }
    }

    #[must_use]
    pub fn from_config(cfg: &StorageConfig) -> Self {
        Self::new(cfg.media_dir.clone(), cfg.media_url.clone())
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        Ok(self.root.join(checked(relative)?))
    }
}

/// Reject anything that could leave the media directory.
fn checked(relative: &str) -> Result<&Path> {
    let path = Path::new(relative);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if relative.is_empty() || escapes {
        return Err(StorageError::InvalidPath(relative.to_owned()));
    }
    Ok(path)
}

fn stored_path(path: &str, folder: &str) -> String {
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() || path.starts_with(&format!("{folder}/")) {
        path.to_owned()
    } else {
        format!("{folder}/{path}")
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn save(&self, file: &UploadFile, folder: &str) -> Result<String> {
        let folder = folder.trim_end_matches('/');
        let dir = self.resolve(folder)?;
        tokio::fs::create_dir_all(&dir).await?;

        let name = match file.extension() {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        tokio::fs::write(dir.join(&name), &file.data).await?;

        let stored = format!("{folder}/{name}");
        info!(path = %stored, bytes = file.data.len(), "file stored");
        Ok(stored)
    }

    async fn delete(&self, path: &str, folder: &str) -> Result<()> {
        let stored = stored_path(path, folder);
        let target = self.resolve(&stored)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                info!(path = %stored, "file deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %stored, "file already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.media_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}
