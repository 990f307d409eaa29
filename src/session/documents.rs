//! Loading configured documents.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::types::{AppError, Document, DocumentSpec, Result};

/// Where session documents come from
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Read the full text of `spec`
    async fn load(&self, spec: &DocumentSpec) -> Result<Document>;
}

/// Reads documents from disk, resolving relative paths against a base directory
#[derive(Debug, Clone)]
pub struct FsDocumentSource {
    base_dir: PathBuf,
}

impl FsDocumentSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

#[async_trait]
impl DocumentSource for FsDocumentSource {
    async fn load(&self, spec: &DocumentSpec) -> Result<Document> {
        let path = self.resolve(&spec.path);

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::DocumentNotFound {
                    name: spec.name.clone(),
                    path: path.display().to_string(),
                }
            } else {
                AppError::InvalidInput(format!(
                    "could not read document '{}' at {}: {}",
                    spec.name,
                    path.display(),
                    e
                ))
            }
        })?;

        debug!(document = %spec.name, path = %path.display(), chars = content.chars().count(), "loaded document");
        Ok(Document::new(spec.name.clone(), content))
    }
}
