//! Source document repositories
//!
//! The issuing system drops one JSON file per business document into a
//! directory; [`DirectorySourceRepository`] reads them back as
//! [`PreparedSource`] values.

use crate::domain::{DocumentSource, EdiError, PreparedSource, Result, SourceRef};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Loads business documents by reference
#[async_trait]
pub trait DocumentSourceRepository: Send + Sync {
    /// `Ok(None)` when the source does not exist
    async fn load(&self, source: &SourceRef) -> Result<Option<Arc<dyn DocumentSource>>>;
}

/// Reads `<directory>/<source_id>.json`
#[derive(Debug, Clone)]
pub struct DirectorySourceRepository {
    directory: PathBuf,
}

impl DirectorySourceRepository {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, source_id: &str) -> Result<PathBuf> {
        if source_id.is_empty()
            || source_id
                .chars()
                .any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control())
            || source_id.starts_with('.')
        {
            return Err(EdiError::Validation(format!(
                "Invalid source id '{source_id}'"
            )));
        }
        Ok(self.directory.join(format!("{source_id}.json")))
    }

    /// Reads a source file directly
    pub async fn read(path: &Path) -> Result<PreparedSource> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            EdiError::Io(format!("Failed to read source file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            EdiError::Serialization(format!("Invalid source file {}: {}", path.display(), e))
        })
    }
}

#[async_trait]
impl DocumentSourceRepository for DirectorySourceRepository {
    async fn load(&self, source: &SourceRef) -> Result<Option<Arc<dyn DocumentSource>>> {
        let path = self.path_for(&source.source_id)?;
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }

        let prepared = Self::read(&path).await?;
        if prepared.kind != source.kind {
            return Err(EdiError::Validation(format!(
                "Source file {} holds a {}, expected {}",
                path.display(),
                prepared.kind,
                source.kind
            )));
        }
        Ok(Some(Arc::new(prepared)))
    }
}
