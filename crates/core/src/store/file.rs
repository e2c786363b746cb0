//! Filesystem-backed document store.
//!
//! ## Storage Layout
//!
//! ```text
//! <patient_data_dir>/
//!   patients/
//!     <record-id>.json    # one JSON object per patient
//! ```
//!
//! The document id is the file stem. Record ids are validated by [`RecordId`] so they cannot
//! escape the collection directory.

use super::{FetchOutcome, RecordStore};
use crate::constants::RECORD_FILE_EXTENSION;
use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use crate::CoreConfig;
use async_trait::async_trait;
use records_types::RecordId;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(cfg.patients_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &RecordId) -> PathBuf {
        self.root
            .join(format!("{}.{}", id.as_str(), RECORD_FILE_EXTENSION))
    }

    /// Writes `record`, replacing any document with the same id.
    ///
    /// This is an administrative entry point for seeding data; the UI core never writes.
    pub async fn put(&self, record: &Record) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let body = serde_json::to_vec_pretty(&record.fields)?;
        tokio::fs::write(self.record_path(&record.id), body).await?;
        Ok(())
    }

    /// Lists the ids of all stored documents, sorted. Files that are not valid ids are skipped.
    pub async fn list_ids(&self) -> StoreResult<Vec<RecordId>> {
        let mut ids = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_FILE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match RecordId::parse(stem) {
                Ok(id) => ids.push(id),
                Err(e) => tracing::warn!("skipping {}: {}", path.display(), e),
            }
        }

        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl RecordStore for FileStore {
    fn backend_tag(&self) -> &'static str {
        "file"
    }

    async fn fetch_by_id(&self, id: &RecordId) -> StoreResult<FetchOutcome> {
        let path = self.record_path(id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(FetchOutcome::NotFound),
            Err(e) => {
                return Err(StoreError::Unavailable(format!(
                    "read {} failed: {e}",
                    path.display()
                )))
            }
        };

        let fields: Map<String, Value> = serde_json::from_slice(&bytes)?;
        Ok(FetchOutcome::Found(Record::new(id.clone(), fields)))
    }

    async fn delete(&self, id: &RecordId) -> StoreResult<()> {
        match tokio::fs::remove_file(self.record_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::Missing(id.clone())),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
