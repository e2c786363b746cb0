//! Persistent UI preferences.
//!
//! A tiny key-value store of boolean flags, such as whether the onboarding tooltip has been
//! dismissed. The file variant keeps a single JSON object on disk.

use crate::error::{PatientError, PatientResult};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

pub trait PreferenceStore: Send + Sync {
    fn get_flag(&self, key: &str) -> PatientResult<Option<bool>>;

    fn set_flag(&self, key: &str, value: bool) -> PatientResult<()>;
}

#[derive(Clone, Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> PatientResult<BTreeMap<String, bool>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(PatientError::PreferencesDeserialization)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(PatientError::PreferencesRead(e)),
        }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get_flag(&self, key: &str) -> PatientResult<Option<bool>> {
        Ok(self.read_all()?.get(key).copied())
    }

    fn set_flag(&self, key: &str, value: bool) -> PatientResult<()> {
        let mut all = self.read_all()?;
        all.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(PatientError::StorageDirCreation)?;
        }
        let body =
            serde_json::to_string_pretty(&all).map_err(PatientError::PreferencesSerialization)?;
        std::fs::write(&self.path, body).map_err(PatientError::PreferencesWrite)
    }
}

#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    flags: Mutex<BTreeMap<String, bool>>,
    writes: Mutex<usize>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_flag(&self, key: &str) -> PatientResult<Option<bool>> {
        let flags = self.flags.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(flags.get(key).copied())
    }

    fn set_flag(&self, key: &str, value: bool) -> PatientResult<()> {
        self.flags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FilePreferenceStore::new(temp_dir.path().join("nested/prefs.json"));

        assert_eq!(store.get_flag("firstLogin").unwrap(), None);
        store.set_flag("firstLogin", true).unwrap();
        store.set_flag("other", false).unwrap();

        let reopened = FilePreferenceStore::new(store.path());
        assert_eq!(reopened.get_flag("firstLogin").unwrap(), Some(true));
        assert_eq!(reopened.get_flag("other").unwrap(), Some(false));
    }

    #[test]
    fn test_file_store_reports_corrupt_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("prefs.json");
        std::fs::write(&path, "[1,2").unwrap();

        let err = FilePreferenceStore::new(&path)
            .get_flag("firstLogin")
            .expect_err("corrupt file");
        assert!(matches!(err, PatientError::PreferencesDeserialization(_)));
    }
}
