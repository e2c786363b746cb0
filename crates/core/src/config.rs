//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Environment variables are read by the binaries only, never while
//! handling a request.

use crate::constants::{PATIENTS_COLLECTION, PREFERENCES_FILENAME};
use crate::{PatientError, PatientResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    patient_data_dir: PathBuf,
    preferences_file: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// When `preferences_file` is `None` the preferences live next to the patient documents.
    pub fn new(patient_data_dir: PathBuf, preferences_file: Option<PathBuf>) -> PatientResult<Self> {
        if patient_data_dir.as_os_str().is_empty() {
            return Err(PatientError::InvalidInput(
                "patient_data_dir cannot be empty".into(),
            ));
        }

        let preferences_file =
            preferences_file.unwrap_or_else(|| patient_data_dir.join(PREFERENCES_FILENAME));

        Ok(Self {
            patient_data_dir,
            preferences_file,
        })
    }

    pub fn patient_data_dir(&self) -> &Path {
        &self.patient_data_dir
    }

    pub fn patients_dir(&self) -> PathBuf {
        self.patient_data_dir.join(PATIENTS_COLLECTION)
    }

    pub fn preferences_file(&self) -> &Path {
        &self.preferences_file
    }
}

/// Normalise an optional path value taken from the environment.
///
/// Empty or whitespace-only values are treated as unset.
pub fn path_from_env_value(value: Option<String>) -> Option<PathBuf> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults_preferences_next_to_data() {
        let cfg = CoreConfig::new(PathBuf::from("/data"), None).expect("config should build");
        assert_eq!(cfg.patients_dir(), PathBuf::from("/data/patients"));
        assert_eq!(
            cfg.preferences_file(),
            Path::new("/data/preferences.json")
        );
    }

    #[test]
    fn test_new_rejects_empty_data_dir() {
        let err = CoreConfig::new(PathBuf::new(), None).expect_err("empty dir should fail");
        assert!(matches!(err, PatientError::InvalidInput(_)));
    }

    #[test]
    fn test_path_from_env_value_ignores_blank() {
        assert_eq!(path_from_env_value(None), None);
        assert_eq!(path_from_env_value(Some("   ".into())), None);
        assert_eq!(
            path_from_env_value(Some(" /tmp/prefs.json ".into())),
            Some(PathBuf::from("/tmp/prefs.json"))
        );
    }
}
