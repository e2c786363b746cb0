//! Constants used throughout the records core crate.
//!
//! User-facing copy lives here as well as storage names, so every surface renders the same
//! wording.

/// Default directory for patient data storage when no explicit directory is configured.
pub const DEFAULT_PATIENT_DATA_DIR: &str = "patient_data";

/// Collection (directory) holding one JSON document per patient record.
pub const PATIENTS_COLLECTION: &str = "patients";

/// Extension of stored patient documents.
pub const RECORD_FILE_EXTENSION: &str = "json";

/// Default filename for persisted UI preferences, relative to the patient data directory.
pub const PREFERENCES_FILENAME: &str = "preferences.json";

/// Preference key recording that the user has dismissed the onboarding tooltip.
pub const FIRST_LOGIN_KEY: &str = "firstLogin";

/// Width to which `patientID` is zero-padded for display.
pub const PATIENT_ID_DISPLAY_WIDTH: usize = 4;

/// Date format used for the record timestamp (`MM/dd/yyyy`).
pub const DISPLAY_DATE_FORMAT: &str = "%m/%d/%Y";

pub const DELETE_PROMPT_TITLE: &str = "Confirm Deletion";
pub const DELETE_PROMPT_MESSAGE: &str =
    "Are you sure you want to delete this patient record? This action cannot be undone.";

pub const MSG_DELETE_SUCCESS: &str = "Patient record deleted successfully.";
pub const MSG_DELETE_FAILED: &str = "Failed to delete patient record.";
pub const MSG_PATIENT_NOT_FOUND: &str = "Patient not found.";
pub const MSG_FETCH_FAILED: &str = "Failed to fetch patient details.";
pub const MSG_NO_PATIENT_DATA: &str = "No patient data available.";
pub const MSG_LOADING: &str = "Loading...";
pub const MSG_LOGOUT_SUCCESS: &str = "Logged out successfully.";
pub const MSG_LOGOUT_FAILED: &str = "Failed to logout. Please try again.";
pub const MSG_ONBOARDING_TOOLTIP: &str = "Click the menu icon to navigate.";
