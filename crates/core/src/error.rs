use records_types::RecordId;

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write preferences file: {0}")]
    PreferencesWrite(std::io::Error),
    #[error("failed to read preferences file: {0}")]
    PreferencesRead(std::io::Error),
    #[error("failed to serialize preferences: {0}")]
    PreferencesSerialization(serde_json::Error),
    #[error("failed to deserialize preferences: {0}")]
    PreferencesDeserialization(serde_json::Error),
    #[error("missing patient field `{0}`")]
    MissingField(&'static str),
    #[error("invalid patient field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;

/// Failures raised by a [`RecordStore`](crate::store::RecordStore).
///
/// A missing document on fetch is not an error; it is reported as
/// [`FetchOutcome::NotFound`](crate::store::FetchOutcome::NotFound). Deleting a missing
/// document, however, is [`StoreError::Missing`] because the store does not promise
/// idempotent deletes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("record {0} does not exist")]
    Missing(RecordId),
    #[error("record store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode stored record: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
