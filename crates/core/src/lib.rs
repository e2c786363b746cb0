//! # Records Core
//!
//! Headless UI core for the patient records front end.
//!
//! This crate holds the screen logic that a surface (HTTP or terminal) drives:
//! - the record store seam and its file and in-memory implementations
//! - the confirmation gate that turns a yes/no prompt into a future
//! - the deletion workflow state machine and the patient details view
//! - the navigation shell with its onboarding preference
//!
//! **No transport concerns**: HTTP routing and terminal I/O belong in `records-api-rest` and
//! `records-cli`.

pub mod collaborators;
pub mod config;
pub mod confirmation;
pub mod constants;
pub mod error;
pub mod preferences;
pub mod record;
pub mod screen;
pub mod shell;
pub mod store;
pub mod view;
pub mod workflow;

pub use collaborators::{
    IdentitySession, Navigator, Notification, NotificationKind, Notifier, RecordingNavigator,
    RecordingNotifier, Route, SessionError, SessionUser,
};
pub use config::CoreConfig;
pub use confirmation::{Confirmation, ConfirmationGate, ConfirmationId, Decision, Prompt, Resolution};
pub use constants::DEFAULT_PATIENT_DATA_DIR;
pub use error::{PatientError, PatientResult, StoreError, StoreResult};
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use record::{DetailRow, PatientDetails, Record};
pub use screen::PatientDetailsScreen;
pub use shell::{MenuItem, NavigationShell, ShellView};
pub use store::{FetchOutcome, FileStore, InMemoryStore, RecordStore};
pub use view::{Screen, ViewStateHolder, ViewStatus};
pub use workflow::{DeleteOutcome, DeletionWorkflow, IgnoreReason, WorkflowState};

pub use records_types::{NonEmptyText, RecordId, TextError};
