//! View state of the patient details screen.
//!
//! The holder starts in `loading`, settles once to `loaded` or `not_found` from the store
//! lookup, and ignores every update after [`ViewStateHolder::unmount`]. A store failure also
//! settles to `not_found`: the user sees the same "no data" screen as for a missing record,
//! while the cause is kept and logged.

use crate::constants::{MSG_LOADING, MSG_NO_PATIENT_DATA};
use crate::error::StoreError;
use crate::record::{PatientDetails, Record};
use crate::store::{FetchOutcome, RecordStore};
use records_types::RecordId;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewStatus {
    Loading,
    Loaded,
    NotFound,
}

/// Why the view ended up in `not_found`. Never shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundCause {
    Missing,
    StoreUnavailable,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub status: ViewStatus,
    pub record: Option<Record>,
    pub not_found_cause: Option<NotFoundCause>,
}

impl ViewState {
    fn loading() -> Self {
        Self {
            status: ViewStatus::Loading,
            record: None,
            not_found_cause: None,
        }
    }
}

/// What a load did to the view.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded,
    Missing,
    Failed(StoreError),
    /// The view was unmounted while the fetch was in flight; nothing was applied.
    Discarded,
}

/// What the surface should draw.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Screen {
    Loading { message: &'static str },
    NotFound { message: &'static str },
    Loaded { details: PatientDetails },
}

#[derive(Debug)]
pub struct ViewStateHolder {
    state: Mutex<ViewState>,
    mounted: AtomicBool,
}

impl Default for ViewStateHolder {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewStateHolder {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ViewState::loading()),
            mounted: AtomicBool::new(true),
        }
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches `id` and settles the view.
    pub async fn load<S>(&self, store: &S, id: &RecordId) -> LoadOutcome
    where
        S: RecordStore + ?Sized,
    {
        let fetched = store.fetch_by_id(id).await;

        let (next, outcome) = match fetched {
            Ok(FetchOutcome::Found(record)) => {
                tracing::debug!(%id, "patient record loaded");
                (
                    ViewState {
                        status: ViewStatus::Loaded,
                        record: Some(record),
                        not_found_cause: None,
                    },
                    LoadOutcome::Loaded,
                )
            }
            Ok(FetchOutcome::NotFound) => {
                tracing::info!(%id, "no such patient record");
                (not_found(NotFoundCause::Missing), LoadOutcome::Missing)
            }
            Err(e) => {
                tracing::error!(%id, backend = store.backend_tag(), "error fetching patient: {}", e);
                (
                    not_found(NotFoundCause::StoreUnavailable),
                    LoadOutcome::Failed(e),
                )
            }
        };

        if !self.apply(next) {
            tracing::debug!(%id, "view unmounted before fetch completed; result dropped");
            return LoadOutcome::Discarded;
        }
        outcome
    }

    /// Replaces the state unless the view has been unmounted. Returns whether it applied.
    fn apply(&self, next: ViewState) -> bool {
        let mut state = self.state();
        // Checked under the state lock so an unmount cannot interleave with the write.
        if !self.mounted.load(Ordering::SeqCst) {
            return false;
        }
        *state = next;
        true
    }

    /// Drops the record after it has been deleted from the store.
    ///
    /// Applies even to an unmounted view, so a deleted record is never handed out again.
    pub fn clear_deleted(&self) {
        *self.state() = not_found(NotFoundCause::Missing);
    }

    /// Stops all further state updates. Pending confirmations are not affected.
    pub fn unmount(&self) {
        let _state = self.state();
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> ViewState {
        self.state().clone()
    }

    pub fn status(&self) -> ViewStatus {
        self.state().status
    }

    pub fn record(&self) -> Option<Record> {
        self.state().record.clone()
    }

    /// Id of the loaded record, if one is loaded.
    pub fn record_id(&self) -> Option<RecordId> {
        self.state().record.as_ref().map(|r| r.id.clone())
    }

    pub fn render(&self) -> Screen {
        let state = self.state();
        match (&state.status, &state.record) {
            (ViewStatus::Loading, _) => Screen::Loading {
                message: MSG_LOADING,
            },
            (ViewStatus::Loaded, Some(record)) => match PatientDetails::from_record(record) {
                Ok(details) => Screen::Loaded { details },
                Err(e) => {
                    tracing::warn!(id = %record.id, "patient record cannot be displayed: {}", e);
                    Screen::NotFound {
                        message: MSG_NO_PATIENT_DATA,
                    }
                }
            },
            _ => Screen::NotFound {
                message: MSG_NO_PATIENT_DATA,
            },
        }
    }
}

fn not_found(cause: NotFoundCause) -> ViewState {
    ViewState {
        status: ViewStatus::NotFound,
        record: None,
        not_found_cause: Some(cause),
    }
}
