//! Deletion workflow controller.
//!
//! ```text
//! Idle -> AwaitingConfirmation -> Cancelled ------------------> Idle
//!                              -> Deleting -> DeleteFailed ---> Idle
//!                                          -> Deleted
//! ```
//!
//! A trigger is only accepted from `Idle`; the check and the transition happen under one lock,
//! so a double click while a prompt is open or a delete is running is ignored instead of
//! opening a second prompt. Cancelling is silent. Every failed delete produces exactly one error
//! notification and leaves the record loaded for a manual retry.

use crate::collaborators::{Navigator, Notifier, Route};
use crate::confirmation::ConfirmationGate;
use crate::constants::{DELETE_PROMPT_MESSAGE, MSG_DELETE_FAILED, MSG_DELETE_SUCCESS};
use crate::error::StoreError;
use crate::store::RecordStore;
use crate::view::ViewStateHolder;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    AwaitingConfirmation,
    Deleting,
    Deleted,
}

/// Why a delete trigger was ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// No record is loaded (still fetching, or the fetch found nothing).
    NoRecord,
    /// A prompt is open or a delete is running.
    Busy,
    AlreadyDeleted,
}

#[derive(Debug)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
    Failed(StoreError),
    Ignored(IgnoreReason),
}

pub struct DeletionWorkflow {
    store: Arc<dyn RecordStore>,
    gate: ConfirmationGate,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    view: Arc<ViewStateHolder>,
    state: Mutex<WorkflowState>,
}

impl DeletionWorkflow {
    pub fn new(
        store: Arc<dyn RecordStore>,
        gate: ConfirmationGate,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        view: Arc<ViewStateHolder>,
    ) -> Self {
        Self {
            store,
            gate,
            notifier,
            navigator,
            view,
            state: Mutex::new(WorkflowState::Idle),
        }
    }

    pub fn state(&self) -> WorkflowState {
        *lock(&self.state)
    }

    /// Runs one delete attempt for the loaded record: confirm, delete, then notify and
    /// navigate.
    pub async fn request_delete(&self) -> DeleteOutcome {
        let Some(id) = self.view.record_id() else {
            tracing::warn!("delete requested before a record was loaded; ignoring");
            return DeleteOutcome::Ignored(IgnoreReason::NoRecord);
        };

        let mut in_flight = match InFlight::begin(&self.state) {
            Ok(in_flight) => in_flight,
            Err(reason) => {
                tracing::warn!(%id, ?reason, "delete trigger ignored");
                return DeleteOutcome::Ignored(reason);
            }
        };

        let confirmed = self
            .gate
            .request_confirmation_about(id.as_str(), DELETE_PROMPT_MESSAGE)
            .await;
        if !confirmed {
            tracing::debug!(%id, "deletion cancelled by user");
            return DeleteOutcome::Cancelled;
        }

        in_flight.set(WorkflowState::Deleting);
        tracing::info!(%id, backend = self.store.backend_tag(), "deleting patient record");

        match self.store.delete(&id).await {
            Ok(()) => {
                in_flight.finish(WorkflowState::Deleted);
                self.view.clear_deleted();
                self.notifier.success(MSG_DELETE_SUCCESS);
                self.navigator.navigate_to(Route::LISTING);
                DeleteOutcome::Deleted
            }
            Err(e) => {
                tracing::error!(%id, "error deleting patient record: {}", e);
                self.notifier.error(MSG_DELETE_FAILED);
                DeleteOutcome::Failed(e)
            }
        }
    }
}

fn lock(state: &Mutex<WorkflowState>) -> MutexGuard<'_, WorkflowState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the workflow out of `Idle` for the duration of one attempt.
///
/// Unless finished, dropping it returns the workflow to `Idle`. That covers cancel and failure
/// as well as the attempt's future being dropped mid-await.
struct InFlight<'a> {
    state: &'a Mutex<WorkflowState>,
    finished: bool,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a Mutex<WorkflowState>) -> Result<Self, IgnoreReason> {
        let mut current = lock(state);
        match *current {
            WorkflowState::Idle => {
                *current = WorkflowState::AwaitingConfirmation;
                Ok(Self {
                    state,
                    finished: false,
                })
            }
            WorkflowState::Deleted => Err(IgnoreReason::AlreadyDeleted),
            WorkflowState::AwaitingConfirmation | WorkflowState::Deleting => {
                Err(IgnoreReason::Busy)
            }
        }
    }

    fn set(&mut self, next: WorkflowState) {
        *lock(self.state) = next;
    }

    fn finish(&mut self, terminal: WorkflowState) {
        self.set(terminal);
        self.finished = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *lock(self.state) = WorkflowState::Idle;
        }
    }
}
