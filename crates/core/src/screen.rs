//! Patient details screen.
//!
//! Glues the view state, the deletion workflow and the collaborators into the screen a surface
//! renders: detail rows, a Back button and a Delete button.

use crate::collaborators::{Navigator, Notifier, Route};
use crate::confirmation::ConfirmationGate;
use crate::constants::{MSG_FETCH_FAILED, MSG_PATIENT_NOT_FOUND};
use crate::store::RecordStore;
use crate::view::{LoadOutcome, Screen, ViewStateHolder, ViewStatus};
use crate::workflow::{DeleteOutcome, DeletionWorkflow, WorkflowState};
use records_types::RecordId;
use std::sync::Arc;

pub struct PatientDetailsScreen {
    id: RecordId,
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    view: Arc<ViewStateHolder>,
    workflow: DeletionWorkflow,
}

impl PatientDetailsScreen {
    pub fn new(
        id: RecordId,
        store: Arc<dyn RecordStore>,
        gate: ConfirmationGate,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let view = Arc::new(ViewStateHolder::new());
        let workflow = DeletionWorkflow::new(
            store.clone(),
            gate,
            notifier.clone(),
            navigator.clone(),
            view.clone(),
        );
        Self {
            id,
            store,
            notifier,
            navigator,
            view,
            workflow,
        }
    }

    pub fn record_id(&self) -> &RecordId {
        &self.id
    }

    /// Loads the record. A missing record or a failed fetch raises one error notification.
    pub async fn mount(&self) -> ViewStatus {
        match self.view.load(self.store.as_ref(), &self.id).await {
            LoadOutcome::Loaded | LoadOutcome::Discarded => {}
            LoadOutcome::Missing => self.notifier.error(MSG_PATIENT_NOT_FOUND),
            LoadOutcome::Failed(_) => self.notifier.error(MSG_FETCH_FAILED),
        }
        self.view.status()
    }

    pub fn back(&self) {
        self.navigator.navigate_to(Route::LISTING);
    }

    /// Handles the Delete button. After a successful delete the screen is unmounted, since the
    /// workflow has already navigated away.
    pub async fn delete(&self) -> DeleteOutcome {
        let outcome = self.workflow.request_delete().await;
        if matches!(outcome, DeleteOutcome::Deleted) {
            self.view.unmount();
        }
        outcome
    }

    pub fn unmount(&self) {
        self.view.unmount();
    }

    pub fn is_mounted(&self) -> bool {
        self.view.is_mounted()
    }

    pub fn render(&self) -> Screen {
        self.view.render()
    }

    pub fn status(&self) -> ViewStatus {
        self.view.status()
    }

    pub fn workflow_state(&self) -> WorkflowState {
        self.workflow.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{NotificationKind, RecordingNavigator, RecordingNotifier};
    use crate::record::tests::sample_record;
    use crate::store::InMemoryStore;
    use crate::workflow::tests::next_prompt;
    use crate::workflow::IgnoreReason;

    struct Fixture {
        store: Arc<InMemoryStore>,
        gate: ConfirmationGate,
        notifier: Arc<RecordingNotifier>,
        navigator: Arc<RecordingNavigator>,
        screen: Arc<PatientDetailsScreen>,
    }

    fn fixture(store: InMemoryStore, id: &str) -> Fixture {
        let store = Arc::new(store);
        let gate = ConfirmationGate::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let screen = Arc::new(PatientDetailsScreen::new(
            RecordId::parse(id).unwrap(),
            store.clone(),
            gate.clone(),
            notifier.clone(),
            navigator.clone(),
        ));
        Fixture {
            store,
            gate,
            notifier,
            navigator,
            screen,
        }
    }

    #[tokio::test]
    async fn test_jane_confirmed_delete_scenario() {
        let f = fixture(InMemoryStore::with_records([sample_record("p42")]), "p42");

        assert_eq!(f.screen.mount().await, ViewStatus::Loaded);
        let Screen::Loaded { details } = f.screen.render() else {
            panic!("expected loaded screen");
        };
        assert_eq!(details.first_name, "Jane");
        assert_eq!(details.patient_id, "0007");

        let screen = f.screen.clone();
        let task = tokio::spawn(async move { screen.delete().await });
        let prompt = next_prompt(&f.gate).await;
        f.gate.confirm(prompt.id);

        assert!(matches!(task.await.unwrap(), DeleteOutcome::Deleted));
        assert_eq!(f.store.delete_calls(), 1);
        let notifications = f.notifier.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Success);
        assert_eq!(notifications[0].message, "Patient record deleted successfully.");
        assert_eq!(f.navigator.routes(), vec![Route::PredictionTable]);
        assert!(!f.screen.is_mounted());
        assert!(matches!(f.screen.render(), Screen::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_jane_cancelled_delete_scenario() {
        let f = fixture(InMemoryStore::with_records([sample_record("p42")]), "p42");
        f.screen.mount().await;

        let screen = f.screen.clone();
        let task = tokio::spawn(async move { screen.delete().await });
        let prompt = next_prompt(&f.gate).await;
        f.gate.cancel(prompt.id);

        assert!(matches!(task.await.unwrap(), DeleteOutcome::Cancelled));
        assert_eq!(f.store.delete_calls(), 0);
        assert!(f.notifier.notifications().is_empty());
        assert!(matches!(f.screen.render(), Screen::Loaded { .. }));
        assert!(f.screen.is_mounted());
    }

    #[tokio::test]
    async fn test_missing_record_notifies_and_never_deletes() {
        let f = fixture(InMemoryStore::new(), "ghost");

        assert_eq!(f.screen.mount().await, ViewStatus::NotFound);
        assert!(matches!(
            f.screen.delete().await,
            DeleteOutcome::Ignored(IgnoreReason::NoRecord)
        ));

        assert_eq!(f.store.delete_calls(), 0);
        let notifications = f.notifier.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, "Patient not found.");
    }

    #[tokio::test]
    async fn test_fetch_failure_uses_distinct_message() {
        let store = InMemoryStore::with_records([sample_record("p42")]);
        store.set_fail_fetch(true);
        let f = fixture(store, "p42");

        assert_eq!(f.screen.mount().await, ViewStatus::NotFound);
        let notifications = f.notifier.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Error);
        assert_eq!(notifications[0].message, "Failed to fetch patient details.");
    }

    #[tokio::test]
    async fn test_back_navigates_to_listing() {
        let f = fixture(InMemoryStore::new(), "p1");
        f.screen.back();
        assert_eq!(f.navigator.current(), Some(Route::PredictionTable));
    }

    #[tokio::test]
    async fn test_unmount_does_not_cancel_open_prompt() {
        let f = fixture(InMemoryStore::with_records([sample_record("p42")]), "p42");
        f.screen.mount().await;

        let screen = f.screen.clone();
        let task = tokio::spawn(async move { screen.delete().await });
        let prompt = next_prompt(&f.gate).await;
        f.screen.unmount();

        assert_eq!(f.gate.current_prompt().map(|p| p.id), Some(prompt.id));
        f.gate.confirm(prompt.id);
        assert!(matches!(task.await.unwrap(), DeleteOutcome::Deleted));
    }
}
