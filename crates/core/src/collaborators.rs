//! Collaborators the UI core talks to but does not own: routing, notifications and the
//! signed-in session.
//!
//! Surfaces provide real implementations. The recording implementations here keep every call,
//! which makes them usable both as test doubles and as an outbox a surface can drain.

use async_trait::async_trait;
use records_types::RecordId;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Screens reachable from the UI.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    /// Landing page shown after logout.
    Landing,
    Home,
    PredictionForm,
    /// Patient listing; where the details screen returns to.
    PredictionTable,
    AboutUs,
    PatientDetails(RecordId),
}

impl Route {
    pub const LISTING: Route = Route::PredictionTable;

    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".into(),
            Route::Home => "/home".into(),
            Route::PredictionForm => "/prediction-form".into(),
            Route::PredictionTable => "/prediction-table".into(),
            Route::AboutUs => "/about-us".into(),
            Route::PatientDetails(id) => format!("/patients/{id}"),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

impl Serialize for Route {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.path())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

pub trait Navigator: Send + Sync {
    fn navigate_to(&self, route: Route);
}

/// Fire-and-forget user notifications (toasts).
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str);

    fn success(&self, message: &str) {
        self.notify(NotificationKind::Success, message);
    }

    fn error(&self, message: &str) {
        self.notify(NotificationKind::Error, message);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.sent).clone()
    }

    /// Returns and forgets everything recorded so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *lock(&self.sent))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        lock(&self.sent).push(Notification {
            kind,
            message: message.to_string(),
        });
    }
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        lock(&self.visited).clone()
    }

    pub fn drain(&self) -> Vec<Route> {
        std::mem::take(&mut *lock(&self.visited))
    }

    pub fn current(&self) -> Option<Route> {
        lock(&self.visited).last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, route: Route) {
        tracing::debug!(%route, "navigate");
        lock(&self.visited).push(route);
    }
}

/// The signed-in user as far as the chrome is concerned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub email: String,
}

/// Failure reported by the identity provider.
#[derive(Debug, thiserror::Error)]
#[error("identity provider error: {0}")]
pub struct SessionError(pub String);

/// External identity/session provider. Authentication itself happens elsewhere.
#[async_trait]
pub trait IdentitySession: Send + Sync {
    fn current_user(&self) -> Option<SessionUser>;

    async fn logout(&self) -> Result<(), SessionError>;
}
