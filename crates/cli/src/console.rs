//! Terminal implementations of the UI collaborators.

use async_trait::async_trait;
use records_core::{
    Decision, IdentitySession, Navigator, NotificationKind, Notifier, Route, SessionError,
    SessionUser,
};
use std::sync::Mutex;

pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Success => println!("[ok] {message}"),
            NotificationKind::Error => eprintln!("[error] {message}"),
        }
    }
}

pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate_to(&self, route: Route) {
        println!("-> {route}");
    }
}

/// Session for a terminal user, identified by `RECORDS_USER_EMAIL`.
pub struct LocalSession {
    user: Mutex<Option<SessionUser>>,
}

impl LocalSession {
    pub fn from_email(email: Option<String>) -> Self {
        Self {
            user: Mutex::new(email.map(|email| SessionUser { email })),
        }
    }
}

#[async_trait]
impl IdentitySession for LocalSession {
    fn current_user(&self) -> Option<SessionUser> {
        self.user.lock().ok().and_then(|u| u.clone())
    }

    async fn logout(&self) -> Result<(), SessionError> {
        let mut user = self
            .user
            .lock()
            .map_err(|_| SessionError("session state poisoned".into()))?;
        *user = None;
        Ok(())
    }
}

/// Maps a typed answer to a decision. `None` means stdin was closed.
pub fn decision_from_answer(answer: Option<&str>) -> Decision {
    match answer.map(|a| a.trim().to_ascii_lowercase()) {
        None => Decision::Dismiss,
        Some(a) if a == "y" || a == "yes" => Decision::Confirm,
        Some(_) => Decision::Cancel,
    }
}
