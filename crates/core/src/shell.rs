//! Navigation shell: the menu, the sidebar toggle, the first-login tooltip and logout.

use crate::collaborators::{IdentitySession, Navigator, Notifier, Route};
use crate::constants::{
    FIRST_LOGIN_KEY, MSG_LOGOUT_FAILED, MSG_LOGOUT_SUCCESS, MSG_ONBOARDING_TOOLTIP,
};
use crate::error::PatientResult;
use crate::preferences::PreferenceStore;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const MENU: [(&str, Route); 4] = [
    ("Home", Route::Home),
    ("Prediction", Route::PredictionForm),
    ("Patients Record", Route::PredictionTable),
    ("About Us", Route::AboutUs),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub label: &'static str,
    pub route: Route,
    pub active: bool,
}

/// Everything a surface needs to draw the chrome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShellView {
    pub user_email: Option<String>,
    pub sidebar_open: bool,
    pub tooltip: Option<&'static str>,
    pub menu: Vec<MenuItem>,
}

#[derive(Debug)]
struct ShellState {
    current: Route,
    sidebar_open: bool,
    tooltip_visible: bool,
}

pub struct NavigationShell {
    session: Arc<dyn IdentitySession>,
    preferences: Arc<dyn PreferenceStore>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    state: Mutex<ShellState>,
}

impl NavigationShell {
    /// Mounts the shell on `current`. The first-login flag is read here and nowhere else.
    pub fn mount(
        session: Arc<dyn IdentitySession>,
        preferences: Arc<dyn PreferenceStore>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        current: Route,
    ) -> Self {
        let seen = match preferences.get_flag(FIRST_LOGIN_KEY) {
            Ok(flag) => flag.unwrap_or(false),
            Err(e) => {
                tracing::warn!("failed to read onboarding preference: {}", e);
                false
            }
        };

        Self {
            session,
            preferences,
            notifier,
            navigator,
            state: Mutex::new(ShellState {
                current,
                sidebar_open: false,
                tooltip_visible: !seen,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ShellState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn toggle_sidebar(&self) {
        let mut state = self.state();
        state.sidebar_open = !state.sidebar_open;
    }

    pub fn close_sidebar(&self) {
        self.state().sidebar_open = false;
    }

    /// Follows a menu link: closes the sidebar and navigates.
    pub fn select(&self, route: Route) {
        {
            let mut state = self.state();
            state.sidebar_open = false;
            state.current = route.clone();
        }
        self.navigator.navigate_to(route);
    }

    /// Hides the tooltip and records that it was seen. Only the first dismissal writes.
    pub fn dismiss_tooltip(&self) -> PatientResult<()> {
        let was_visible = std::mem::replace(&mut self.state().tooltip_visible, false);
        if was_visible {
            self.preferences.set_flag(FIRST_LOGIN_KEY, true)?;
        }
        Ok(())
    }

    pub fn render(&self) -> ShellView {
        let state = self.state();
        let menu = MENU
            .into_iter()
            .map(|(label, route)| MenuItem {
                label,
                active: route == state.current,
                route,
            })
            .collect();

        ShellView {
            user_email: self.session.current_user().map(|u| u.email),
            sidebar_open: state.sidebar_open,
            tooltip: state.tooltip_visible.then_some(MSG_ONBOARDING_TOOLTIP),
            menu,
        }
    }

    /// Signs out and returns to the landing page. Returns whether logout succeeded.
    pub async fn logout(&self) -> bool {
        match self.session.logout().await {
            Ok(()) => {
                self.state().current = Route::Landing;
                self.navigator.navigate_to(Route::Landing);
                self.notifier.success(MSG_LOGOUT_SUCCESS);
                true
            }
            Err(e) => {
                tracing::error!("logout error: {}", e);
                self.notifier.error(MSG_LOGOUT_FAILED);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{
        NotificationKind, RecordingNavigator, RecordingNotifier, SessionError, SessionUser,
    };
    use crate::preferences::MemoryPreferenceStore;
    use async_trait::async_trait;

    struct FakeSession {
        user: Option<SessionUser>,
        fail_logout: bool,
    }

    #[async_trait]
    impl IdentitySession for FakeSession {
        fn current_user(&self) -> Option<SessionUser> {
            self.user.clone()
        }

        async fn logout(&self) -> Result<(), SessionError> {
            if self.fail_logout {
                Err(SessionError("network down".into()))
            } else {
                Ok(())
            }
        }
    }

    struct Fixture {
        preferences: Arc<MemoryPreferenceStore>,
        notifier: Arc<RecordingNotifier>,
        navigator: Arc<RecordingNavigator>,
        shell: NavigationShell,
    }

    fn fixture(fail_logout: bool, preferences: MemoryPreferenceStore) -> Fixture {
        let preferences = Arc::new(preferences);
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let session = Arc::new(FakeSession {
            user: Some(SessionUser {
                email: "clinician@example.com".into(),
            }),
            fail_logout,
        });
        let shell = NavigationShell::mount(
            session,
            preferences.clone(),
            notifier.clone(),
            navigator.clone(),
            Route::Home,
        );
        Fixture {
            preferences,
            notifier,
            navigator,
            shell,
        }
    }

    #[test]
    fn test_menu_marks_current_route_active() {
        let f = fixture(false, MemoryPreferenceStore::new());
        let view = f.shell.render();

        let labels: Vec<_> = view.menu.iter().map(|m| m.label).collect();
        assert_eq!(labels, ["Home", "Prediction", "Patients Record", "About Us"]);
        let active: Vec<_> = view.menu.iter().filter(|m| m.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].route, Route::Home);
        assert_eq!(view.user_email.as_deref(), Some("clinician@example.com"));
    }

    #[test]
    fn test_select_closes_sidebar_and_navigates() {
        let f = fixture(false, MemoryPreferenceStore::new());
        f.shell.toggle_sidebar();
        assert!(f.shell.render().sidebar_open);

        f.shell.select(Route::PredictionTable);

        let view = f.shell.render();
        assert!(!view.sidebar_open);
        assert!(view.menu[2].active);
        assert_eq!(f.navigator.routes(), vec![Route::PredictionTable]);
    }

    #[test]
    fn test_overlay_click_closes_open_sidebar() {
        let f = fixture(false, MemoryPreferenceStore::new());
        f.shell.toggle_sidebar();
        assert!(f.shell.render().sidebar_open);

        f.shell.close_sidebar();
        assert!(!f.shell.render().sidebar_open);
        f.shell.close_sidebar();
        assert!(!f.shell.render().sidebar_open, "closing twice keeps it closed");
        assert!(f.navigator.routes().is_empty());
    }

    #[test]
    fn test_tooltip_shown_until_dismissed_once() {
        let f = fixture(false, MemoryPreferenceStore::new());
        assert_eq!(f.shell.render().tooltip, Some(MSG_ONBOARDING_TOOLTIP));

        f.shell.dismiss_tooltip().unwrap();
        f.shell.dismiss_tooltip().unwrap();

        assert_eq!(f.shell.render().tooltip, None);
        assert_eq!(f.preferences.writes(), 1);
        assert_eq!(f.preferences.get_flag(FIRST_LOGIN_KEY).unwrap(), Some(true));
    }

    #[test]
    fn test_tooltip_hidden_when_already_seen() {
        let preferences = MemoryPreferenceStore::new();
        preferences.set_flag(FIRST_LOGIN_KEY, true).unwrap();
        let f = fixture(false, preferences);
        assert_eq!(f.shell.render().tooltip, None);
    }

    #[tokio::test]
    async fn test_logout_success_navigates_and_notifies() {
        let f = fixture(false, MemoryPreferenceStore::new());

        assert!(f.shell.logout().await);

        assert_eq!(f.navigator.routes(), vec![Route::Landing]);
        let notifications = f.notifier.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Success);
        assert_eq!(notifications[0].message, "Logged out successfully.");
    }

    #[tokio::test]
    async fn test_logout_failure_notifies_error() {
        let f = fixture(true, MemoryPreferenceStore::new());

        assert!(!f.shell.logout().await);

        assert!(f.navigator.routes().is_empty());
        let notifications = f.notifier.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Error);
        assert_eq!(
            notifications[0].message,
            "Failed to logout. Please try again."
        );
    }
}
