//! Top-level navigation state
//!
//! Tracks which screen is shown and which user is signed in. Sessions report
//! upward through [`SessionSignal`]s; everything else here is driven by
//! explicit user actions.

use crate::types::{Mode, SessionSignal};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Landing,
    Enroll,
    Verify,
    Dashboard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Navigator {
    screen: Screen,
    user_id: Option<String>,
    error: Option<String>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            screen: Screen::Landing,
            user_id: None,
            error: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Session mode for the current screen, if it hosts a session
    pub fn session_mode(&self) -> Option<Mode> {
        match self.screen {
            Screen::Enroll => Some(Mode::Enroll),
            Screen::Verify => Some(Mode::Verify),
            Screen::Landing | Screen::Dashboard => None,
        }
    }

    pub fn go_enroll(&mut self) {
        self.screen = Screen::Enroll;
        self.error = None;
    }

    pub fn go_verify(&mut self) {
        self.screen = Screen::Verify;
        self.error = None;
    }

    pub fn on_enroll_success(&mut self, user_id: impl Into<String>) {
        self.user_id = Some(user_id.into());
        self.screen = Screen::Dashboard;
    }

    pub fn on_verify_success(&mut self) {
        self.screen = Screen::Dashboard;
    }

    pub fn on_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn logout(&mut self) {
        self.screen = Screen::Landing;
        self.user_id = None;
        self.error = None;
    }

    /// Route a session signal; progress is ignored at this level
    pub fn apply(&mut self, signal: &SessionSignal) {
        match signal {
            SessionSignal::Progress(_) => {}
            SessionSignal::Succeeded {
                user_id: Some(user_id),
            } => self.on_enroll_success(user_id.clone()),
            SessionSignal::Succeeded { user_id: None } => self.on_verify_success(),
            SessionSignal::Failed { message } | SessionSignal::Errored { message } => {
                self.on_error(message.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enroll_flow_lands_on_dashboard() {
        let mut nav = Navigator::new();
        nav.go_enroll();
        assert_eq!(nav.session_mode(), Some(Mode::Enroll));

        nav.apply(&SessionSignal::Succeeded {
            user_id: Some("alice".into()),
        });
        assert_eq!(nav.screen(), Screen::Dashboard);
        assert_eq!(nav.user_id(), Some("alice"));
    }

    #[test]
    fn test_verify_success_keeps_user() {
        let mut nav = Navigator::new();
        nav.on_enroll_success("alice");
        nav.logout();
        nav.go_verify();
        nav.apply(&SessionSignal::Succeeded { user_id: None });

        assert_eq!(nav.screen(), Screen::Dashboard);
        assert_eq!(nav.user_id(), None);
    }

    #[test]
    fn test_failure_recorded_and_cleared_on_navigation() {
        let mut nav = Navigator::new();
        nav.go_verify();
        nav.apply(&SessionSignal::Failed {
            message: "Authentication failed. Anomaly detected: 81.2%".into(),
        });
        assert_eq!(nav.screen(), Screen::Verify);
        assert!(nav.error().unwrap().contains("81.2%"));

        nav.go_enroll();
        assert_eq!(nav.error(), None);
    }

    #[test]
    fn test_progress_does_not_navigate() {
        let mut nav = Navigator::new();
        nav.go_enroll();
        nav.apply(&SessionSignal::Progress(50.0));
        assert_eq!(nav.screen(), Screen::Enroll);
    }
}
