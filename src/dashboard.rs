//! Profile dashboard
//!
//! Read-only view of a signed-in user's stored profile plus logout. Failures
//! are surfaced once and never retried.

use crate::client::ScoringService;
use crate::error::SessionError;
use crate::types::Profile;
use std::sync::Arc;

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load user profile";
pub const LOGOUT_FAILED_MESSAGE: &str = "Logout failed";

pub struct Dashboard {
    service: Arc<dyn ScoringService>,
}

impl Dashboard {
    pub fn new(service: Arc<dyn ScoringService>) -> Self {
        Self { service }
    }

    pub async fn load(&self, user_id: &str) -> Result<Profile, SessionError> {
        self.service.status(user_id).await.map_err(|e| {
            tracing::warn!(target: "dashboard", user_id, error = %e, "profile load failed");
            SessionError::Load(LOAD_FAILED_MESSAGE.to_string())
        })
    }

    pub async fn logout(&self, user_id: &str) -> Result<(), SessionError> {
        self.service.logout(user_id).await.map_err(|e| {
            tracing::warn!(target: "dashboard", user_id, error = %e, "logout failed");
            SessionError::Load(LOGOUT_FAILED_MESSAGE.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{MockScorer, Script};

    #[tokio::test]
    async fn test_load_profile() {
        let dashboard = Dashboard::new(Arc::new(MockScorer::default()));
        let profile = dashboard.load("alice").await.unwrap();
        assert_eq!(profile.user_id, "alice");
        assert_eq!(profile.auth_attempts, 2);
        assert_eq!(profile.baseline_feature_dimension, 14);
    }

    #[tokio::test]
    async fn test_load_failure_is_load_error() {
        let dashboard = Dashboard::new(Arc::new(MockScorer {
            status: Script::Fail("User not found".into()),
            ..MockScorer::default()
        }));
        let err = dashboard.load("ghost").await.unwrap_err();
        assert!(matches!(err, SessionError::Load(ref m) if m == LOAD_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn test_logout_failure_surfaced() {
        let dashboard = Dashboard::new(Arc::new(MockScorer {
            logout: Script::Fail("User not found".into()),
            ..MockScorer::default()
        }));
        let err = dashboard.logout("ghost").await.unwrap_err();
        assert_eq!(err.to_string(), LOGOUT_FAILED_MESSAGE);
    }
}
