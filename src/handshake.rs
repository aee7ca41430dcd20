//! Handshake orchestration
//!
//! Sequences the post-capture exchange with the scorer: fetch a feature
//! vector, then register or verify. Every call is attempted once and bounded
//! by the request timeout; any failure ends the handshake as
//! [`AuthOutcome::NetworkError`]. Callers that want another attempt start a
//! new session.

use crate::client::ScoringService;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::types::{AuthOutcome, InjectMode, Mode, RegisterRequest, Sample, VerifyRequest};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Runs the feature fetch and the register/verify call for one session
#[derive(Clone)]
pub struct HandshakeOrchestrator {
    service: Arc<dyn ScoringService>,
    timeout: Duration,
    inject_mode: InjectMode,
}

impl HandshakeOrchestrator {
    pub fn new(service: Arc<dyn ScoringService>, config: &SessionConfig) -> Self {
        Self {
            service,
            timeout: config.request_timeout(),
            inject_mode: config.inject_mode,
        }
    }

    pub async fn run(&self, mode: Mode, user_id: &str, sample: &Sample) -> AuthOutcome {
        tracing::info!(
            target: "handshake",
            mode = mode.as_str(),
            user_id,
            keystrokes = sample.event_count,
            latencies = sample.latencies.len(),
            "starting handshake"
        );

        match self.exchange(mode, user_id).await {
            Ok(outcome) => {
                tracing::info!(target: "handshake", kind = ?outcome.kind(), "handshake resolved");
                outcome
            }
            Err(e) => {
                tracing::warn!(target: "handshake", error = %e, "handshake failed");
                AuthOutcome::NetworkError {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn exchange(&self, mode: Mode, user_id: &str) -> Result<AuthOutcome, SessionError> {
        let feats = self
            .bounded("inject", self.service.fetch_features(self.inject_mode))
            .await?;

        match mode {
            Mode::Enroll => {
                let request = RegisterRequest {
                    uid: user_id.to_string(),
                    feats,
                    ts: Utc::now().timestamp_millis(),
                };
                let response = self
                    .bounded("register", self.service.register(&request))
                    .await?;
                tracing::debug!(target: "handshake", baseline_dim = ?response.baseline_dim, "enrolled");
                Ok(AuthOutcome::Registered)
            }
            Mode::Verify => {
                let request = VerifyRequest {
                    uid: user_id.to_string(),
                    feats,
                };
                let response = self.bounded("verify", self.service.verify(&request)).await?;
                let anomaly_score = response.anomaly_score.clamp(0.0, 1.0);
                tracing::debug!(
                    target: "handshake",
                    anomaly_score,
                    threshold = ?response.threshold,
                    attempt = ?response.attempt,
                    "verdict received"
                );

                if response.authenticated {
                    Ok(AuthOutcome::Verified { anomaly_score })
                } else {
                    Ok(AuthOutcome::Rejected { anomaly_score })
                }
            }
        }
    }

    async fn bounded<T>(
        &self,
        call: &'static str,
        fut: impl Future<Output = Result<T, SessionError>>,
    ) -> Result<T, SessionError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .unwrap_or(Err(SessionError::Timeout {
                call,
                after_ms: self.timeout.as_millis() as u64,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{MockScorer, Script};
    use crate::types::OutcomeKind;

    fn orchestrator(mock: &Arc<MockScorer>) -> HandshakeOrchestrator {
        HandshakeOrchestrator::new(mock.clone(), &SessionConfig::default())
    }

    #[tokio::test]
    async fn test_enroll_registers_fetched_features() {
        let mock = Arc::new(MockScorer::default());
        let outcome = orchestrator(&mock)
            .run(Mode::Enroll, "alice", &Sample::default())
            .await;

        assert_eq!(outcome, AuthOutcome::Registered);
        assert_eq!(mock.calls(), (1, 1, 0));

        let request = mock.last_register.lock().unwrap().clone().unwrap();
        assert_eq!(request.uid, "alice");
        assert_eq!(request.feats, vec![150.0, 30.0, 170.0, 900.0]);
        assert!(request.ts > 0);
    }

    #[tokio::test]
    async fn test_verify_accepted() {
        let mock = Arc::new(MockScorer::verdict(true, 0.237));
        let outcome = orchestrator(&mock)
            .run(Mode::Verify, "alice", &Sample::default())
            .await;

        assert_eq!(outcome, AuthOutcome::Verified { anomaly_score: 0.237 });
        assert_eq!(mock.calls(), (1, 0, 1));
    }

    #[tokio::test]
    async fn test_verify_rejected() {
        let mock = Arc::new(MockScorer::verdict(false, 0.812));
        let outcome = orchestrator(&mock)
            .run(Mode::Verify, "alice", &Sample::default())
            .await;

        assert_eq!(outcome.kind(), OutcomeKind::Rejected);
        assert_eq!(outcome.anomaly_score(), Some(0.812));
    }

    #[tokio::test(start_paused = true)]
    async fn test_feature_fetch_timeout_skips_second_call() {
        let mock = Arc::new(MockScorer {
            features: Script::Hang,
            ..MockScorer::default()
        });
        let outcome = orchestrator(&mock)
            .run(Mode::Verify, "alice", &Sample::default())
            .await;

        match outcome {
            AuthOutcome::NetworkError { message } => {
                assert!(message.contains("inject timed out after 10000ms"))
            }
            other => panic!("expected network error, got {other:?}"),
        }
        assert_eq!(mock.calls(), (1, 0, 0));
    }

    #[tokio::test]
    async fn test_register_transport_failure() {
        let mock = Arc::new(MockScorer {
            register: Script::Fail("connection reset".into()),
            ..MockScorer::default()
        });
        let outcome = orchestrator(&mock)
            .run(Mode::Enroll, "alice", &Sample::default())
            .await;

        assert_eq!(outcome.kind(), OutcomeKind::NetworkError);
        assert_eq!(mock.calls(), (1, 1, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_timeout_is_not_retried() {
        let mock = Arc::new(MockScorer {
            verify: Script::Hang,
            ..MockScorer::default()
        });
        let outcome = orchestrator(&mock)
            .run(Mode::Verify, "alice", &Sample::default())
            .await;

        assert_eq!(outcome.kind(), OutcomeKind::NetworkError);
        assert_eq!(mock.calls(), (1, 0, 1));
    }

    #[tokio::test]
    async fn test_out_of_range_score_clamped() {
        let mock = Arc::new(MockScorer::verdict(false, 1.7));
        let outcome = orchestrator(&mock)
            .run(Mode::Verify, "alice", &Sample::default())
            .await;
        assert_eq!(outcome.anomaly_score(), Some(1.0));
    }
}
