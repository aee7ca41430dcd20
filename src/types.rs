//! Core types for NeuroCrypt capture sessions
//!
//! This module defines the data that flows between the collector, the
//! controller, the handshake and the scoring service: session modes and
//! states, the captured sample, handshake outcomes, and the wire bodies of
//! the scoring endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Feature vector produced by the scoring service
pub type FeatureVector = Vec<f64>;

/// What a session is trying to establish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Establish a new behavioral baseline for a user
    Enroll,
    /// Check captured behavior against an existing baseline
    Verify,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Enroll => "enroll",
            Mode::Verify => "verify",
        }
    }
}

/// Lifecycle state of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Running,
    Completing,
    Succeeded,
    Failed,
    Errored,
}

impl SessionState {
    /// Terminal states are only left by discarding the controller
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Succeeded | SessionState::Failed | SessionState::Errored
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Completing => "completing",
            SessionState::Succeeded => "succeeded",
            SessionState::Failed => "failed",
            SessionState::Errored => "errored",
        };
        f.write_str(s)
    }
}

/// Interaction data captured during one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Arrival time of every recorded keystroke
    pub keystroke_timestamps: Vec<DateTime<Utc>>,
    /// Keystroke offsets from session start (ms) and scaled pointer travel,
    /// interleaved in arrival order
    pub latencies: Vec<f64>,
    /// Number of keystrokes recorded
    pub event_count: u32,
}

impl Sample {
    pub fn is_empty(&self) -> bool {
        self.keystroke_timestamps.is_empty() && self.latencies.is_empty()
    }
}

/// Discriminant of a handshake result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Registered,
    Verified,
    Rejected,
    NetworkError,
}

/// Result of one handshake with the scoring service
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    /// Enrollment accepted
    Registered,
    /// Verification passed
    Verified { anomaly_score: f64 },
    /// Verification refused
    Rejected { anomaly_score: f64 },
    /// A call timed out or failed in transport
    NetworkError { message: String },
}

impl AuthOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            AuthOutcome::Registered => OutcomeKind::Registered,
            AuthOutcome::Verified { .. } => OutcomeKind::Verified,
            AuthOutcome::Rejected { .. } => OutcomeKind::Rejected,
            AuthOutcome::NetworkError { .. } => OutcomeKind::NetworkError,
        }
    }

    /// Anomaly score, present only for verification verdicts
    pub fn anomaly_score(&self) -> Option<f64> {
        match self {
            AuthOutcome::Verified { anomaly_score } | AuthOutcome::Rejected { anomaly_score } => {
                Some(*anomaly_score)
            }
            _ => None,
        }
    }
}

/// Severity of the message a session surfaces to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    Success,
    Failure,
    Error,
    Validation,
}

/// Human-readable message retained until the next session starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub level: MessageLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn new(level: MessageLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Input event delivered by the host while a session is live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    Key { at: DateTime<Utc> },
    Pointer { x: f64, y: f64, at: DateTime<Utc> },
}

/// Notifications emitted by a running controller to its owner
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSignal {
    /// Capture progress in percent
    Progress(f64),
    /// Emitted after the success display delay; carries the new user id for enrollments
    Succeeded { user_id: Option<String> },
    Failed { message: String },
    Errored { message: String },
}

/// Which synthetic profile the scorer should generate features from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectMode {
    #[default]
    Normal,
    Anomalous,
}

/// Stored profile as reported by the status endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "uid")]
    pub user_id: String,
    pub auth_attempts: u32,
    #[serde(rename = "baseline_feats")]
    pub baseline_feature_dimension: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_ts: Option<i64>,
}

// ============================================================================
// Wire bodies
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct InjectRequest {
    pub mode: InjectMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InjectResponse {
    pub feats: FeatureVector,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub uid: String,
    pub feats: FeatureVector,
    /// Submission time in epoch milliseconds
    pub ts: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub baseline_dim: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyRequest {
    pub uid: String,
    pub feats: FeatureVector,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VerifyResponse {
    pub authenticated: bool,
    pub anomaly_score: f64,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub attempt: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoutRequest {
    pub uid: String,
}

/// Error body returned by the scoring service on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub err: String,
}
