//! Session controller
//!
//! Owns the lifecycle of one capture attempt:
//!
//! ```text
//! Idle ──start_test──▶ Running ──timer complete──▶ Completing ──outcome──▶ Succeeded
//!                                                                    ├──▶ Failed
//!                                                                    └──▶ Errored
//! ```
//!
//! The controller can be driven step by step (`start_test`, `handle_input`,
//! `tick`, `resolve`) or by [`SessionController::run`], which multiplexes the
//! tick cadence, host input events and teardown on one task.

use crate::client::ScoringService;
use crate::collector::SignalCollector;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::features::SampleSummary;
use crate::handshake::HandshakeOrchestrator;
use crate::timer::{SessionTimer, TimerTick};
use crate::types::{
    AuthOutcome, InputEvent, MessageLevel, Mode, Sample, SessionSignal, SessionState,
    StatusMessage,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const VALIDATION_MESSAGE: &str = "Please enter a user ID";
pub const ENROLLED_MESSAGE: &str = "Cognitive signature established successfully!";

/// Everything the handshake needs, detached from the controller so the
/// network exchange does not hold it borrowed
pub struct HandshakeJob {
    orchestrator: HandshakeOrchestrator,
    mode: Mode,
    user_id: String,
    sample: Sample,
}

impl HandshakeJob {
    pub async fn run(self) -> AuthOutcome {
        self.orchestrator
            .run(self.mode, &self.user_id, &self.sample)
            .await
    }
}

/// Serializable summary of a finished session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub mode: Mode,
    pub user_id: Option<String>,
    pub state: SessionState,
    pub message: Option<StatusMessage>,
    pub anomaly_score: Option<f64>,
    pub started_at: Option<DateTime<Utc>>,
    pub sample: Option<SampleSummary>,
}

/// State machine for one enrollment or verification attempt
pub struct SessionController {
    mode: Mode,
    config: SessionConfig,
    orchestrator: HandshakeOrchestrator,
    session_id: Uuid,
    user_id: Option<String>,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    collector: SignalCollector,
    timer: SessionTimer,
    sample: Option<Sample>,
    outcome: Option<AuthOutcome>,
    message: Option<StatusMessage>,
    handshake_started: bool,
    torn_down: bool,
}

impl SessionController {
    pub fn new(mode: Mode, service: Arc<dyn ScoringService>, config: SessionConfig) -> Self {
        let orchestrator = HandshakeOrchestrator::new(service, &config);
        Self {
            mode,
            config,
            orchestrator,
            session_id: Uuid::new_v4(),
            user_id: None,
            state: SessionState::Idle,
            started_at: None,
            collector: SignalCollector::new(),
            timer: SessionTimer::new(),
            sample: None,
            outcome: None,
            message: None,
            handshake_started: false,
            torn_down: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn progress_pct(&self) -> f64 {
        self.timer.progress_pct()
    }

    pub fn message(&self) -> Option<&StatusMessage> {
        self.message.as_ref()
    }

    pub fn outcome(&self) -> Option<&AuthOutcome> {
        self.outcome.as_ref()
    }

    /// Frozen sample, available from Completing onward
    pub fn sample(&self) -> Option<&Sample> {
        self.sample.as_ref()
    }

    pub fn start_test(&mut self, user_id: &str) -> Result<(), SessionError> {
        self.start_test_at(user_id, Utc::now(), Instant::now())
    }

    /// Idle → Running with explicit clocks
    pub fn start_test_at(
        &mut self,
        user_id: &str,
        started_at: DateTime<Utc>,
        now: Instant,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Idle || self.torn_down {
            return Err(SessionError::InvalidTransition {
                from: self.state.to_string(),
                action: "start a test",
            });
        }

        let user_id = user_id.trim();
        if user_id.is_empty() {
            self.message = Some(StatusMessage::new(
                MessageLevel::Validation,
                VALIDATION_MESSAGE,
            ));
            return Err(SessionError::Validation(VALIDATION_MESSAGE.to_string()));
        }

        self.message = None;
        self.user_id = Some(user_id.to_string());
        self.started_at = Some(started_at);
        self.collector.reset(started_at);
        self.timer.start(self.config.capture_window(), now);
        self.state = SessionState::Running;

        tracing::info!(
            target: "controller",
            session_id = %self.session_id,
            mode = self.mode.as_str(),
            user_id,
            window_ms = self.config.capture_window_ms,
            "capture started"
        );
        Ok(())
    }

    pub fn record_keystroke(&mut self, now: DateTime<Utc>) {
        if self.state == SessionState::Running {
            self.collector.record_keystroke(now);
        }
    }

    pub fn record_pointer_move(&mut self, x: f64, y: f64, now: DateTime<Utc>) {
        if self.state == SessionState::Running {
            self.collector.record_pointer_move(x, y, now);
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key { at } => self.record_keystroke(at),
            InputEvent::Pointer { x, y, at } => self.record_pointer_move(x, y, at),
        }
    }

    /// Poll the timer. Returns the frozen sample on the tick that closes the window.
    pub fn tick(&mut self, now: Instant) -> Option<Sample> {
        if self.state != SessionState::Running {
            return None;
        }
        match self.timer.tick(now) {
            TimerTick::Completed => self.on_timer_complete(),
            TimerTick::Progress(_) | TimerTick::Inert => None,
        }
    }

    /// Running → Completing. Only the first completion at full progress has any effect.
    fn on_timer_complete(&mut self) -> Option<Sample> {
        if self.state != SessionState::Running {
            tracing::debug!(target: "controller", state = %self.state, "ignoring stale completion");
            return None;
        }
        if self.timer.progress_pct() < 100.0 {
            tracing::debug!(
                target: "controller",
                progress = self.timer.progress_pct(),
                "ignoring completion before window closed"
            );
            return None;
        }

        // No further ticks before the handshake is handed the sample
        self.timer.cancel();
        self.collector.freeze();
        let sample = self.collector.snapshot().ok()?;
        self.sample = Some(sample.clone());
        self.state = SessionState::Completing;

        tracing::info!(
            target: "controller",
            session_id = %self.session_id,
            keystrokes = sample.event_count,
            latencies = sample.latencies.len(),
            "capture window closed"
        );
        Some(sample)
    }

    /// Claim the single handshake for this session
    pub fn begin_handshake(&mut self) -> Result<HandshakeJob, SessionError> {
        if self.state != SessionState::Completing || self.handshake_started || self.torn_down {
            return Err(SessionError::InvalidTransition {
                from: self.state.to_string(),
                action: "start the handshake",
            });
        }
        let (Some(user_id), Some(sample)) = (self.user_id.clone(), self.sample.clone()) else {
            return Err(SessionError::InvalidTransition {
                from: self.state.to_string(),
                action: "start the handshake",
            });
        };

        self.handshake_started = true;
        Ok(HandshakeJob {
            orchestrator: self.orchestrator.clone(),
            mode: self.mode,
            user_id,
            sample,
        })
    }

    /// Completing → terminal. Outcomes arriving after teardown are dropped.
    pub fn apply_outcome(&mut self, outcome: AuthOutcome) -> SessionState {
        if self.torn_down || self.state != SessionState::Completing {
            tracing::debug!(target: "controller", kind = ?outcome.kind(), "discarding late outcome");
            return self.state;
        }

        let (state, message) = match &outcome {
            AuthOutcome::Registered => (
                SessionState::Succeeded,
                StatusMessage::new(MessageLevel::Success, ENROLLED_MESSAGE),
            ),
            AuthOutcome::Verified { anomaly_score } => (
                SessionState::Succeeded,
                StatusMessage::new(
                    MessageLevel::Success,
                    format!("Identity verified. Anomaly: {}", format_score(*anomaly_score)),
                ),
            ),
            AuthOutcome::Rejected { anomaly_score } => (
                SessionState::Failed,
                StatusMessage::new(
                    MessageLevel::Failure,
                    format!(
                        "Authentication failed. Anomaly detected: {}",
                        format_score(*anomaly_score)
                    ),
                ),
            ),
            AuthOutcome::NetworkError { message } => (
                SessionState::Errored,
                StatusMessage::new(
                    MessageLevel::Error,
                    format!(
                        "Error: {message}. Check your connection and ensure the scoring service is running."
                    ),
                ),
            ),
        };

        tracing::info!(
            target: "controller",
            session_id = %self.session_id,
            state = %state,
            "session resolved"
        );
        self.state = state;
        self.message = Some(message);
        self.outcome = Some(outcome);
        state
    }

    /// Run the handshake for a Completing session and apply its outcome
    pub async fn resolve(&mut self) -> Result<SessionState, SessionError> {
        let job = self.begin_handshake()?;
        let outcome = job.run().await;
        Ok(self.apply_outcome(outcome))
    }

    /// Signal owed to the navigation layer once the session has resolved
    pub fn terminal_signal(&self) -> Option<SessionSignal> {
        let text = || self.message.as_ref().map(|m| m.text.clone()).unwrap_or_default();
        match self.state {
            SessionState::Succeeded => Some(SessionSignal::Succeeded {
                user_id: match self.mode {
                    Mode::Enroll => self.user_id.clone(),
                    Mode::Verify => None,
                },
            }),
            SessionState::Failed => Some(SessionSignal::Failed { message: text() }),
            SessionState::Errored => Some(SessionSignal::Errored { message: text() }),
            _ => None,
        }
    }

    /// The owning view went away: stop the clock and ignore anything still in flight
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.timer.cancel();
        self.collector.freeze();
        self.torn_down = true;
        tracing::info!(
            target: "controller",
            session_id = %self.session_id,
            state = %self.state,
            "session torn down"
        );
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            session_id: self.session_id,
            mode: self.mode,
            user_id: self.user_id.clone(),
            state: self.state,
            message: self.message.clone(),
            anomaly_score: self.outcome.as_ref().and_then(AuthOutcome::anomaly_score),
            started_at: self.started_at,
            sample: self.sample.as_ref().map(SampleSummary::from_sample),
        }
    }

    /// Drive a whole session: capture until the window closes, hand off once,
    /// then report the verdict on `signals`.
    ///
    /// Cancelling `cancel` tears the session down at any point; nothing is
    /// signalled afterwards.
    pub async fn run(
        &mut self,
        user_id: &str,
        mut inputs: mpsc::Receiver<InputEvent>,
        signals: mpsc::UnboundedSender<SessionSignal>,
        cancel: CancellationToken,
    ) -> Result<SessionState, SessionError> {
        self.start_test(user_id)?;

        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut inputs_open = true;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.teardown();
                    return Ok(self.state);
                }
                _ = ticker.tick() => {
                    let closed = self.tick(Instant::now()).is_some();
                    let _ = signals.send(SessionSignal::Progress(self.progress_pct()));
                    if closed {
                        break;
                    }
                }
                event = inputs.recv(), if inputs_open => match event {
                    Some(event) => self.handle_input(event),
                    None => inputs_open = false,
                },
            }
        }

        let job = self.begin_handshake()?;
        let outcome = tokio::select! {
            outcome = job.run() => outcome,
            _ = cancel.cancelled() => {
                self.teardown();
                return Ok(self.state);
            }
        };
        let state = self.apply_outcome(outcome);

        if state == SessionState::Succeeded {
            tokio::select! {
                _ = tokio::time::sleep(self.config.success_display_delay()) => {}
                _ = cancel.cancelled() => {
                    self.teardown();
                    return Ok(state);
                }
            }
        }

        if let Some(signal) = self.terminal_signal() {
            let _ = signals.send(signal);
        }
        Ok(state)
    }
}

/// Anomaly score as a percentage with one decimal, e.g. `0.237` → `23.7%`
pub fn format_score(anomaly_score: f64) -> String {
    format!("{:.1}%", anomaly_score * 100.0)
}
