//! Session configuration
//!
//! Defaults match the production capture contract: a 60 second window polled
//! every 100ms, 10 second request timeouts and a 1.2 second pause before the
//! success signal is handed upward.

use crate::error::SessionError;
use crate::types::InjectMode;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_CAPTURE_WINDOW_MS: u64 = 60_000;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SUCCESS_DISPLAY_DELAY_MS: u64 = 1_200;

/// Tunables for a capture session and its handshake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Base URL of the scoring service
    pub base_url: String,
    /// Length of the capture window
    pub capture_window_ms: u64,
    /// Timer polling cadence
    pub tick_interval_ms: u64,
    /// Per-call timeout for every scoring request
    pub request_timeout_ms: u64,
    /// Pause between a success verdict and the success signal
    pub success_display_delay_ms: u64,
    /// Synthetic profile requested from the feature endpoint
    pub inject_mode: InjectMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            capture_window_ms: DEFAULT_CAPTURE_WINDOW_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            success_display_delay_ms: DEFAULT_SUCCESS_DISPLAY_DELAY_MS,
            inject_mode: InjectMode::Normal,
        }
    }
}

impl SessionConfig {
    /// Load defaults overridden by `NEUROCRYPT_API_URL`, `NEUROCRYPT_WINDOW_MS`
    /// and `NEUROCRYPT_TIMEOUT_MS` when set.
    pub fn from_env() -> Result<Self, SessionError> {
        let mut config = Self::default();

        if let Ok(url) = env::var("NEUROCRYPT_API_URL") {
            config.base_url = url;
        }
        if let Ok(ms) = env::var("NEUROCRYPT_WINDOW_MS") {
            config.capture_window_ms = parse_ms("NEUROCRYPT_WINDOW_MS", &ms)?;
        }
        if let Ok(ms) = env::var("NEUROCRYPT_TIMEOUT_MS") {
            config.request_timeout_ms = parse_ms("NEUROCRYPT_TIMEOUT_MS", &ms)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_capture_window_ms(mut self, ms: u64) -> Self {
        self.capture_window_ms = ms;
        self
    }

    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    pub fn with_success_display_delay_ms(mut self, ms: u64) -> Self {
        self.success_display_delay_ms = ms;
        self
    }

    pub fn with_inject_mode(mut self, mode: InjectMode) -> Self {
        self.inject_mode = mode;
        self
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.capture_window_ms == 0 {
            return Err(SessionError::Validation(
                "capture_window_ms must be positive".to_string(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(SessionError::Validation(
                "tick_interval_ms must be positive".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(SessionError::Validation(
                "request_timeout_ms must be positive".to_string(),
            ));
        }
        if self.base_url.trim().is_empty() {
            return Err(SessionError::Validation("base_url is empty".to_string()));
        }
        Ok(())
    }

    pub fn capture_window(&self) -> Duration {
        Duration::from_millis(self.capture_window_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn success_display_delay(&self) -> Duration {
        Duration::from_millis(self.success_display_delay_ms)
    }
}

fn parse_ms(var: &str, value: &str) -> Result<u64, SessionError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| SessionError::Validation(format!("{var}: {e}")))
}
