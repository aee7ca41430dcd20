//! Signal collector
//!
//! Accumulates keystroke and pointer-move events into a [`Sample`] while a
//! capture window is open. Events that arrive while the collector is not
//! accepting are dropped silently so the collector can be wired to input
//! sources that keep firing outside the window.

use crate::error::SessionError;
use crate::types::Sample;
use chrono::{DateTime, Utc};

/// Pointer jumps at or above this distance are treated as teleports and not scored
pub const POINTER_JUMP_THRESHOLD: f64 = 300.0;

/// Divisor applied to pointer travel before it enters the latency sequence
pub const POINTER_DISTANCE_SCALE: f64 = 100.0;

/// Collects interaction events for a single session
#[derive(Debug, Default)]
pub struct SignalCollector {
    sample: Sample,
    started_at: Option<DateTime<Utc>>,
    last_pointer: Option<(f64, f64)>,
    accepting: bool,
}

impl SignalCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard everything captured so far and open a new window at `started_at`
    pub fn reset(&mut self, started_at: DateTime<Utc>) {
        self.sample = Sample::default();
        self.started_at = Some(started_at);
        self.last_pointer = None;
        self.accepting = true;
    }

    /// Stop accepting events; the sample becomes read-only
    pub fn freeze(&mut self) {
        if self.accepting {
            tracing::debug!(
                target: "collector",
                keystrokes = self.sample.event_count,
                latencies = self.sample.latencies.len(),
                "sample frozen"
            );
        }
        self.accepting = false;
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    pub fn record_keystroke(&mut self, now: DateTime<Utc>) {
        let Some(started_at) = self.started_at.filter(|_| self.accepting) else {
            return;
        };

        self.sample.keystroke_timestamps.push(now);
        // Events stamped before the window opened count at offset zero
        self.sample
            .latencies
            .push((now - started_at).num_milliseconds().max(0) as f64);
        self.sample.event_count += 1;
    }

    pub fn record_pointer_move(&mut self, x: f64, y: f64, _now: DateTime<Utc>) {
        if !self.accepting {
            return;
        }

        if let Some((px, py)) = self.last_pointer {
            let distance = ((x - px).powi(2) + (y - py).powi(2)).sqrt();
            if distance < POINTER_JUMP_THRESHOLD {
                self.sample.latencies.push(distance / POINTER_DISTANCE_SCALE);
            }
        }
        // Baseline moves even when the jump was discarded
        self.last_pointer = Some((x, y));
    }

    /// The frozen sample; only available once the window has closed
    pub fn snapshot(&self) -> Result<Sample, SessionError> {
        if self.accepting {
            return Err(SessionError::InvalidTransition {
                from: "running".to_string(),
                action: "snapshot sample",
            });
        }
        Ok(self.sample.clone())
    }

    pub fn last_pointer(&self) -> Option<(f64, f64)> {
        self.last_pointer
    }
}
