//! Session timer
//!
//! A polled clock over a fixed-duration window. The owner calls [`SessionTimer::tick`]
//! on its own cadence; the timer reports progress and fires completion exactly
//! once, then goes inert until started again.

use std::time::Duration;
use tokio::time::Instant;

/// What a single poll of the timer observed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerTick {
    /// Window still open; progress in percent
    Progress(f64),
    /// Window just closed. Returned once per start.
    Completed,
    /// Not started, already completed, or cancelled
    Inert,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    duration: Duration,
}

/// Fixed-duration countdown with a single completion
#[derive(Debug, Default)]
pub struct SessionTimer {
    window: Option<Window>,
    progress_pct: f64,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, duration: Duration, now: Instant) {
        self.window = Some(Window {
            started: now,
            duration,
        });
        self.progress_pct = 0.0;
    }

    pub fn tick(&mut self, now: Instant) -> TimerTick {
        let Some(window) = self.window else {
            return TimerTick::Inert;
        };

        let pct = progress_pct(now.saturating_duration_since(window.started), window.duration);
        // Never report going backwards
        self.progress_pct = self.progress_pct.max(pct);

        if self.progress_pct >= 100.0 {
            self.window = None;
            tracing::debug!(target: "timer", "capture window elapsed");
            TimerTick::Completed
        } else {
            TimerTick::Progress(self.progress_pct)
        }
    }

    /// Stop ticking; a completion that has not fired yet never will
    pub fn cancel(&mut self) {
        if self.window.take().is_some() {
            tracing::debug!(target: "timer", progress = self.progress_pct, "timer cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.window.is_some()
    }

    pub fn progress_pct(&self) -> f64 {
        self.progress_pct
    }
}

/// `min(elapsed / duration * 100, 100)`
fn progress_pct(elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 100.0;
    }
    (elapsed.as_secs_f64() / duration.as_secs_f64() * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_and_single_completion() {
        let t0 = Instant::now();
        let mut timer = SessionTimer::new();
        timer.start(Duration::from_secs(60), t0);

        assert_eq!(timer.tick(t0 + Duration::from_secs(15)), TimerTick::Progress(25.0));
        assert_eq!(timer.tick(t0 + Duration::from_secs(30)), TimerTick::Progress(50.0));
        assert_eq!(timer.tick(t0 + Duration::from_secs(60)), TimerTick::Completed);
        assert_eq!(timer.progress_pct(), 100.0);

        // Late ticks after completion are inert
        assert_eq!(timer.tick(t0 + Duration::from_secs(61)), TimerTick::Inert);
        assert_eq!(timer.tick(t0 + Duration::from_secs(90)), TimerTick::Inert);
        assert!(!timer.is_active());
    }

    #[test]
    fn test_progress_clamped_past_deadline() {
        let t0 = Instant::now();
        let mut timer = SessionTimer::new();
        timer.start(Duration::from_secs(1), t0);
        assert_eq!(timer.tick(t0 + Duration::from_secs(5)), TimerTick::Completed);
        assert_eq!(timer.progress_pct(), 100.0);
    }

    #[test]
    fn test_progress_never_decreases() {
        let t0 = Instant::now();
        let mut timer = SessionTimer::new();
        timer.start(Duration::from_secs(10), t0);

        timer.tick(t0 + Duration::from_secs(4));
        // A stale timestamp must not move progress backwards
        assert_eq!(timer.tick(t0 + Duration::from_secs(2)), TimerTick::Progress(40.0));
    }

    #[test]
    fn test_cancel_suppresses_completion() {
        let t0 = Instant::now();
        let mut timer = SessionTimer::new();
        timer.start(Duration::from_secs(1), t0);
        timer.tick(t0 + Duration::from_millis(500));
        timer.cancel();

        assert_eq!(timer.tick(t0 + Duration::from_secs(2)), TimerTick::Inert);
    }

    #[test]
    fn test_restart_after_completion() {
        let t0 = Instant::now();
        let mut timer = SessionTimer::new();
        timer.start(Duration::from_secs(1), t0);
        assert_eq!(timer.tick(t0 + Duration::from_secs(1)), TimerTick::Completed);

        let t1 = t0 + Duration::from_secs(10);
        timer.start(Duration::from_secs(1), t1);
        assert_eq!(timer.progress_pct(), 0.0);
        assert_eq!(timer.tick(t1 + Duration::from_secs(1)), TimerTick::Completed);
    }

    #[test]
    fn test_unstarted_timer_is_inert() {
        let mut timer = SessionTimer::new();
        assert_eq!(timer.tick(Instant::now()), TimerTick::Inert);
    }
}
