//! Local sample summary
//!
//! Summarises a captured [`Sample`] with the same raw statistics the scorer
//! derives its baseline from: latency distribution and keystroke rhythm. The
//! summary is reported alongside a session result; it is not sent to the
//! scorer.

use crate::types::Sample;
use serde::{Deserialize, Serialize};

/// Descriptive statistics of one capture window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub keystrokes: u32,
    pub latency_samples: usize,
    pub latency_mean: f64,
    pub latency_std: f64,
    pub latency_p75: f64,
    pub latency_var: f64,
    /// Mean gap between consecutive keystrokes (ms)
    pub keystroke_interval_mean: f64,
    pub keystroke_interval_std: f64,
    /// Longest minus shortest keystroke gap (ms)
    pub keystroke_interval_range: f64,
}

impl SampleSummary {
    pub fn from_sample(sample: &Sample) -> Self {
        let latencies = &sample.latencies;
        let (latency_mean, latency_var) = mean_and_variance(latencies);

        let intervals: Vec<f64> = sample
            .keystroke_timestamps
            .windows(2)
            .map(|w| (w[1] - w[0]).num_milliseconds() as f64)
            .collect();

        // Rhythm needs at least two keystrokes
        let (keystroke_interval_mean, interval_var, keystroke_interval_range) =
            if intervals.is_empty() {
                (0.0, 0.0, 0.0)
            } else {
                let (mean, var) = mean_and_variance(&intervals);
                let max = intervals.iter().cloned().fold(f64::MIN, f64::max);
                let min = intervals.iter().cloned().fold(f64::MAX, f64::min);
                (mean, var, max - min)
            };

        Self {
            keystrokes: sample.event_count,
            latency_samples: latencies.len(),
            latency_mean,
            latency_std: latency_var.sqrt(),
            latency_p75: percentile(latencies, 75.0),
            latency_var,
            keystroke_interval_mean,
            keystroke_interval_std: interval_var.sqrt(),
            keystroke_interval_range,
        }
    }
}

/// Population mean and variance; zero for an empty slice
fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}

/// Percentile with linear interpolation between closest ranks
fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (pct / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_empty_sample_summary_is_zeroed() {
        let summary = SampleSummary::from_sample(&Sample::default());
        assert_eq!(summary, SampleSummary::default());
    }

    #[test]
    fn test_latency_statistics() {
        let sample = Sample {
            keystroke_timestamps: vec![],
            latencies: vec![1.0, 2.0, 3.0, 4.0],
            event_count: 0,
        };
        let summary = SampleSummary::from_sample(&sample);

        assert!((summary.latency_mean - 2.5).abs() < 1e-9);
        assert!((summary.latency_var - 1.25).abs() < 1e-9);
        assert!((summary.latency_std - 1.25f64.sqrt()).abs() < 1e-9);
        // rank = 0.75 * 3 = 2.25 -> 3 + 0.25 * (4 - 3)
        assert!((summary.latency_p75 - 3.25).abs() < 1e-9);
    }

    #[test]
    fn test_keystroke_rhythm() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap();
        let sample = Sample {
            keystroke_timestamps: vec![
                t0,
                t0 + Duration::milliseconds(100),
                t0 + Duration::milliseconds(300),
            ],
            latencies: vec![0.0, 100.0, 300.0],
            event_count: 3,
        };
        let summary = SampleSummary::from_sample(&sample);

        assert_eq!(summary.keystrokes, 3);
        assert!((summary.keystroke_interval_mean - 150.0).abs() < 1e-9);
        assert!((summary.keystroke_interval_std - 50.0).abs() < 1e-9);
        assert!((summary.keystroke_interval_range - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_keystroke_has_no_rhythm() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap();
        let sample = Sample {
            keystroke_timestamps: vec![t0],
            latencies: vec![42.0],
            event_count: 1,
        };
        let summary = SampleSummary::from_sample(&sample);
        assert_eq!(summary.keystroke_interval_mean, 0.0);
        assert_eq!(summary.latency_p75, 42.0);
    }
}
