//! Week-over-week anomaly detection
//!
//! Flags weeks whose interest moved at least a fixed fraction from the
//! immediately preceding week. Comparisons are skipped from a zero baseline
//! and across missing weeks.

use chrono::Duration;
use thiserror::Error;

use crate::models::{Anomaly, Direction, TrendSeries};

/// Default change threshold (30%)
pub const DEFAULT_THRESHOLD: f64 = 0.30;

/// Errors that can occur during anomaly detection
#[derive(Debug, Error, PartialEq)]
pub enum DetectError {
    #[error("Invalid threshold: {0} (must be a finite value greater than 0)")]
    InvalidThreshold(f64),
}

/// Result type for detection operations
pub type DetectResult<T> = Result<T, DetectError>;

/// Counts of flagged weeks by direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnomalySummary {
    pub spikes: usize,
    pub drops: usize,
}

impl AnomalySummary {
    pub fn total(&self) -> usize {
        self.spikes + self.drops
    }
}

/// Fixed-threshold week-over-week change detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyDetector {
    threshold: f64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl AnomalyDetector {
    /// Create a detector with the given threshold fraction
    ///
    /// # Errors
    ///
    /// Returns `DetectError::InvalidThreshold` unless `threshold` is finite and positive
    pub fn new(threshold: f64) -> DetectResult<Self> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(DetectError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Scan a series and return its anomalies in chronological order
    #[must_use]
    pub fn detect(&self, series: &TrendSeries) -> Vec<Anomaly> {
        series
            .points()
            .windows(2)
            .filter_map(|pair| {
                let (prev, curr) = (pair[0], pair[1]);
                if curr.week_start - prev.week_start != Duration::weeks(1) {
                    return None;
                }

                let percent_change = Anomaly::change_between(prev.value, curr.value)?;
                if percent_change.abs() < self.threshold {
                    return None;
                }

                Some(Anomaly {
                    week_start: curr.week_start,
                    previous_value: prev.value,
                    current_value: curr.value,
                    percent_change,
                    direction: Direction::from_change(percent_change),
                })
            })
            .collect()
    }

    /// Count spikes and drops in a detection result
    #[must_use]
    pub fn summary(anomalies: &[Anomaly]) -> AnomalySummary {
        anomalies
            .iter()
            .fold(AnomalySummary::default(), |mut acc, a| {
                match a.direction {
                    Direction::Spike => acc.spikes += 1,
                    Direction::Drop => acc.drops += 1,
                }
                acc
            })
    }
}

/// Detect anomalies with an explicit threshold
///
/// # Errors
///
/// Returns `DetectError::InvalidThreshold` for non-positive thresholds
pub fn detect(series: &TrendSeries, threshold: f64) -> DetectResult<Vec<Anomaly>> {
    Ok(AnomalyDetector::new(threshold)?.detect(series))
}
