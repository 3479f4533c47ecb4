//! Jerk-spike detection
//!
//! A consumer of the averaged jerk sequence. The detection threshold is the
//! most sensitive of three heuristics: a clamped multiple of the mean
//! absolute jerk, a high percentile of |jerk|, and a fixed ceiling.

use crate::error::ComputeError;
use crate::kinematics::mean_abs;
use serde::{Deserialize, Serialize};

/// Threshold heuristics for spike detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeThresholds {
    pub mean_multiplier: f64,
    /// Clamp range applied to `mean_multiplier * mean(|jerk|)`
    pub mean_floor: f64,
    pub mean_ceiling: f64,
    /// Percentile of |jerk|, in [0, 100]
    pub percentile: f64,
    pub fixed: f64,
    /// Moving-average window for the smoothed curve
    pub smoothing_window: usize,
}

impl Default for SpikeThresholds {
    fn default() -> Self {
        Self {
            mean_multiplier: 4.0,
            mean_floor: 400_000.0,
            mean_ceiling: 1_000_000.0,
            percentile: 95.0,
            fixed: 20_000.0,
            smoothing_window: 3,
        }
    }
}

impl SpikeThresholds {
    /// Check the heuristics form a usable threshold rule
    pub fn validate(&self) -> Result<(), ComputeError> {
        let bounds = [
            ("mean_multiplier", self.mean_multiplier),
            ("mean_floor", self.mean_floor),
            ("mean_ceiling", self.mean_ceiling),
            ("fixed", self.fixed),
        ];
        if let Some((name, value)) = bounds.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ComputeError::InvalidConfig(format!(
                "{} must be finite, got {}",
                name, value
            )));
        }
        if self.mean_floor > self.mean_ceiling {
            return Err(ComputeError::InvalidConfig(format!(
                "mean_floor {} exceeds mean_ceiling {}",
                self.mean_floor, self.mean_ceiling
            )));
        }
        if !(0.0..=100.0).contains(&self.percentile) {
            return Err(ComputeError::InvalidConfig(format!(
                "percentile must be within [0, 100], got {}",
                self.percentile
            )));
        }
        if self.smoothing_window < 1 {
            return Err(ComputeError::InvalidConfig(
                "smoothing_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Detected spikes in a jerk sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeReport {
    pub threshold: f64,
    /// Positions where |jerk| >= threshold
    pub indices: Vec<usize>,
    /// Smoothed jerk at each spike position
    pub values: Vec<f64>,
    /// Smoothed jerk curve, same length as the input
    pub smoothed: Vec<f64>,
}

impl SpikeReport {
    pub fn count(&self) -> usize {
        self.indices.len()
    }
}

/// Detector for spikes in an averaged jerk sequence
#[derive(Debug, Clone, Default)]
pub struct JerkSpikeDetector {
    thresholds: SpikeThresholds,
}

impl JerkSpikeDetector {
    pub fn new(thresholds: SpikeThresholds) -> Result<Self, ComputeError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &SpikeThresholds {
        &self.thresholds
    }

    /// Threshold for `jerks`; the fixed threshold when there is no data
    pub fn threshold(&self, jerks: &[f64]) -> f64 {
        let t = &self.thresholds;
        if jerks.is_empty() {
            return t.fixed;
        }
        let by_mean = (mean_abs(jerks) * t.mean_multiplier).clamp(t.mean_floor, t.mean_ceiling);
        let magnitudes: Vec<f64> = jerks.iter().map(|j| j.abs()).collect();
        let by_percentile = percentile(&magnitudes, t.percentile);
        by_mean.min(by_percentile).min(t.fixed)
    }

    pub fn detect(&self, jerks: &[f64]) -> SpikeReport {
        let threshold = self.threshold(jerks);
        let smoothed = moving_average(jerks, self.thresholds.smoothing_window);
        let indices: Vec<usize> = jerks
            .iter()
            .enumerate()
            .filter(|(_, j)| j.abs() >= threshold)
            .map(|(i, _)| i)
            .collect();
        let values = indices.iter().map(|&i| smoothed[i]).collect();

        SpikeReport {
            threshold,
            indices,
            values,
            smoothed,
        }
    }
}

/// Centered moving average with zero padding, same length as the input
pub fn moving_average(data: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 || data.is_empty() {
        return data.to_vec();
    }
    let offset = (window - 1) / 2;
    let w = window as f64;
    (0..data.len())
        .map(|i| {
            // window covers [i + offset + 1 - window, i + offset]
            let end = (i + offset).min(data.len() - 1);
            let start = (i + offset + 1).saturating_sub(window);
            data[start..=end].iter().sum::<f64>() / w
        })
        .collect()
}

/// Percentile with linear interpolation between closest ranks
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average_zero_padded() {
        let smoothed = moving_average(&[3.0, 6.0, 9.0, 12.0], 3);
        assert_eq!(smoothed, vec![3.0, 6.0, 9.0, 7.0]);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 50.0), 3.0);
        assert!((percentile(&values, 95.0) - 4.8).abs() < 1e-12);
        assert_eq!(percentile(&values, 100.0), 5.0);
    }

    #[test]
    fn test_percentile_threshold_for_isolated_spikes() {
        let mut jerks = vec![0.0; 40];
        jerks[20] = 50_000.0;
        jerks[21] = -60_000.0;
        let report = JerkSpikeDetector::default().detect(&jerks);

        // 95th percentile of |j| sits at rank 37.05, between 0 and 50000
        assert!((report.threshold - 2_500.0).abs() < 1e-6);
        assert_eq!(report.indices, vec![20, 21]);
    }

    #[test]
    fn test_fixed_threshold_caps_frequent_spikes() {
        let jerks: Vec<f64> = (0..100)
            .map(|i| if i % 10 == 0 { 30_000.0 } else { 100.0 })
            .collect();
        let report = JerkSpikeDetector::default().detect(&jerks);

        assert_eq!(report.threshold, 20_000.0);
        assert_eq!(report.indices, (0..100).step_by(10).collect::<Vec<_>>());
        assert_eq!(report.values.len(), 10);
        assert_eq!(report.smoothed.len(), jerks.len());
    }

    #[test]
    fn test_inverted_mean_bounds_rejected() {
        let thresholds: SpikeThresholds =
            serde_json::from_str(r#"{"mean_floor": 2000000.0}"#).unwrap();
        assert!(matches!(
            JerkSpikeDetector::new(thresholds),
            Err(ComputeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let defaults = SpikeThresholds::default();
        let cases = [
            SpikeThresholds {
                mean_ceiling: f64::NAN,
                ..defaults
            },
            SpikeThresholds {
                percentile: 120.0,
                ..defaults
            },
            SpikeThresholds {
                smoothing_window: 0,
                ..defaults
            },
        ];
        for thresholds in cases {
            assert!(thresholds.validate().is_err());
        }
    }

    #[test]
    fn test_custom_thresholds_detect() {
        let thresholds: SpikeThresholds =
            serde_json::from_str(r#"{"fixed": 2.5, "smoothing_window": 1}"#).unwrap();
        let report = JerkSpikeDetector::new(thresholds).unwrap().detect(&[1.0, 2.0, 3.0]);

        assert_eq!(report.threshold, 2.5);
        assert_eq!(report.indices, vec![2]);
        assert_eq!(report.smoothed, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_empty_jerks() {
        let report = JerkSpikeDetector::default().detect(&[]);
        assert_eq!(report.threshold, 20_000.0);
        assert_eq!(report.count(), 0);
    }
}
