//! Session summary statistics
//!
//! Collection-level averages of the per-session scalars plus pause
//! statistics. Unlike the session averager, a missing scalar counts as zero
//! here, so every record weighs the same in every average.

use crate::schema::{AVERAGE_SPEED, HESITATION, JERK_SPIKE_COUNT, PAUSE_POINTS, TOTAL_TIME};
use crate::types::{RawField, RawSample, SessionRecord};
use serde::{Deserialize, Serialize};

/// Averages over a collection of session records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub average_total_time: f64,
    pub average_speed: f64,
    pub average_jerk_spike_count: f64,
    pub average_hesitation: f64,
    /// Mean duration over every pause of every session
    pub average_pause_duration: f64,
    /// Mean number of pauses per session
    pub average_pause_count: f64,
}

impl SessionSummary {
    pub fn compute(records: &[SessionRecord]) -> Self {
        let mut pause_durations: Vec<f64> = Vec::new();
        let mut pause_counts: Vec<f64> = Vec::with_capacity(records.len());

        for record in records {
            match record.get(PAUSE_POINTS) {
                Some(RawField::Sequence(pauses)) => {
                    pause_counts.push(pauses.len() as f64);
                    pause_durations.extend(pauses.samples().iter().map(pause_duration));
                }
                _ => pause_counts.push(0.0),
            }
        }

        Self {
            average_total_time: safe_avg(&scalar_or_zero(records, TOTAL_TIME)),
            average_speed: safe_avg(&scalar_or_zero(records, AVERAGE_SPEED)),
            average_jerk_spike_count: safe_avg(&scalar_or_zero(records, JERK_SPIKE_COUNT)),
            average_hesitation: safe_avg(&scalar_or_zero(records, HESITATION)),
            average_pause_duration: safe_avg(&pause_durations),
            average_pause_count: safe_avg(&pause_counts),
        }
    }
}

/// Pause duration of a named pause point, zero for any other encoding
fn pause_duration(sample: &RawSample) -> f64 {
    match sample {
        RawSample::Named(point) => point.duration.unwrap_or(0.0),
        _ => 0.0,
    }
}

fn scalar_or_zero(records: &[SessionRecord], name: &str) -> Vec<f64> {
    records
        .iter()
        .map(|record| match record.get(name) {
            Some(RawField::Number(value)) => *value,
            _ => 0.0,
        })
        .collect()
}

fn safe_avg(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SessionRecordAdapter;

    #[test]
    fn test_missing_scalars_count_as_zero() {
        let records = vec![
            SessionRecord::new().with_scalar(HESITATION, 0.6),
            SessionRecord::new(),
        ];
        let summary = SessionSummary::compute(&records);
        assert!((summary.average_hesitation - 0.3).abs() < 1e-12);
        assert_eq!(summary.average_total_time, 0.0);
    }

    #[test]
    fn test_pause_statistics() {
        let records = SessionRecordAdapter::parse_array(
            r#"[
                {"pausePoints": [{"x": 1, "y": 1, "duration": 200}, {"x": 2, "y": 2, "duration": 400}]},
                {"pausePoints": [{"x": 5, "y": 5}]},
                {}
            ]"#,
        )
        .unwrap();
        let summary = SessionSummary::compute(&records);

        // durations 200, 400, 0 over three pauses
        assert!((summary.average_pause_duration - 200.0).abs() < 1e-12);
        // counts 2, 1, 0 over three sessions
        assert!((summary.average_pause_count - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_collection() {
        let summary = SessionSummary::compute(&[]);
        assert_eq!(summary.average_speed, 0.0);
        assert_eq!(summary.average_pause_count, 0.0);
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(SessionSummary::compute(&[])).unwrap();
        assert!(value.get("averageTotalTime").is_some());
        assert!(value.get("averagePauseCount").is_some());
    }
}
