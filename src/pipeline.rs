//! Pipeline orchestration
//!
//! This module provides the public API for Synheart Motion.
//! It orchestrates the full pipeline from session record JSON to the averaged
//! result: records → normalization → resampling → aggregation → jerk
//! derivation → encoding.

use crate::averager::{AveragingOutcome, SessionAverager};
use crate::config::AveragingConfig;
use crate::encoder::MotionEncoder;
use crate::error::ComputeError;
use crate::schema::SessionRecordAdapter;
use crate::summary::SessionSummary;
use crate::types::SessionRecord;

/// Average a JSON array of session records into one averaged record
/// (stateless, one-shot, default configuration).
///
/// # Arguments
/// * `records_json` - JSON array of session records
///
/// # Returns
/// Averaged record JSON in the flat result-file layout
///
/// # Example
/// ```ignore
/// let averaged_json = average_sessions(records_json)?;
/// ```
pub fn average_sessions(records_json: String) -> Result<String, ComputeError> {
    average_sessions_with_config(&records_json, AveragingConfig::default())
}

/// Like [`average_sessions`], with an explicit configuration
pub fn average_sessions_with_config(
    records_json: &str,
    config: AveragingConfig,
) -> Result<String, ComputeError> {
    // Stage 1: Decode records
    let records = SessionRecordAdapter::parse_array(records_json)?;

    // Stage 2: Normalize, resample, aggregate and derive jerk
    let averager = SessionAverager::new(config)?;
    let outcome = averager.average(&records);

    // Stage 3: Encode
    MotionEncoder::encode_record_json(&outcome.record)
}

/// Summary statistics of a JSON array of session records
pub fn summarize_sessions(records_json: &str) -> Result<String, ComputeError> {
    let records = SessionRecordAdapter::parse_array(records_json)?;
    let summary = SessionSummary::compute(&records);
    serde_json::to_string_pretty(&summary).map_err(ComputeError::JsonError)
}

/// Stateful processor that collects records incrementally and averages on
/// demand.
pub struct MotionProcessor {
    averager: SessionAverager,
    encoder: MotionEncoder,
    records: Vec<SessionRecord>,
}

impl MotionProcessor {
    /// Create a new processor with default settings (100-sample resampling)
    pub fn new() -> Self {
        Self::from_averager(SessionAverager::default())
    }

    /// Create a processor with a specific configuration
    pub fn with_config(config: AveragingConfig) -> Result<Self, ComputeError> {
        Ok(Self::from_averager(SessionAverager::new(config)?))
    }

    fn from_averager(averager: SessionAverager) -> Self {
        Self {
            averager,
            encoder: MotionEncoder::new(),
            records: Vec::new(),
        }
    }

    pub fn config(&self) -> &AveragingConfig {
        self.averager.config()
    }

    pub fn push_record(&mut self, record: SessionRecord) {
        self.records.push(record);
    }

    /// Add records from JSON: a single record object or an array of them.
    ///
    /// Returns the number of records added.
    pub fn push_json(&mut self, json: &str) -> Result<usize, ComputeError> {
        let records = SessionRecordAdapter::parse_document(json)?;
        let added = records.len();
        self.records.extend(records);
        Ok(added)
    }

    /// Number of records collected so far
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Average everything collected so far
    pub fn average(&self) -> AveragingOutcome {
        self.averager.average(&self.records)
    }

    /// Average and encode the full payload as JSON
    pub fn average_to_json(&self) -> Result<String, ComputeError> {
        let outcome = self.average();
        self.encoder.encode_to_json(&outcome, self.config())
    }

    /// Summary statistics of everything collected so far
    pub fn summary(&self) -> SessionSummary {
        SessionSummary::compute(&self.records)
    }

    /// Drop all collected records
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Default for MotionProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records_json() -> &'static str {
        r#"[
            {
                "question": "Where were you last night?",
                "mouseMovements": [{"x": 0, "y": 0}, {"x": 50, "y": 20}, {"x": 100, "y": 40}, {"x": 150, "y": 60}],
                "pausePoints": [{"x": 50, "y": 20, "duration": 300}],
                "accelerations": [0.0, 120.5, 80.25, -40.0, 10.0],
                "curvatures": [0.0, 0.1, 0.05],
                "timestamps": [0, 16, 33, 50, 66],
                "totalTime": 2.4,
                "averageSpeed": 310.2,
                "jerkSpikeCount": 3,
                "hesitation": 0.2
            },
            {
                "question": "Where were you last night?",
                "mouseMovements": [[0, 0], [75, 30], [150, 60]],
                "accelerations": [0.0, 90.0, -20.0],
                "timestamps": [0, 20, 40],
                "totalTime": 3.6,
                "averageSpeed": 250.0,
                "jerkSpikeCount": 1
            }
        ]"#
    }

    #[test]
    fn test_average_sessions_stateless() {
        let json = average_sessions(sample_records_json().to_string()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["question"], "Average over 2 samples");
        assert_eq!(value["mouseMovements"].as_array().unwrap().len(), 100);
        assert_eq!(value["accelerations"].as_array().unwrap().len(), 100);
        assert_eq!(value["jerks"].as_array().unwrap().len(), 99);
        assert_eq!(value["jerksNormalized"].as_array().unwrap().len(), 99);
        assert!((value["totalTime"].as_f64().unwrap() - 3.0).abs() < 1e-12);
        assert!((value["hesitation"].as_f64().unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_movement_endpoints_preserved() {
        let json = average_sessions(sample_records_json().to_string()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let path = value["mouseMovements"].as_array().unwrap();

        let first = path[0].as_array().unwrap();
        let last = path[99].as_array().unwrap();
        assert!(first[0].as_f64().unwrap().abs() < 1e-9);
        assert!((last[0].as_f64().unwrap() - 150.0).abs() < 1e-9);
        assert!((last[1].as_f64().unwrap() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_target_len() {
        let config = AveragingConfig::default().with_target_len(10);
        let json = average_sessions_with_config(sample_records_json(), config).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["curvatures"].as_array().unwrap().len(), 10);
        assert_eq!(value["jerks"].as_array().unwrap().len(), 9);
    }

    #[test]
    fn test_invalid_json() {
        let result = average_sessions("not valid json".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_non_array_input_rejected() {
        let result = average_sessions(r#"{"totalTime": 1}"#.to_string());
        assert!(matches!(result, Err(ComputeError::ParseError(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AveragingConfig::default().with_target_len(0);
        let result = average_sessions_with_config("[]", config);
        assert!(matches!(result, Err(ComputeError::InvalidConfig(_))));
    }

    #[test]
    fn test_summarize_sessions() {
        let json = summarize_sessions(sample_records_json()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!((value["averageJerkSpikeCount"].as_f64().unwrap() - 2.0).abs() < 1e-12);
        // hesitation missing from the second record counts as zero here
        assert!((value["averageHesitation"].as_f64().unwrap() - 0.1).abs() < 1e-12);
        assert!((value["averagePauseDuration"].as_f64().unwrap() - 300.0).abs() < 1e-12);
    }

    #[test]
    fn test_processor_stateful() {
        let mut processor = MotionProcessor::new();
        assert_eq!(processor.push_json(sample_records_json()).unwrap(), 2);
        assert_eq!(processor.record_count(), 2);

        let single = r#"{"totalTime": 9.0}"#;
        assert_eq!(processor.push_json(single).unwrap(), 1);

        let outcome = processor.average();
        assert_eq!(outcome.records_processed, 3);
        assert!((outcome.record.scalar("totalTime").unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_processor_payload() {
        let mut processor =
            MotionProcessor::with_config(AveragingConfig::default().with_target_len(20)).unwrap();
        processor.push_json(sample_records_json()).unwrap();

        let payload: serde_json::Value =
            serde_json::from_str(&processor.average_to_json().unwrap()).unwrap();
        assert_eq!(payload["producer"]["name"], "synheart-motion");
        assert_eq!(payload["config"]["target_len"], 20);
        assert_eq!(payload["records_processed"], 2);
        assert_eq!(payload["skipped"]["mouseMovements"], 0);
        assert_eq!(payload["result"]["timestamps"].as_array().unwrap().len(), 20);
    }

    #[test]
    fn test_clear_records() {
        let mut processor = MotionProcessor::new();
        processor.push_json(sample_records_json()).unwrap();
        processor.clear();
        assert_eq!(processor.record_count(), 0);

        let outcome = processor.average();
        assert_eq!(outcome.records_processed, 0);
        assert_eq!(outcome.record.scalar("totalTime"), Some(0.0));
    }
}
