//! Averaged payload encoder
//!
//! Wraps an averaging outcome in a payload carrying producer metadata and the
//! configuration the run used, or encodes the bare averaged record.

use crate::averager::AveragingOutcome;
use crate::config::AveragingConfig;
use crate::error::ComputeError;
use crate::types::AveragedRecord;
use crate::{MOTION_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Current payload schema version
pub const PAYLOAD_VERSION: &str = "1.0.0";

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Averaged record plus provenance and diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionPayload {
    pub payload_version: String,
    pub producer: MotionProducer,
    pub computed_at_utc: String,
    pub config: AveragingConfig,
    pub records_processed: usize,
    /// Skipped sequence count per aggregated vector field
    pub skipped: BTreeMap<String, usize>,
    pub result: AveragedRecord,
}

/// Encoder for averaging outcomes
pub struct MotionEncoder {
    instance_id: String,
}

impl Default for MotionEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn encode(&self, outcome: &AveragingOutcome, config: &AveragingConfig) -> MotionPayload {
        MotionPayload {
            payload_version: PAYLOAD_VERSION.to_string(),
            producer: MotionProducer {
                name: PRODUCER_NAME.to_string(),
                version: MOTION_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            config: *config,
            records_processed: outcome.records_processed,
            skipped: outcome.skipped.clone(),
            result: outcome.record.clone(),
        }
    }

    /// Encode the full payload to pretty JSON
    pub fn encode_to_json(
        &self,
        outcome: &AveragingOutcome,
        config: &AveragingConfig,
    ) -> Result<String, ComputeError> {
        let payload = self.encode(outcome, config);
        serde_json::to_string_pretty(&payload).map_err(ComputeError::JsonError)
    }

    /// Encode only the averaged record, in the flat result-file layout
    pub fn encode_record_json(record: &AveragedRecord) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(record)
            .map_err(|e| ComputeError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::averager::SessionAverager;
    use crate::schema::{TOTAL_TIME, TIMESTAMPS};
    use crate::types::{RawSequence, SessionRecord};

    fn outcome() -> AveragingOutcome {
        let records = vec![SessionRecord::new()
            .with_scalar(TOTAL_TIME, 12.0)
            .with_sequence(TIMESTAMPS, RawSequence::from_scalars(&[0.0, 16.0, 33.0]))];
        SessionAverager::new(AveragingConfig::default().with_target_len(5))
            .unwrap()
            .average(&records)
    }

    #[test]
    fn test_payload_metadata() {
        let encoder = MotionEncoder::with_instance_id("test-instance".to_string());
        let config = AveragingConfig::default().with_target_len(5);
        let payload = encoder.encode(&outcome(), &config);

        assert_eq!(payload.payload_version, PAYLOAD_VERSION);
        assert_eq!(payload.producer.name, PRODUCER_NAME);
        assert_eq!(payload.producer.instance_id, "test-instance");
        assert_eq!(payload.config.target_len, 5);
        assert_eq!(payload.records_processed, 1);
        assert_eq!(payload.skipped.get(TIMESTAMPS), Some(&0));
    }

    #[test]
    fn test_payload_json_shape() {
        let config = AveragingConfig::default().with_target_len(5);
        let json = MotionEncoder::new().encode_to_json(&outcome(), &config).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["result"]["question"], "Average over 1 samples");
        assert_eq!(value["result"]["totalTime"], 12.0);
        assert_eq!(value["result"]["timestamps"].as_array().unwrap().len(), 5);
        assert!(value["computed_at_utc"].is_string());
    }

    #[test]
    fn test_unique_instance_ids() {
        assert_ne!(MotionEncoder::new().instance_id(), MotionEncoder::new().instance_id());
    }

    #[test]
    fn test_record_json_full_precision() {
        let mut record = AveragedRecord::new(1);
        record.fields.insert(
            "averageSpeed".to_string(),
            crate::types::FieldValue::Scalar(0.1 + 0.2),
        );
        let json = MotionEncoder::encode_record_json(&record).unwrap();
        let back: AveragedRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.scalar("averageSpeed"), Some(0.1 + 0.2));
    }
}
