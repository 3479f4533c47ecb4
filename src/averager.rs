//! Session averaging
//!
//! Combines a collection of session records into one averaged record: vector
//! fields are resampled and averaged position by position, scalar fields are
//! averaged over the records that carry them, and jerk is derived from the
//! averaged accelerations.

use crate::aggregator::{Aggregator, FieldAggregate, SkipReason};
use crate::config::AveragingConfig;
use crate::error::ComputeError;
use crate::kinematics::KinematicDeriver;
use crate::schema::{SessionSchema, JERKS, JERKS_NORMALIZED};
use crate::types::{
    AveragedRecord, CanonicalSequence, FieldKind, FieldValue, RawField, RawSequence, SessionRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Result of one averaging run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragingOutcome {
    pub record: AveragedRecord,
    /// Number of input records consumed
    pub records_processed: usize,
    /// Skipped sequence count per aggregated vector field
    pub skipped: BTreeMap<String, usize>,
}

impl AveragingOutcome {
    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Orchestrates field aggregation over a fixed schema
#[derive(Debug, Clone)]
pub struct SessionAverager {
    config: AveragingConfig,
    schema: SessionSchema,
    aggregator: Aggregator,
}

impl Default for SessionAverager {
    fn default() -> Self {
        Self {
            config: AveragingConfig::default(),
            schema: SessionSchema::kinematic(),
            aggregator: Aggregator::default(),
        }
    }
}

impl SessionAverager {
    /// Create an averager over the kinematic schema
    pub fn new(config: AveragingConfig) -> Result<Self, ComputeError> {
        Self::with_schema(config, SessionSchema::kinematic())
    }

    pub fn with_schema(config: AveragingConfig, schema: SessionSchema) -> Result<Self, ComputeError> {
        let aggregator = Aggregator::from_config(&config)?;
        Ok(Self {
            config,
            schema,
            aggregator,
        })
    }

    pub fn config(&self) -> &AveragingConfig {
        &self.config
    }

    pub fn schema(&self) -> &SessionSchema {
        &self.schema
    }

    /// Average a collection of records into one record
    pub fn average<'a, I>(&self, records: I) -> AveragingOutcome
    where
        I: IntoIterator<Item = &'a SessionRecord>,
    {
        let records: Vec<&SessionRecord> = records.into_iter().collect();
        let mut record = AveragedRecord::new(records.len());
        let mut skipped = BTreeMap::new();

        for field in &self.schema.vector_fields {
            if let Some(aggregate) = self.aggregate_field(&records, &field.name, field.kind) {
                skipped.insert(field.name.clone(), aggregate.skipped_count());
                record
                    .fields
                    .insert(field.name.clone(), FieldValue::Sequence(aggregate.sequence));
            }
        }

        for name in &self.schema.scalar_fields {
            let value = mean_scalar(&records, name).unwrap_or(0.0);
            record.fields.insert(name.clone(), FieldValue::Scalar(value));
        }

        let jerk_profile = self
            .schema
            .acceleration_field
            .as_deref()
            .and_then(|name| record.sequence(name))
            .and_then(CanonicalSequence::as_scalars)
            .and_then(KinematicDeriver::derive);
        if let Some(profile) = jerk_profile {
            record.fields.insert(
                JERKS.to_string(),
                FieldValue::Sequence(CanonicalSequence::Scalars(profile.jerks)),
            );
            record.fields.insert(
                JERKS_NORMALIZED.to_string(),
                FieldValue::Sequence(CanonicalSequence::Scalars(profile.jerks_normalized)),
            );
        }

        let outcome = AveragingOutcome {
            record,
            records_processed: records.len(),
            skipped,
        };
        info!(
            records = outcome.records_processed,
            fields = outcome.record.fields.len(),
            skipped = outcome.total_skipped(),
            "averaging run complete"
        );
        outcome
    }

    /// Aggregate one vector field, or `None` when no record carries it
    fn aggregate_field(
        &self,
        records: &[&SessionRecord],
        name: &str,
        kind: FieldKind,
    ) -> Option<FieldAggregate> {
        let mut sequences: Vec<(usize, &RawSequence)> = Vec::new();
        let mut malformed: Vec<usize> = Vec::new();
        for (index, record) in records.iter().enumerate() {
            match record.get(name) {
                Some(RawField::Sequence(sequence)) => sequences.push((index, sequence)),
                Some(_) => {
                    warn!(field = name, index, "skipping non-sequence value");
                    malformed.push(index);
                }
                None => {}
            }
        }

        if sequences.is_empty() && malformed.is_empty() {
            return None;
        }

        let mut aggregate = self.aggregator.aggregate_indexed(name, kind, sequences);
        for index in malformed {
            aggregate.record_skip(
                index,
                SkipReason::Shape,
                "field value is not a sequence".to_string(),
            );
        }
        Some(aggregate)
    }
}

/// Mean over the records carrying a numeric value for `name`
fn mean_scalar(records: &[&SessionRecord], name: &str) -> Option<f64> {
    let values: Vec<f64> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match record.get(name) {
            Some(RawField::Number(value)) if value.is_finite() => Some(*value),
            Some(_) => {
                warn!(field = name, record = index, "ignoring non-numeric scalar");
                None
            }
            None => None,
        })
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
