//! Cross-session aggregation
//!
//! Normalizes and resamples every sequence recorded for one field, drops the
//! ones that fail, and averages the survivors position by position.

use crate::config::AveragingConfig;
use crate::error::ComputeError;
use crate::normalizer::PointNormalizer;
use crate::resampler::Resampler;
use crate::types::{CanonicalSequence, FieldKind, Point, RawSequence};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Why a sequence was left out of an aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No samples
    Empty,
    /// Inconsistent or non-2-D sample shapes
    Shape,
    /// Curve fitting rejected the samples
    Resampling,
}

impl SkipReason {
    fn from_error(error: &ComputeError) -> Self {
        match error {
            ComputeError::ResamplingError(_) => SkipReason::Resampling,
            _ => SkipReason::Shape,
        }
    }
}

/// A sequence excluded from aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSequence {
    /// Position of the sequence in the input collection
    pub index: usize,
    pub reason: SkipReason,
    pub detail: String,
}

/// Aggregated value of one field plus its success/failure tally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAggregate {
    pub kind: FieldKind,
    /// Position-wise mean; empty when no sequence survived
    pub sequence: CanonicalSequence,
    /// Sequences that contributed to the mean
    pub accepted: usize,
    pub skipped: Vec<SkippedSequence>,
}

impl FieldAggregate {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Tally a sequence rejected before it reached the aggregator
    pub fn record_skip(&mut self, index: usize, reason: SkipReason, detail: String) {
        self.skipped.push(SkippedSequence {
            index,
            reason,
            detail,
        });
    }

    /// True when no sequence survived ("field absent")
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Aggregator for one field's sequences across sessions
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    resampler: Resampler,
}

impl Aggregator {
    pub fn new(resampler: Resampler) -> Self {
        Self { resampler }
    }

    pub fn from_config(config: &AveragingConfig) -> Result<Self, ComputeError> {
        Ok(Self::new(Resampler::new(config)?))
    }

    pub fn target_len(&self) -> usize {
        self.resampler.target_len()
    }

    /// Aggregate all sequences of `field`. Per-sequence failures are
    /// skipped and tallied, never returned.
    pub fn aggregate<'a, I>(&self, field: &str, kind: FieldKind, sequences: I) -> FieldAggregate
    where
        I: IntoIterator<Item = &'a RawSequence>,
    {
        self.aggregate_indexed(field, kind, sequences.into_iter().enumerate())
    }

    /// Like [`Aggregator::aggregate`], with caller-chosen indices reported
    /// in the skip tally (e.g. the source record position)
    pub fn aggregate_indexed<'a, I>(&self, field: &str, kind: FieldKind, sequences: I) -> FieldAggregate
    where
        I: IntoIterator<Item = (usize, &'a RawSequence)>,
    {
        let mut survivors: Vec<CanonicalSequence> = Vec::new();
        let mut skipped: Vec<SkippedSequence> = Vec::new();

        for (index, raw) in sequences {
            if raw.is_empty() {
                warn!(field, index, "skipping empty sequence");
                skipped.push(SkippedSequence {
                    index,
                    reason: SkipReason::Empty,
                    detail: "sequence has no samples".to_string(),
                });
                continue;
            }

            match self.prepare(kind, raw) {
                Ok(resampled) => survivors.push(resampled),
                Err(e) => {
                    warn!(field, index, reason = e.kind(), "skipping invalid sequence: {}", e);
                    skipped.push(SkippedSequence {
                        index,
                        reason: SkipReason::from_error(&e),
                        detail: e.to_string(),
                    });
                }
            }
        }

        debug!(
            field,
            accepted = survivors.len(),
            skipped = skipped.len(),
            "field aggregated"
        );

        FieldAggregate {
            kind,
            sequence: position_wise_mean(kind, &survivors, self.target_len()),
            accepted: survivors.len(),
            skipped,
        }
    }

    /// Normalize, resample and validate one sequence
    fn prepare(
        &self,
        kind: FieldKind,
        raw: &RawSequence,
    ) -> Result<CanonicalSequence, ComputeError> {
        let canonical = PointNormalizer::normalize(raw, kind)?;
        let resampled = self.resampler.resample(&canonical)?;
        validate_resampled(&resampled, kind, self.target_len())?;
        Ok(resampled)
    }
}

fn validate_resampled(
    sequence: &CanonicalSequence,
    kind: FieldKind,
    target_len: usize,
) -> Result<(), ComputeError> {
    if sequence.kind() != kind {
        return Err(ComputeError::ShapeError(format!(
            "resampled {:?} sequence in a {:?} field",
            sequence.kind(),
            kind
        )));
    }
    if sequence.len() != target_len {
        return Err(ComputeError::ShapeError(format!(
            "resampled length {} differs from target {}",
            sequence.len(),
            target_len
        )));
    }
    if !sequence.is_finite() {
        return Err(ComputeError::ResamplingError(
            "resampled sequence contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

/// Arithmetic mean at every position. All inputs are `len` long.
fn position_wise_mean(kind: FieldKind, sequences: &[CanonicalSequence], len: usize) -> CanonicalSequence {
    if sequences.is_empty() {
        return CanonicalSequence::empty(kind);
    }
    let count = sequences.len() as f64;

    match kind {
        FieldKind::Scalars => {
            let mut sums = vec![0.0; len];
            for values in sequences.iter().filter_map(CanonicalSequence::as_scalars) {
                for (sum, value) in sums.iter_mut().zip(values) {
                    *sum += value;
                }
            }
            CanonicalSequence::Scalars(sums.into_iter().map(|s| s / count).collect())
        }
        FieldKind::Points => {
            let mut sums = vec![(0.0, 0.0); len];
            for points in sequences.iter().filter_map(CanonicalSequence::as_points) {
                for (sum, point) in sums.iter_mut().zip(points) {
                    sum.0 += point.x;
                    sum.1 += point.y;
                }
            }
            CanonicalSequence::Points(
                sums.into_iter()
                    .map(|(x, y)| Point::new(x / count, y / count))
                    .collect(),
            )
        }
    }
}
