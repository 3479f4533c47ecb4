//! Point normalization
//!
//! Converts a raw sequence, in whichever encoding its producer used, into
//! one canonical shape declared by the field schema.

use crate::error::ComputeError;
use crate::types::{CanonicalSequence, FieldKind, Point, PointEncoding, RawSample, RawSequence};

/// Normalizer for raw sample sequences
pub struct PointNormalizer;

impl PointNormalizer {
    /// Normalize a raw sequence to the canonical shape of `kind`.
    ///
    /// Point fields accept named pairs or 2-element ordered pairs. The first
    /// sample fixes the encoding for the whole sequence. Scalar fields accept
    /// bare numbers only.
    pub fn normalize(
        raw: &RawSequence,
        kind: FieldKind,
    ) -> Result<CanonicalSequence, ComputeError> {
        match kind {
            FieldKind::Points => {
                let encoding = raw.samples().first().and_then(RawSample::encoding);
                raw.samples()
                    .iter()
                    .enumerate()
                    .map(|(index, sample)| {
                        check_encoding(index, sample, encoding)?;
                        to_point(index, sample)
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(CanonicalSequence::Points)
            }
            FieldKind::Scalars => raw
                .samples()
                .iter()
                .enumerate()
                .map(|(index, sample)| to_scalar(index, sample))
                .collect::<Result<Vec<_>, _>>()
                .map(CanonicalSequence::Scalars),
        }
    }
}

fn check_encoding(
    index: usize,
    sample: &RawSample,
    expected: Option<PointEncoding>,
) -> Result<(), ComputeError> {
    match (sample.encoding(), expected) {
        (Some(found), Some(expected)) if found != expected => Err(ComputeError::ShapeError(
            format!(
                "sample {} is {:?}, sequence started as {:?}",
                index, found, expected
            ),
        )),
        _ => Ok(()),
    }
}

fn to_point(index: usize, sample: &RawSample) -> Result<Point, ComputeError> {
    match sample {
        RawSample::Named(named) => Ok(Point::new(named.x, named.y)),
        RawSample::Pair(coords) if coords.len() == 2 => Ok(Point::new(coords[0], coords[1])),
        RawSample::Pair(coords) => Err(ComputeError::ShapeError(format!(
            "sample {} has {} coordinates, expected 2",
            index,
            coords.len()
        ))),
        RawSample::Scalar(_) => Err(ComputeError::ShapeError(format!(
            "sample {} is a scalar in a point sequence",
            index
        ))),
        RawSample::Unrecognized(value) => Err(ComputeError::ShapeError(format!(
            "sample {} is not a point: {}",
            index, value
        ))),
    }
}

fn to_scalar(index: usize, sample: &RawSample) -> Result<f64, ComputeError> {
    match sample {
        RawSample::Scalar(value) => Ok(*value),
        RawSample::Pair(_) | RawSample::Named(_) => Err(ComputeError::ShapeError(format!(
            "sample {} is a point in a scalar sequence",
            index
        ))),
        RawSample::Unrecognized(value) => Err(ComputeError::ShapeError(format!(
            "sample {} is not a number: {}",
            index, value
        ))),
    }
}
