//! Kinematic trace types
//!
//! This module defines the sequence and record types that flow through the
//! averaging pipeline: raw session records in, one averaged record out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A 2-D sample. Serialized as an ordered `[x, y]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<Point> for [f64; 2] {
    fn from(point: Point) -> Self {
        [point.x, point.y]
    }
}

/// Declared shape of a vector field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Sequence of 2-D points (movement path, pause points)
    Points,
    /// Sequence of scalars (accelerations, curvatures, timestamps)
    Scalars,
}

/// How a single raw sample was encoded by its producer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointEncoding {
    /// `{ "x": .., "y": .. }`
    NamedPair,
    /// `[x, y]`
    OrderedPair,
    /// Bare number
    Scalar,
}

/// Named-coordinate point as recorded by the capture frontend.
///
/// Pause points additionally carry how long the pointer rested there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPoint {
    pub x: f64,
    pub y: f64,
    /// Pause duration in milliseconds (pause points only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// One sample of a raw sequence, in whichever encoding the producer used.
///
/// Variant order matters for untagged decoding: arrays of numbers land in
/// `Pair`, objects with `x`/`y` in `Named`, anything else in `Unrecognized`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSample {
    Scalar(f64),
    Pair(Vec<f64>),
    Named(NamedPoint),
    Unrecognized(serde_json::Value),
}

impl RawSample {
    /// Encoding of this sample, or `None` when it matches no known encoding
    pub fn encoding(&self) -> Option<PointEncoding> {
        match self {
            RawSample::Scalar(_) => Some(PointEncoding::Scalar),
            RawSample::Pair(_) => Some(PointEncoding::OrderedPair),
            RawSample::Named(_) => Some(PointEncoding::NamedPair),
            RawSample::Unrecognized(_) => None,
        }
    }
}

/// Variable-length sequence of samples as it arrives in a session record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSequence(pub Vec<RawSample>);

impl RawSequence {
    pub fn new(samples: Vec<RawSample>) -> Self {
        Self(samples)
    }

    /// Build a sequence of ordered `[x, y]` pairs
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|&(x, y)| RawSample::Pair(vec![x, y]))
                .collect(),
        )
    }

    /// Build a sequence of named `{x, y}` points
    pub fn from_named(pairs: &[(f64, f64)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|&(x, y)| {
                    RawSample::Named(NamedPoint {
                        x,
                        y,
                        duration: None,
                    })
                })
                .collect(),
        )
    }

    /// Build a sequence of bare numbers
    pub fn from_scalars(values: &[f64]) -> Self {
        Self(values.iter().copied().map(RawSample::Scalar).collect())
    }

    pub fn samples(&self) -> &[RawSample] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<RawSample>> for RawSequence {
    fn from(samples: Vec<RawSample>) -> Self {
        Self(samples)
    }
}

/// Uniformly shaped sequence, produced by the normalizer and the resampler.
///
/// Serialized untagged, so an empty sequence carries no kind and decodes as
/// `Points`. Use `SessionRecordAdapter::parse_averaged` to read records back
/// with the kinds the schema declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanonicalSequence {
    Points(Vec<Point>),
    Scalars(Vec<f64>),
}

impl CanonicalSequence {
    /// Empty sequence of the given kind ("field absent" marker)
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Points => CanonicalSequence::Points(Vec::new()),
            FieldKind::Scalars => CanonicalSequence::Scalars(Vec::new()),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            CanonicalSequence::Points(_) => FieldKind::Points,
            CanonicalSequence::Scalars(_) => FieldKind::Scalars,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CanonicalSequence::Points(points) => points.len(),
            CanonicalSequence::Scalars(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when every coordinate of every sample is finite
    pub fn is_finite(&self) -> bool {
        match self {
            CanonicalSequence::Points(points) => points.iter().all(Point::is_finite),
            CanonicalSequence::Scalars(values) => values.iter().all(|v| v.is_finite()),
        }
    }

    pub fn as_points(&self) -> Option<&[Point]> {
        match self {
            CanonicalSequence::Points(points) => Some(points),
            CanonicalSequence::Scalars(_) => None,
        }
    }

    pub fn as_scalars(&self) -> Option<&[f64]> {
        match self {
            CanonicalSequence::Scalars(values) => Some(values),
            CanonicalSequence::Points(_) => None,
        }
    }
}

/// One field value of an input session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Number(f64),
    Sequence(RawSequence),
    Other(serde_json::Value),
}

/// A decoded session record: field name to raw value.
///
/// Keys outside the averaging schema (question text, labels, ...) are kept
/// but ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionRecord {
    pub fields: BTreeMap<String, RawField>,
}

impl SessionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sequence(mut self, name: &str, sequence: RawSequence) -> Self {
        self.fields
            .insert(name.to_string(), RawField::Sequence(sequence));
        self
    }

    pub fn with_scalar(mut self, name: &str, value: f64) -> Self {
        self.fields.insert(name.to_string(), RawField::Number(value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&RawField> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// Aggregated value of one output field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(f64),
    Sequence(CanonicalSequence),
}

/// Terminal output of one averaging run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragedRecord {
    /// Human-readable description of the source collection
    pub question: String,
    pub answer: String,
    /// Averaged fields keyed by schema name
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl AveragedRecord {
    pub fn new(records_processed: usize) -> Self {
        Self {
            question: format!("Average over {} samples", records_processed),
            answer: "N/A".to_string(),
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn sequence(&self, name: &str) -> Option<&CanonicalSequence> {
        match self.fields.get(name) {
            Some(FieldValue::Sequence(sequence)) => Some(sequence),
            _ => None,
        }
    }

    pub fn scalar(&self, name: &str) -> Option<f64> {
        match self.fields.get(name) {
            Some(FieldValue::Scalar(value)) => Some(*value),
            _ => None,
        }
    }
}
