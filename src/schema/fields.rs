//! Field names and kinds of the kinematic session schema

use crate::types::FieldKind;
use serde::{Deserialize, Serialize};

/// Pointer trajectory, as 2-D points
pub const MOUSE_MOVEMENTS: &str = "mouseMovements";
/// Positions where the pointer rested, as 2-D points
pub const PAUSE_POINTS: &str = "pausePoints";
pub const ACCELERATIONS: &str = "accelerations";
pub const CURVATURES: &str = "curvatures";
pub const TIMESTAMPS: &str = "timestamps";

pub const TOTAL_TIME: &str = "totalTime";
pub const AVERAGE_SPEED: &str = "averageSpeed";
pub const JERK_SPIKE_COUNT: &str = "jerkSpikeCount";
pub const HESITATION: &str = "hesitation";

/// Derived from averaged accelerations, never averaged directly
pub const JERKS: &str = "jerks";
pub const JERKS_NORMALIZED: &str = "jerksNormalized";

/// A vector field of the schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorField {
    pub name: String,
    pub kind: FieldKind,
}

/// Field layout consumed by the session averager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSchema {
    /// Resampled and averaged position by position
    pub vector_fields: Vec<VectorField>,
    /// Averaged as plain numbers
    pub scalar_fields: Vec<String>,
    /// Scalar-array field jerk is derived from
    pub acceleration_field: Option<String>,
}

impl Default for SessionSchema {
    fn default() -> Self {
        Self::kinematic()
    }
}

impl SessionSchema {
    /// The pointer-kinematics schema recorded by behavioral sessions
    pub fn kinematic() -> Self {
        let vector = |name: &str, kind| VectorField {
            name: name.to_string(),
            kind,
        };
        Self {
            vector_fields: vec![
                vector(ACCELERATIONS, FieldKind::Scalars),
                vector(CURVATURES, FieldKind::Scalars),
                vector(TIMESTAMPS, FieldKind::Scalars),
                vector(MOUSE_MOVEMENTS, FieldKind::Points),
                vector(PAUSE_POINTS, FieldKind::Points),
            ],
            scalar_fields: [TOTAL_TIME, AVERAGE_SPEED, JERK_SPIKE_COUNT, HESITATION]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            acceleration_field: Some(ACCELERATIONS.to_string()),
        }
    }

    /// Kind of a vector field, if the schema declares it
    pub fn vector_kind(&self, name: &str) -> Option<FieldKind> {
        self.vector_fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.kind)
    }

    pub fn is_scalar_field(&self, name: &str) -> bool {
        self.scalar_fields.iter().any(|f| f == name)
    }

    /// Kind of any sequence an averaged record may carry, derived jerk
    /// fields included
    pub fn sequence_kind(&self, name: &str) -> Option<FieldKind> {
        match name {
            JERKS | JERKS_NORMALIZED if self.acceleration_field.is_some() => {
                Some(FieldKind::Scalars)
            }
            _ => self.vector_kind(name),
        }
    }
}
