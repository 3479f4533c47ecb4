//! Synheart Motion - On-device engine for averaging pointer kinematic traces
//!
//! Motion turns a collection of recorded pointer sessions into one averaged
//! session through a deterministic pipeline: record decoding → point
//! normalization → fixed-length resampling → position-wise aggregation →
//! jerk derivation → encoding.
//!
//! ## Modules
//!
//! - **Averaging**: resample every vector field to a common length and average
//!   it across sessions
//! - **Analysis**: summary statistics and jerk-spike detection over the result

pub mod aggregator;
pub mod averager;
pub mod config;
pub mod encoder;
pub mod error;
pub mod kinematics;
pub mod normalizer;
pub mod pipeline;
pub mod resampler;
pub mod schema;
pub mod spikes;
pub mod summary;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use averager::{AveragingOutcome, SessionAverager};
pub use config::AveragingConfig;
pub use error::ComputeError;
pub use pipeline::{
    average_sessions, average_sessions_with_config, summarize_sessions, MotionProcessor,
};

// Schema exports
pub use schema::{SessionRecordAdapter, SessionSchema, SCHEMA_VERSION};

// Data model exports
pub use types::{AveragedRecord, CanonicalSequence, FieldKind, Point, RawSequence, SessionRecord};

/// Motion version embedded in all payloads
pub const MOTION_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for payloads
pub const PRODUCER_NAME: &str = "synheart-motion";
