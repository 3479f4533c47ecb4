//! Session record schema
//!
//! This module defines the fixed set of kinematic fields a session record may
//! carry and the adapter that decodes record collections from JSON.

mod fields;
mod records;

pub use fields::*;
pub use records::*;

/// Version tag of the session record layout understood by this crate
pub const SCHEMA_VERSION: &str = "motion.session_record.v1";
