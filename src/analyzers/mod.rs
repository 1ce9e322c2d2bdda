//! Segment scoring, run comparison and coverage checks.
//!
//! Inspection records are bucketed into station-to-station segments per
//! direction and track, each segment gets a weighted score, and the result is
//! diffed against a prior run. The integrity check compares kilometer
//! coverage with the administrative structure reference.

pub mod aggregate;
pub mod analyzer;
pub mod compare;
pub mod integrity;
pub mod tier;
pub mod types;
pub mod utility;
