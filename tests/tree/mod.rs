//! Container tree tests
//!
//! - Quality group availability across extruders
//! - Incremental updates from registry events
//! - Generated machines checked against the intersection rule

pub mod tests_incremental;
