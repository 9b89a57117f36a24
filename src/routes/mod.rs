//! DTO modules for the engine's outward-facing surface.
//!
//! Each module pairs the data shapes a host serializes with the operation
//! name constants used in logs and error context.

pub mod charts;
pub mod dedup;
pub mod history;
pub mod transformations;
