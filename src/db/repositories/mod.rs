//! Repository implementations module.
//!
//! This module contains implementations of the repository traits:
//! - `local`: In-memory implementation for unit testing, demos and embedding
//!
//! The SQL-backed accessor of the full workbench is provided by the host
//! service and is not part of this crate.
#[cfg(feature = "local-repo")]
pub mod local;

#[cfg(feature = "local-repo")]
pub use local::LocalRepository;
