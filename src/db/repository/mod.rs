//! Repository traits and error types.
//!
//! The engines depend on these traits only; backends live under
//! `db::repositories`.

pub mod error;
pub mod history;
pub mod tables;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use history::HistoryRepository;
pub use tables::TableRepository;

/// Combined repository surface: table access plus the history ledger.
///
/// Services take `Arc<dyn FullRepository>` so a single backend serves both
/// concerns and tests can swap in the in-memory implementation.
pub trait FullRepository: TableRepository + HistoryRepository + std::fmt::Debug {}

impl<T: TableRepository + HistoryRepository + std::fmt::Debug> FullRepository for T {}
