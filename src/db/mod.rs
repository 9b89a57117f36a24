//! Database module for table and history storage.
//!
//! This module provides abstractions for storage operations via the
//! Repository pattern, allowing different backends to be swapped easily.
//!
//! # Architecture
//!
//! The database module follows a layered architecture:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Host Layer (REST API, import pipeline, etc.)           │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Engines (services::transform, services::dedup)          │
//! │  - Transformation executor + undo                        │
//! │  - Deduplication pipeline                                │
//! └───────────────────┬─────────────────────────────────────┘
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface   │
//! │  - TableRepository: column/table accessor                │
//! │  - HistoryRepository: append-only action ledger          │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌──────────────────────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! # Repository Pattern
//! The module includes:
//! - `services`: Repository helper functions shared by the engines
//! - `repository`: Trait definitions for storage operations
//! - `repositories::local`: In-memory implementation
//! - `factory`: Factory for creating repository instances
//!
//! Engines are constructed with an `Arc<dyn FullRepository>`; there is no
//! process-global repository instance.
//!
//! # Recommended Usage
//!
//! ```ignore
//! use dcw_rust::db::{RepositoryFactory, RepositoryType};
//! use dcw_rust::services::transform::TransformExecutor;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = RepositoryFactory::create(RepositoryType::Local).await?;
//!     let executor = TransformExecutor::new(repo.clone());
//!     Ok(())
//! }
//! ```

#[cfg(not(feature = "local-repo"))]
compile_error!("Enable the local-repo backend feature (or provide a backend crate).");

pub mod factory;
pub mod models;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;


// ==================== Service Layer ====================
// Repository helpers that work with any backend implementation

pub use services::{
    fetch_column_values, fetch_table, health_check, require_column, require_numeric_column,
    require_table, require_typed_column,
};

// ==================== Repository Pattern Exports ====================

pub use models::{HistoryEntry, HistoryOrderBy, HistoryQuery, InverseAction, NewHistoryEntry};
pub use repo_config::RepositoryConfig;

// Repository traits and implementations
pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
#[cfg(feature = "local-repo")]
pub use repositories::LocalRepository;
pub use repository::{
    ErrorContext, FullRepository, HistoryRepository, RepositoryError, RepositoryResult,
    TableRepository,
};
