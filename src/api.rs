//! Public API surface for the cleaning engine.
//!
//! This file consolidates the strongly-typed identifiers and re-exports the
//! DTO types a host (e.g. an HTTP layer) exchanges with the engine. All types
//! derive Serialize/Deserialize for JSON serialization.

pub use crate::models::{
    Column, ColumnOrdering, ColumnType, Row, SortDirection, Table, TableQuery, Value,
};
pub use crate::routes::charts::ChartData;
pub use crate::routes::dedup::DedupConfig;
pub use crate::routes::dedup::DedupSummary;
pub use crate::routes::dedup::SimilarityMetric;
pub use crate::routes::history::HistoryPage;
pub use crate::routes::transformations::DateElement;
pub use crate::routes::transformations::DiscretizeSpec;
pub use crate::routes::transformations::ImputeMethod;
pub use crate::routes::transformations::ReplaceMode;
pub use crate::routes::transformations::TransformOutcome;

use serde::{Deserialize, Serialize};

/// Dataset identifier (one relational schema per dataset).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DatasetId(pub i64);

/// Duplicate-group identifier within a dedup run (1-based).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub i64);

/// History entry identifier (append order).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionId(pub i64);

impl DatasetId {
    pub fn new(value: i64) -> Self {
        DatasetId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl GroupId {
    pub fn new(value: i64) -> Self {
        GroupId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl ActionId {
    pub fn new(value: i64) -> Self {
        ActionId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for DatasetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DatasetId> for i64 {
    fn from(id: DatasetId) -> Self {
        id.0
    }
}
impl From<GroupId> for i64 {
    fn from(id: GroupId) -> Self {
        id.0
    }
}
impl From<ActionId> for i64 {
    fn from(id: ActionId) -> Self {
        id.0
    }
}
