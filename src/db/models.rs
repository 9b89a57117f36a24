//! Shared data models re-exported for database layer consumers, plus the
//! history ledger records.

pub use crate::models::{
    Column, ColumnOrdering, ColumnType, Row, SortDirection, Table, TableQuery, Value, ID_COLUMN,
};

use crate::api::{ActionId, DatasetId};
use chrono::{DateTime, Utc};

/// A recorded transformation: what was done, when, and how to undo it.
///
/// Entries are append-only and never mutated; ordering is by timestamp with
/// the id (append order) as tie-break.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HistoryEntry {
    pub id: ActionId,
    pub dataset_id: DatasetId,
    pub table_name: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub inverse: Option<InverseAction>,
}

/// Insertion record for the history log; the id is assigned by storage.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NewHistoryEntry {
    pub dataset_id: DatasetId,
    pub table_name: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub inverse: Option<InverseAction>,
}

impl NewHistoryEntry {
    /// Entry timestamped now.
    pub fn new(
        dataset_id: DatasetId,
        table_name: impl Into<String>,
        description: impl Into<String>,
        inverse: Option<InverseAction>,
    ) -> Self {
        Self {
            dataset_id,
            table_name: table_name.into(),
            timestamp: Utc::now(),
            description: description.into(),
            inverse,
        }
    }
}

/// A compensating action recorded alongside a transformation.
///
/// Interpreted by the transformation executor on undo; a SQL host persists it
/// as its JSON form. Each variant carries everything needed to reverse the
/// observable effect of the original operation without a stored snapshot.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InverseAction {
    /// Drop columns the operation created.
    DropColumn { columns: Vec<String> },
    /// Re-null cells the operation filled (their prior value was null).
    SetNull { column: String, row_ids: Vec<i64> },
    /// Re-insert rows the operation deleted, with their original ids and
    /// cell values. `rows` is aligned to `columns`.
    ReinsertRows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    /// Restore prior cell values captured before an in-place rewrite.
    UpdateValues {
        column: String,
        assignments: Vec<(i64, Value)>,
    },
}

/// Which history column a page is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum HistoryOrderBy {
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "action_desc")]
    Description,
}

impl HistoryOrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryOrderBy::Date => "date",
            HistoryOrderBy::Description => "action_desc",
        }
    }
}

/// Paging, ordering and search parameters for history reads.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HistoryQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub order_by: HistoryOrderBy,
    pub direction: SortDirection,
    /// Substring filter over the action description, case-insensitive.
    pub search: Option<String>,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        HistoryQuery {
            offset: None,
            limit: None,
            order_by: HistoryOrderBy::Date,
            direction: SortDirection::Asc,
            search: None,
        }
    }
}

impl HistoryQuery {
    pub fn page(offset: usize, limit: usize) -> Self {
        HistoryQuery {
            offset: Some(offset),
            limit: Some(limit),
            ..HistoryQuery::default()
        }
    }

    pub fn ordered_by(order_by: HistoryOrderBy, direction: SortDirection) -> Self {
        HistoryQuery {
            order_by,
            direction,
            ..HistoryQuery::default()
        }
    }

    pub fn with_search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }
}
