//! Table, column and row shapes exchanged with the storage layer.

use serde::{Deserialize, Serialize};

use super::value::{ColumnType, Value};

/// Name of the mandatory first column of every table.
pub const ID_COLUMN: &str = "id";

/// A column: name plus declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Column {
            name: name.into(),
            column_type,
        }
    }
}

/// A row, aligned to its table's column sequence.
///
/// `values[0]` always mirrors `id` as `Value::Int`; the separate field keeps
/// the identifier typed for callers that never look at the cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: i64,
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(id: i64, values: Vec<Value>) -> Self {
        Row { id, values }
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// A materialized page (or the entirety) of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Cells of one column, in row order.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|r| r.value(idx)).collect())
    }
}

/// Sort direction for table and history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(alias = "ascending")]
    Asc,
    #[serde(alias = "descending")]
    Desc,
}

/// Ordering request: column name plus direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnOrdering {
    pub column: String,
    pub direction: SortDirection,
}

impl ColumnOrdering {
    pub fn asc(column: impl Into<String>) -> Self {
        ColumnOrdering {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        ColumnOrdering {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Paging, ordering and search parameters for a table fetch.
///
/// `search` is a case-insensitive substring match against the display form
/// of every cell in a row, mirroring the table widget the original UI used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub order_by: Option<ColumnOrdering>,
    pub search: Option<String>,
}

impl TableQuery {
    /// The whole table, natural order.
    pub fn all() -> Self {
        TableQuery::default()
    }

    pub fn page(offset: usize, limit: usize) -> Self {
        TableQuery {
            offset: Some(offset),
            limit: Some(limit),
            ..TableQuery::default()
        }
    }

    pub fn ordered_by(ordering: ColumnOrdering) -> Self {
        TableQuery {
            order_by: Some(ordering),
            ..TableQuery::default()
        }
    }

    pub fn with_search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table {
            name: "people".into(),
            columns: vec![
                Column::new(ID_COLUMN, ColumnType::Integer),
                Column::new("name", ColumnType::Text),
            ],
            rows: vec![
                Row::new(1, vec![Value::Int(1), Value::Text("ada".into())]),
                Row::new(2, vec![Value::Int(2), Value::Null]),
            ],
        }
    }

    #[test]
    fn test_column_index_lookup() {
        let table = sample_table();
        assert_eq!(table.column_index("name"), Some(1));
        assert_eq!(table.column_index("missing"), None);
    }

    #[test]
    fn test_column_values_in_row_order() {
        let table = sample_table();
        let values = table.column_values("name").unwrap();
        assert_eq!(values, vec![&Value::Text("ada".into()), &Value::Null]);
    }

    #[test]
    fn test_query_builders() {
        let q = TableQuery::page(10, 25).with_search("ada");
        assert_eq!(q.offset, Some(10));
        assert_eq!(q.limit, Some(25));
        assert_eq!(q.search.as_deref(), Some("ada"));
        assert!(q.order_by.is_none());

        let q = TableQuery::ordered_by(ColumnOrdering::desc("name"));
        assert_eq!(q.order_by.unwrap().direction, SortDirection::Desc);
    }

    #[test]
    fn test_sort_direction_serde_aliases() {
        let d: SortDirection = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(d, SortDirection::Asc);
        let d: SortDirection = serde_json::from_str("\"descending\"").unwrap();
        assert_eq!(d, SortDirection::Desc);
    }
}
