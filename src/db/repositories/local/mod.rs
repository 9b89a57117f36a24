//! In-memory repository backend.
//!
//! Backing store for tests, demos and embedding: plain maps behind a
//! `parking_lot::RwLock`. Every trait call takes the lock once, so each call
//! is atomic and isolated exactly as the SQL-backed accessor guarantees per
//! statement. Multi-call flows (engine pipelines) compensate at the service
//! layer.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::api::{ActionId, DatasetId};
use crate::db::models::{HistoryEntry, HistoryOrderBy, HistoryQuery, NewHistoryEntry};
use crate::db::repository::error::{ErrorContext, RepositoryError, RepositoryResult};
use crate::db::repository::{HistoryRepository, TableRepository};
use crate::models::{
    Column, ColumnType, Row, SortDirection, Table, TableQuery, Value, ID_COLUMN,
};

/// One stored table: column metadata plus rows in insertion order.
///
/// `columns[0]` is always the `id` column; row values are stored for the
/// non-id columns only and the id cell is materialized on read.
#[derive(Debug, Clone)]
struct TableData {
    columns: Vec<Column>,
    rows: Vec<StoredRow>,
    next_id: i64,
}

#[derive(Debug, Clone)]
struct StoredRow {
    id: i64,
    values: Vec<Value>,
}

impl TableData {
    fn new(columns: Vec<Column>) -> Self {
        TableData {
            columns,
            rows: Vec::new(),
            next_id: 1,
        }
    }

    /// Index into `StoredRow::values` for a non-id column.
    fn stored_index(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .and_then(|i| i.checked_sub(1))
    }

    fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    fn bump_sequence(&mut self, used_id: i64) {
        if used_id >= self.next_id {
            self.next_id = used_id + 1;
        }
    }

    fn materialize_row(&self, row: &StoredRow) -> Row {
        let mut values = Vec::with_capacity(self.columns.len());
        values.push(Value::Int(row.id));
        values.extend(row.values.iter().cloned());
        Row::new(row.id, values)
    }
}

#[derive(Debug, Default)]
struct LocalState {
    /// dataset id -> table name -> table
    datasets: HashMap<i64, HashMap<String, TableData>>,
    history: Vec<HistoryEntry>,
    next_action_id: i64,
}

impl LocalState {
    fn table(&self, dataset: DatasetId, table: &str) -> RepositoryResult<&TableData> {
        self.datasets
            .get(&dataset.value())
            .and_then(|tables| tables.get(table))
            .ok_or_else(|| unknown_table(dataset, table))
    }

    fn table_mut(&mut self, dataset: DatasetId, table: &str) -> RepositoryResult<&mut TableData> {
        self.datasets
            .get_mut(&dataset.value())
            .and_then(|tables| tables.get_mut(table))
            .ok_or_else(|| unknown_table(dataset, table))
    }
}

fn unknown_table(dataset: DatasetId, table: &str) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("Table '{}' does not exist in dataset {}", table, dataset),
        ErrorContext::default()
            .with_entity("table")
            .with_entity_id(table),
    )
}

fn unknown_column(table: &str, column: &str) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("Column '{}' does not exist in table '{}'", column, table),
        ErrorContext::default()
            .with_entity("column")
            .with_entity_id(column),
    )
}

fn id_column_immutable(operation: &str) -> RepositoryError {
    RepositoryError::validation_with_context(
        format!("The '{}' column cannot be {}", ID_COLUMN, operation),
        ErrorContext::default().with_entity("column").with_entity_id(ID_COLUMN),
    )
}

/// In-memory implementation of the full repository surface.
#[derive(Debug, Default)]
pub struct LocalRepository {
    state: RwLock<LocalState>,
}

impl LocalRepository {
    pub fn new() -> Self {
        LocalRepository {
            state: RwLock::new(LocalState::default()),
        }
    }
}

/// Validates one value against a column, allowing nulls.
fn check_value(table: &str, column: &Column, value: &Value) -> RepositoryResult<()> {
    if value.matches_type(column.column_type) {
        Ok(())
    } else {
        Err(RepositoryError::validation_with_context(
            format!(
                "Value '{}' is not valid for column '{}' ({}) of table '{}'",
                value, column.name, column.column_type, table
            ),
            ErrorContext::default()
                .with_entity("column")
                .with_entity_id(&column.name),
        ))
    }
}

/// Resolves the parallel `columns`/`values` layout of an insert into
/// (explicit id, stored values), validating names, types and arity.
fn resolve_insert(
    data: &TableData,
    table: &str,
    columns: &[String],
    values: &[Value],
) -> RepositoryResult<(Option<i64>, Vec<Value>)> {
    if columns.len() != values.len() {
        return Err(RepositoryError::validation(format!(
            "Insert into '{}' has {} columns but {} values",
            table,
            columns.len(),
            values.len()
        )));
    }
    let mut seen = HashSet::new();
    for name in columns {
        if !data.has_column(name) {
            return Err(unknown_column(table, name));
        }
        if !seen.insert(name.as_str()) {
            return Err(RepositoryError::validation(format!(
                "Column '{}' listed twice in insert into '{}'",
                name, table
            )));
        }
    }

    let mut explicit_id = None;
    let mut stored = vec![Value::Null; data.columns.len() - 1];
    for (name, value) in columns.iter().zip(values) {
        if name == ID_COLUMN {
            match value {
                Value::Int(id) => explicit_id = Some(*id),
                other => {
                    return Err(RepositoryError::validation(format!(
                        "Explicit id must be an integer, got '{}'",
                        other
                    )))
                }
            }
            continue;
        }
        let column = data.column(name).ok_or_else(|| unknown_column(table, name))?;
        check_value(table, column, value)?;
        if let Some(idx) = data.stored_index(name) {
            stored[idx] = value.clone();
        }
    }
    Ok((explicit_id, stored))
}

fn duplicate_id(table: &str, id: i64) -> RepositoryError {
    // Mirrors a unique-constraint violation in a SQL backend.
    RepositoryError::storage_with_context(
        format!("Row id {} already exists in table '{}'", id, table),
        ErrorContext::default()
            .with_entity("row")
            .with_entity_id(id),
    )
}

#[async_trait]
impl TableRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }

    async fn get_column_names(
        &self,
        dataset: DatasetId,
        table: &str,
    ) -> RepositoryResult<Vec<String>> {
        let state = self.state.read();
        let data = state.table(dataset, table)?;
        Ok(data.columns.iter().map(|c| c.name.clone()).collect())
    }

    async fn get_column_names_and_types(
        &self,
        dataset: DatasetId,
        table: &str,
    ) -> RepositoryResult<Vec<Column>> {
        let state = self.state.read();
        Ok(state.table(dataset, table)?.columns.clone())
    }

    async fn table_exists(&self, dataset: DatasetId, table: &str) -> RepositoryResult<bool> {
        let state = self.state.read();
        Ok(state
            .datasets
            .get(&dataset.value())
            .is_some_and(|tables| tables.contains_key(table)))
    }

    async fn row_count(&self, dataset: DatasetId, table: &str) -> RepositoryResult<usize> {
        let state = self.state.read();
        Ok(state.table(dataset, table)?.rows.len())
    }

    async fn get_table(
        &self,
        dataset: DatasetId,
        table: &str,
        query: &TableQuery,
    ) -> RepositoryResult<Table> {
        let state = self.state.read();
        let data = state.table(dataset, table)?;

        let mut rows: Vec<Row> = data.rows.iter().map(|r| data.materialize_row(r)).collect();

        if let Some(needle) = query.search.as_deref() {
            let needle = needle.to_lowercase();
            rows.retain(|row| {
                row.values
                    .iter()
                    .any(|v| v.to_string().to_lowercase().contains(&needle))
            });
        }

        if let Some(ordering) = &query.order_by {
            let idx = data
                .columns
                .iter()
                .position(|c| c.name == ordering.column)
                .ok_or_else(|| unknown_column(table, &ordering.column))?;
            rows.sort_by(|a, b| {
                let ord = a.values[idx].sort_cmp(&b.values[idx]);
                match ordering.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        let offset = query.offset.unwrap_or(0).min(rows.len());
        let rows = match query.limit {
            Some(limit) => rows.into_iter().skip(offset).take(limit).collect(),
            None => rows.into_iter().skip(offset).collect(),
        };

        Ok(Table {
            name: table.to_string(),
            columns: data.columns.clone(),
            rows,
        })
    }

    async fn insert_row(
        &self,
        dataset: DatasetId,
        table: &str,
        columns: &[String],
        values: &[Value],
    ) -> RepositoryResult<i64> {
        let mut state = self.state.write();
        let data = state.table_mut(dataset, table)?;

        let (explicit_id, stored) = resolve_insert(data, table, columns, values)?;
        let id = match explicit_id {
            Some(id) => {
                if data.rows.iter().any(|r| r.id == id) {
                    return Err(duplicate_id(table, id));
                }
                id
            }
            None => data.next_id,
        };
        data.rows.push(StoredRow { id, values: stored });
        data.bump_sequence(id);
        Ok(id)
    }

    async fn insert_rows(
        &self,
        dataset: DatasetId,
        table: &str,
        columns: &[String],
        rows: &[Vec<Value>],
    ) -> RepositoryResult<usize> {
        let mut state = self.state.write();
        let data = state.table_mut(dataset, table)?;

        // Validate the whole batch before touching the table.
        let existing: HashSet<i64> = data.rows.iter().map(|r| r.id).collect();
        let mut resolved = Vec::with_capacity(rows.len());
        let mut batch_ids = HashSet::new();
        for values in rows {
            let (explicit_id, stored) = resolve_insert(data, table, columns, values)?;
            if let Some(id) = explicit_id {
                if existing.contains(&id) || !batch_ids.insert(id) {
                    return Err(duplicate_id(table, id));
                }
            }
            resolved.push((explicit_id, stored));
        }

        for (explicit_id, stored) in resolved {
            let id = explicit_id.unwrap_or(data.next_id);
            data.rows.push(StoredRow { id, values: stored });
            data.bump_sequence(id);
        }
        Ok(rows.len())
    }

    async fn delete_rows(
        &self,
        dataset: DatasetId,
        table: &str,
        row_ids: &[i64],
    ) -> RepositoryResult<usize> {
        let mut state = self.state.write();
        let data = state.table_mut(dataset, table)?;

        let present: HashSet<i64> = data.rows.iter().map(|r| r.id).collect();
        if let Some(missing) = row_ids.iter().find(|id| !present.contains(id)) {
            return Err(RepositoryError::not_found_with_context(
                format!("Row id {} does not exist in table '{}'", missing, table),
                ErrorContext::default()
                    .with_entity("row")
                    .with_entity_id(missing),
            ));
        }

        let doomed: HashSet<i64> = row_ids.iter().copied().collect();
        let before = data.rows.len();
        data.rows.retain(|r| !doomed.contains(&r.id));
        Ok(before - data.rows.len())
    }

    async fn update_values(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
        assignments: &[(i64, Value)],
    ) -> RepositoryResult<usize> {
        let mut state = self.state.write();
        let data = state.table_mut(dataset, table)?;

        if column == ID_COLUMN {
            return Err(id_column_immutable("rewritten"));
        }
        let col = data
            .column(column)
            .cloned()
            .ok_or_else(|| unknown_column(table, column))?;
        let idx = data
            .stored_index(column)
            .ok_or_else(|| unknown_column(table, column))?;

        // Validate the whole batch first.
        let by_id: HashMap<i64, usize> = data
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id, i))
            .collect();
        for (row_id, value) in assignments {
            if !by_id.contains_key(row_id) {
                return Err(RepositoryError::not_found_with_context(
                    format!("Row id {} does not exist in table '{}'", row_id, table),
                    ErrorContext::default()
                        .with_entity("row")
                        .with_entity_id(row_id),
                ));
            }
            check_value(table, &col, value)?;
        }

        for (row_id, value) in assignments {
            let row_index = by_id[row_id];
            data.rows[row_index].values[idx] = value.clone();
        }
        Ok(assignments.len())
    }

    async fn insert_column(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
        column_type: ColumnType,
    ) -> RepositoryResult<()> {
        let mut state = self.state.write();
        let data = state.table_mut(dataset, table)?;

        if data.has_column(column) {
            return Err(RepositoryError::validation_with_context(
                format!("Column '{}' already exists in table '{}'", column, table),
                ErrorContext::default()
                    .with_entity("column")
                    .with_entity_id(column),
            ));
        }
        data.columns.push(Column::new(column, column_type));
        for row in &mut data.rows {
            row.values.push(Value::Null);
        }
        Ok(())
    }

    async fn delete_column(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
    ) -> RepositoryResult<()> {
        let mut state = self.state.write();
        let data = state.table_mut(dataset, table)?;

        if column == ID_COLUMN {
            return Err(id_column_immutable("dropped"));
        }
        let idx = data
            .stored_index(column)
            .ok_or_else(|| unknown_column(table, column))?;
        data.columns.remove(idx + 1);
        for row in &mut data.rows {
            row.values.remove(idx);
        }
        Ok(())
    }

    async fn rename_column(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
        new_name: &str,
    ) -> RepositoryResult<()> {
        let mut state = self.state.write();
        let data = state.table_mut(dataset, table)?;

        if column == ID_COLUMN {
            return Err(id_column_immutable("renamed"));
        }
        if !data.has_column(column) {
            return Err(unknown_column(table, column));
        }
        if new_name != column && data.has_column(new_name) {
            return Err(RepositoryError::validation_with_context(
                format!("Column '{}' already exists in table '{}'", new_name, table),
                ErrorContext::default()
                    .with_entity("column")
                    .with_entity_id(new_name),
            ));
        }
        if let Some(col) = data.columns.iter_mut().find(|c| c.name == column) {
            col.name = new_name.to_string();
        }
        Ok(())
    }

    async fn update_column_type(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
        new_type: ColumnType,
    ) -> RepositoryResult<()> {
        let mut state = self.state.write();
        let data = state.table_mut(dataset, table)?;

        if column == ID_COLUMN {
            return Err(id_column_immutable("retyped"));
        }
        let idx = data
            .stored_index(column)
            .ok_or_else(|| unknown_column(table, column))?;

        // Coerce every cell up front; only then commit.
        let mut coerced = Vec::with_capacity(data.rows.len());
        for row in &data.rows {
            match row.values[idx].coerce_to(new_type) {
                Some(value) => coerced.push(value),
                None => {
                    return Err(RepositoryError::validation_with_context(
                        format!(
                            "Value '{}' of row {} cannot be converted to {}",
                            row.values[idx], row.id, new_type
                        ),
                        ErrorContext::default()
                            .with_entity("column")
                            .with_entity_id(column),
                    ))
                }
            }
        }

        for (row, value) in data.rows.iter_mut().zip(coerced) {
            row.values[idx] = value;
        }
        data.columns[idx + 1].column_type = new_type;
        Ok(())
    }

    async fn create_table(
        &self,
        dataset: DatasetId,
        table: &str,
        columns: &[Column],
    ) -> RepositoryResult<()> {
        let mut state = self.state.write();
        let tables = state.datasets.entry(dataset.value()).or_default();

        if tables.contains_key(table) {
            return Err(RepositoryError::validation_with_context(
                format!("Table '{}' already exists in dataset {}", table, dataset),
                ErrorContext::default()
                    .with_entity("table")
                    .with_entity_id(table),
            ));
        }
        let mut seen = HashSet::new();
        for column in columns {
            if column.name == ID_COLUMN {
                return Err(RepositoryError::validation(format!(
                    "Column '{}' is created implicitly and cannot be declared",
                    ID_COLUMN
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(RepositoryError::validation(format!(
                    "Duplicate column '{}' in new table '{}'",
                    column.name, table
                )));
            }
        }

        let mut all = Vec::with_capacity(columns.len() + 1);
        all.push(Column::new(ID_COLUMN, ColumnType::Integer));
        all.extend_from_slice(columns);
        tables.insert(table.to_string(), TableData::new(all));
        log::debug!("created table '{}' in dataset {}", table, dataset);
        Ok(())
    }

    async fn delete_table(&self, dataset: DatasetId, table: &str) -> RepositoryResult<()> {
        let mut state = self.state.write();
        let tables = state
            .datasets
            .get_mut(&dataset.value())
            .ok_or_else(|| unknown_table(dataset, table))?;
        if tables.remove(table).is_none() {
            return Err(unknown_table(dataset, table));
        }
        log::debug!("dropped table '{}' in dataset {}", table, dataset);
        Ok(())
    }
}

#[async_trait]
impl HistoryRepository for LocalRepository {
    async fn log_action(&self, entry: NewHistoryEntry) -> RepositoryResult<ActionId> {
        let mut state = self.state.write();
        state.next_action_id += 1;
        let id = ActionId::new(state.next_action_id);
        state.history.push(HistoryEntry {
            id,
            dataset_id: entry.dataset_id,
            table_name: entry.table_name,
            timestamp: entry.timestamp,
            description: entry.description,
            inverse: entry.inverse,
        });
        Ok(id)
    }

    async fn get_actions(
        &self,
        dataset: DatasetId,
        table: &str,
        query: &HistoryQuery,
    ) -> RepositoryResult<Vec<HistoryEntry>> {
        let state = self.state.read();
        let mut entries: Vec<HistoryEntry> = state
            .history
            .iter()
            .filter(|e| e.dataset_id == dataset && e.table_name == table)
            .cloned()
            .collect();

        if let Some(needle) = query.search.as_deref() {
            let needle = needle.to_lowercase();
            entries.retain(|e| e.description.to_lowercase().contains(&needle));
        }

        entries.sort_by(|a, b| {
            let ord = match query.order_by {
                HistoryOrderBy::Date => a
                    .timestamp
                    .cmp(&b.timestamp)
                    .then_with(|| a.id.cmp(&b.id)),
                HistoryOrderBy::Description => a
                    .description
                    .cmp(&b.description)
                    .then_with(|| a.id.cmp(&b.id)),
            };
            match query.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        let offset = query.offset.unwrap_or(0).min(entries.len());
        let entries = match query.limit {
            Some(limit) => entries.into_iter().skip(offset).take(limit).collect(),
            None => entries.into_iter().skip(offset).collect(),
        };
        Ok(entries)
    }

    async fn get_all_actions(
        &self,
        dataset: DatasetId,
        table: &str,
    ) -> RepositoryResult<Vec<HistoryEntry>> {
        let state = self.state.read();
        let mut entries: Vec<HistoryEntry> = state
            .history
            .iter()
            .filter(|e| e.dataset_id == dataset && e.table_name == table)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(entries)
    }

    async fn get_action(&self, id: ActionId) -> RepositoryResult<HistoryEntry> {
        let state = self.state.read();
        state
            .history
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("History entry {} does not exist", id),
                    ErrorContext::default()
                        .with_entity("history_entry")
                        .with_entity_id(id),
                )
            })
    }

    async fn last_action(
        &self,
        dataset: DatasetId,
        table: &str,
    ) -> RepositoryResult<Option<HistoryEntry>> {
        let state = self.state.read();
        Ok(state
            .history
            .iter()
            .filter(|e| e.dataset_id == dataset && e.table_name == table)
            .max_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)))
            .cloned())
    }
}
