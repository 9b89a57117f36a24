//! Table repository trait: the column/table accessor the engines run against.
//!
//! This is the only surface the transformation executor and the dedup engine
//! use to touch data. Every mutating method is all-or-nothing: it either
//! applies to every targeted row/column or leaves the table untouched.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::DatasetId;
use crate::models::{Column, ColumnType, Table, TableQuery, Value};

/// Repository trait for table and column access.
///
/// Tables live inside a dataset (one relational schema per dataset). The
/// first column of every table is `id`: integer, unique, auto-incrementing;
/// implementations own the id sequence and must keep `next id = max(id) + 1`
/// after any insert that carries explicit ids.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait TableRepository: Send + Sync {
    // ==================== Introspection ====================

    /// Liveness probe for the backing store.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Ordered column names of a table.
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Names in declaration order, `id` first
    /// * `Err(RepositoryError)` - `NotFound` for an unknown dataset/table
    async fn get_column_names(
        &self,
        dataset: DatasetId,
        table: &str,
    ) -> RepositoryResult<Vec<String>>;

    /// Ordered column names and declared types.
    async fn get_column_names_and_types(
        &self,
        dataset: DatasetId,
        table: &str,
    ) -> RepositoryResult<Vec<Column>>;

    /// Whether a table exists in the dataset.
    async fn table_exists(&self, dataset: DatasetId, table: &str) -> RepositoryResult<bool>;

    /// Number of rows in the table (ignoring any query filters).
    async fn row_count(&self, dataset: DatasetId, table: &str) -> RepositoryResult<usize>;

    /// Fetch rows with optional paging, ordering and search.
    ///
    /// # Arguments
    /// * `query` - Offset/limit window, sort column + direction, and a
    ///   case-insensitive substring search over every cell's display form
    ///
    /// # Returns
    /// * `Ok(Table)` - The matching page with full column metadata
    /// * `Err(RepositoryError)` - `NotFound` for unknown table or sort column
    async fn get_table(
        &self,
        dataset: DatasetId,
        table: &str,
        query: &TableQuery,
    ) -> RepositoryResult<Table>;

    // ==================== Row Operations ====================

    /// Insert one row; returns its id.
    ///
    /// `columns`/`values` are parallel. When `columns` includes `id` the
    /// given id is honored (and the sequence bumped past it); otherwise the
    /// next sequence value is assigned. Unlisted columns are set to null.
    async fn insert_row(
        &self,
        dataset: DatasetId,
        table: &str,
        columns: &[String],
        values: &[Value],
    ) -> RepositoryResult<i64>;

    /// Insert several rows in one atomic step.
    ///
    /// All rows share the `columns` layout. If any row fails validation the
    /// whole insert is rejected and nothing is written.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of rows inserted
    async fn insert_rows(
        &self,
        dataset: DatasetId,
        table: &str,
        columns: &[String],
        rows: &[Vec<Value>],
    ) -> RepositoryResult<usize>;

    /// Delete rows by id, atomically.
    ///
    /// Any unknown id fails the whole call with `NotFound` and nothing is
    /// deleted.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of rows deleted
    async fn delete_rows(
        &self,
        dataset: DatasetId,
        table: &str,
        row_ids: &[i64],
    ) -> RepositoryResult<usize>;

    /// Set one column's value for each (row id, value) pair, atomically.
    ///
    /// Values must match (or be null for) the column's declared type; an
    /// unknown row id or a type mismatch rejects the whole batch.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of cells written
    async fn update_values(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
        assignments: &[(i64, Value)],
    ) -> RepositoryResult<usize>;

    // ==================== Column Operations ====================

    /// Append a column, null-filled, to every existing row.
    ///
    /// Fails with `ValidationError` if the name is already taken.
    async fn insert_column(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
        column_type: ColumnType,
    ) -> RepositoryResult<()>;

    /// Drop a column and its cells. The `id` column cannot be dropped.
    async fn delete_column(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
    ) -> RepositoryResult<()>;

    /// Rename a column, preserving all row values.
    ///
    /// The `id` column cannot be renamed; the new name must be free.
    async fn rename_column(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
        new_name: &str,
    ) -> RepositoryResult<()>;

    /// Change a column's declared type, coercing every cell.
    ///
    /// If any cell cannot be coerced the call fails with `ValidationError`
    /// and no cell changes. The `id` column cannot be retyped.
    async fn update_column_type(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
        new_type: ColumnType,
    ) -> RepositoryResult<()>;

    // ==================== Table Operations ====================

    /// Create an empty table with the given non-id columns.
    ///
    /// The `id` column is prepended automatically. Creating a table whose
    /// name is taken fails with `ValidationError`; the dataset bucket is
    /// created on first use.
    async fn create_table(
        &self,
        dataset: DatasetId,
        table: &str,
        columns: &[Column],
    ) -> RepositoryResult<()>;

    /// Drop a table and all of its rows.
    async fn delete_table(&self, dataset: DatasetId, table: &str) -> RepositoryResult<()>;
}
