//! High-level repository helpers shared by the engines.
//!
//! These functions wrap the repository traits with the lookups and
//! validations every engine repeats: fetch a whole table, insist a column
//! exists, insist it has a workable type, pull one column as (row id, value)
//! pairs. They work with any `TableRepository` implementation.

use crate::api::DatasetId;
use crate::db::repository::error::{ErrorContext, RepositoryError, RepositoryResult};
use crate::db::repository::TableRepository;
use crate::models::{Column, ColumnType, Table, TableQuery, Value};

/// Liveness probe passthrough.
pub async fn health_check(repo: &dyn TableRepository) -> RepositoryResult<bool> {
    repo.health_check().await
}

/// Fetch a whole table in natural row order.
pub async fn fetch_table(
    repo: &dyn TableRepository,
    dataset: DatasetId,
    table: &str,
) -> RepositoryResult<Table> {
    repo.get_table(dataset, table, &TableQuery::all()).await
}

/// Fail with `NotFound` unless the table exists.
pub async fn require_table(
    repo: &dyn TableRepository,
    dataset: DatasetId,
    table: &str,
) -> RepositoryResult<()> {
    if repo.table_exists(dataset, table).await? {
        Ok(())
    } else {
        Err(RepositoryError::not_found_with_context(
            format!("Table '{}' does not exist in dataset {}", table, dataset),
            ErrorContext::default()
                .with_entity("table")
                .with_entity_id(table),
        ))
    }
}

/// Look up a column, failing with `NotFound` if it is missing.
pub async fn require_column(
    repo: &dyn TableRepository,
    dataset: DatasetId,
    table: &str,
    column: &str,
) -> RepositoryResult<Column> {
    let columns = repo.get_column_names_and_types(dataset, table).await?;
    columns
        .into_iter()
        .find(|c| c.name == column)
        .ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Column '{}' does not exist in table '{}'", column, table),
                ErrorContext::default()
                    .with_entity("column")
                    .with_entity_id(column),
            )
        })
}

/// Look up a column and insist it is numeric (integer or double precision).
pub async fn require_numeric_column(
    repo: &dyn TableRepository,
    dataset: DatasetId,
    table: &str,
    column: &str,
) -> RepositoryResult<Column> {
    let col = require_column(repo, dataset, table, column).await?;
    if col.column_type.is_numeric() {
        Ok(col)
    } else {
        Err(RepositoryError::validation_with_context(
            format!(
                "Column '{}' of table '{}' is {}, expected a numeric type",
                column, table, col.column_type
            ),
            ErrorContext::default()
                .with_entity("column")
                .with_entity_id(column),
        ))
    }
}

/// Look up a column and insist it has exactly the given type.
pub async fn require_typed_column(
    repo: &dyn TableRepository,
    dataset: DatasetId,
    table: &str,
    column: &str,
    expected: ColumnType,
) -> RepositoryResult<Column> {
    let col = require_column(repo, dataset, table, column).await?;
    if col.column_type == expected {
        Ok(col)
    } else {
        Err(RepositoryError::validation_with_context(
            format!(
                "Column '{}' of table '{}' is {}, expected {}",
                column, table, col.column_type, expected
            ),
            ErrorContext::default()
                .with_entity("column")
                .with_entity_id(column),
        ))
    }
}

/// Pull one column as (row id, value) pairs in natural row order.
pub async fn fetch_column_values(
    repo: &dyn TableRepository,
    dataset: DatasetId,
    table: &str,
    column: &str,
) -> RepositoryResult<Vec<(i64, Value)>> {
    let data = fetch_table(repo, dataset, table).await?;
    let idx = data.column_index(column).ok_or_else(|| {
        RepositoryError::not_found_with_context(
            format!("Column '{}' does not exist in table '{}'", column, table),
            ErrorContext::default()
                .with_entity("column")
                .with_entity_id(column),
        )
    })?;
    Ok(data
        .rows
        .into_iter()
        .map(|mut row| (row.id, row.values.swap_remove(idx)))
        .collect())
}
