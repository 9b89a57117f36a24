//! Transformation executor: undoable cleaning operations on one column of
//! one table.
//!
//! Every operation validates against the live column metadata, computes its
//! new values, applies them through the repository as an all-or-nothing
//! mutation (compensating multi-call sequences on failure), and appends a
//! history entry carrying a human-readable description plus a typed
//! [`InverseAction`] where the operation supports undo.
//!
//! The executor owns no state beyond its repository handle; callers
//! construct one per storage backend and share it freely.

mod datetime;
mod encode;
mod impute;
mod inverse;
mod numeric;
mod replace;

use std::sync::Arc;

use crate::api::{ActionId, DatasetId};
use crate::db::models::{InverseAction, NewHistoryEntry};
use crate::db::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::models::{ColumnType, Value};
use crate::routes::transformations::{TransformOutcome, UNDO_ACTION};

/// Executes transformations and their inverses against one repository.
pub struct TransformExecutor {
    repo: Arc<dyn FullRepository>,
}

impl TransformExecutor {
    pub fn new(repo: Arc<dyn FullRepository>) -> Self {
        TransformExecutor { repo }
    }

    pub(crate) fn repo(&self) -> &dyn FullRepository {
        self.repo.as_ref()
    }

    /// Append the action to the history log and build the outcome DTO.
    async fn record(
        &self,
        dataset: DatasetId,
        table: &str,
        description: String,
        inverse: Option<InverseAction>,
    ) -> RepositoryResult<TransformOutcome> {
        let inverse_recorded = inverse.is_some();
        self.repo
            .log_action(NewHistoryEntry::new(dataset, table, &description, inverse))
            .await?;
        log::info!("dataset {} table '{}': {}", dataset, table, description);
        Ok(TransformOutcome {
            description,
            inverse_recorded,
        })
    }

    /// Derived columns must not clobber live ones.
    async fn reject_existing_column(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
        operation: &str,
    ) -> RepositoryResult<()> {
        let names = self.repo.get_column_names(dataset, table).await?;
        if names.iter().any(|name| name == column) {
            return Err(RepositoryError::validation(format!(
                "Column '{}' already exists in table '{}'",
                column, table
            ))
            .with_operation(operation));
        }
        Ok(())
    }

    /// Add a column and fill it, dropping the column again if the fill fails
    /// so the failure leaves no half-added column behind.
    async fn write_new_column(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
        column_type: ColumnType,
        assignments: &[(i64, Value)],
    ) -> RepositoryResult<()> {
        self.repo
            .insert_column(dataset, table, column, column_type)
            .await?;
        if assignments.is_empty() {
            return Ok(());
        }
        if let Err(err) = self
            .repo
            .update_values(dataset, table, column, assignments)
            .await
        {
            if let Err(cleanup) = self.repo.delete_column(dataset, table, column).await {
                log::error!(
                    "failed to drop column '{}' of table '{}' while compensating: {}",
                    column,
                    table,
                    cleanup
                );
            }
            return Err(err);
        }
        Ok(())
    }

    // ==================== Undo ====================

    /// Undo the most recent action recorded for the table.
    ///
    /// Re-executes the stored inverse and appends an `Undid: …` entry. Fails
    /// with `NotFound` when the table has no history and `ValidationError`
    /// when the latest entry carries no inverse.
    pub async fn undo_last(
        &self,
        dataset: DatasetId,
        table: &str,
    ) -> RepositoryResult<TransformOutcome> {
        let entry = self
            .repo
            .last_action(dataset, table)
            .await?
            .ok_or_else(|| {
                RepositoryError::not_found(format!(
                    "No actions recorded for table '{}' in dataset {}",
                    table, dataset
                ))
                .with_operation(UNDO_ACTION)
            })?;
        self.undo_action(dataset, entry).await
    }

    /// Undo a caller-chosen history entry.
    pub async fn undo_entry(
        &self,
        dataset: DatasetId,
        entry_id: ActionId,
    ) -> RepositoryResult<TransformOutcome> {
        let entry = self.repo.get_action(entry_id).await?;
        if entry.dataset_id != dataset {
            return Err(RepositoryError::not_found(format!(
                "History entry {} does not belong to dataset {}",
                entry_id, dataset
            ))
            .with_operation(UNDO_ACTION));
        }
        self.undo_action(dataset, entry).await
    }

    async fn undo_action(
        &self,
        dataset: DatasetId,
        entry: crate::db::models::HistoryEntry,
    ) -> RepositoryResult<TransformOutcome> {
        let inverse = entry.inverse.as_ref().ok_or_else(|| {
            RepositoryError::validation(format!(
                "Action {} ('{}') has no recorded inverse",
                entry.id, entry.description
            ))
            .with_operation(UNDO_ACTION)
        })?;

        self.apply_inverse(dataset, &entry.table_name, inverse)
            .await?;

        let description = format!("Undid: {}", entry.description);
        self.record(dataset, &entry.table_name, description, None)
            .await
    }
}
