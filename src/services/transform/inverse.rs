//! Interpreter for stored inverse actions.

use crate::api::DatasetId;
use crate::db::models::InverseAction;
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::routes::transformations::UNDO_ACTION;

use super::TransformExecutor;

impl TransformExecutor {
    /// Re-execute one stored inverse against the live table.
    ///
    /// The inverse was captured against the table as it stood right after
    /// the original action; if the table has since drifted (rows deleted,
    /// columns renamed, the same undo applied twice) the replay fails, and
    /// the failure is reported as a storage error regardless of which
    /// repository error surfaced it.
    pub(super) async fn apply_inverse(
        &self,
        dataset: DatasetId,
        table: &str,
        inverse: &InverseAction,
    ) -> RepositoryResult<()> {
        let result = match inverse {
            InverseAction::DropColumn { columns } => {
                self.drop_columns(dataset, table, columns).await
            }
            InverseAction::SetNull { column, row_ids } => {
                let assignments: Vec<(i64, crate::models::Value)> = row_ids
                    .iter()
                    .map(|id| (*id, crate::models::Value::Null))
                    .collect();
                self.repo()
                    .update_values(dataset, table, column, &assignments)
                    .await
                    .map(|_| ())
            }
            InverseAction::ReinsertRows { columns, rows } => self
                .repo()
                .insert_rows(dataset, table, columns, rows)
                .await
                .map(|_| ()),
            InverseAction::UpdateValues {
                column,
                assignments,
            } => self
                .repo()
                .update_values(dataset, table, column, assignments)
                .await
                .map(|_| ()),
        };

        result.map_err(|err| match err {
            storage @ RepositoryError::StorageError { .. } => storage,
            other => RepositoryError::storage(format!("Undo failed: {}", other))
                .with_operation(UNDO_ACTION),
        })
    }

    async fn drop_columns(
        &self,
        dataset: DatasetId,
        table: &str,
        columns: &[String],
    ) -> RepositoryResult<()> {
        for column in columns {
            self.repo().delete_column(dataset, table, column).await?;
        }
        Ok(())
    }
}
