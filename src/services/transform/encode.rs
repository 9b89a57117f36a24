//! One-hot encoding of categorical text columns.

use std::collections::BTreeSet;

use crate::api::DatasetId;
use crate::db::models::InverseAction;
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::db::services::{fetch_column_values, require_typed_column};
use crate::models::{ColumnType, Value};
use crate::routes::transformations::{TransformOutcome, ONE_HOT_ENCODE};

use super::TransformExecutor;

impl TransformExecutor {
    /// Add one boolean flag column per distinct value of a text column,
    /// each named after the value it flags, in ascending value order.
    ///
    /// Rows with a NULL source cell are false in every flag column. Fails
    /// before touching the table when any flag name collides with an
    /// existing column; a failure partway through removes the flags
    /// already added. The inverse drops all flag columns.
    pub async fn one_hot_encode(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
    ) -> RepositoryResult<TransformOutcome> {
        require_typed_column(self.repo(), dataset, table, column, ColumnType::Text)
            .await
            .map_err(|e| e.with_operation(ONE_HOT_ENCODE))?;

        let cells = fetch_column_values(self.repo(), dataset, table, column).await?;
        let mut categories: BTreeSet<String> = BTreeSet::new();
        for (_, value) in &cells {
            if let Some(text) = value.as_text() {
                categories.insert(text.to_string());
            }
        }
        if categories.is_empty() {
            return Err(RepositoryError::validation(format!(
                "Column '{}' has no present values to encode",
                column
            ))
            .with_operation(ONE_HOT_ENCODE));
        }

        let existing = self.repo().get_column_names(dataset, table).await?;
        for category in &categories {
            if existing.iter().any(|name| name == category) {
                return Err(RepositoryError::validation(format!(
                    "Flag column '{}' would collide with an existing column of table '{}'",
                    category, table
                ))
                .with_operation(ONE_HOT_ENCODE));
            }
        }

        let mut created: Vec<String> = Vec::new();
        for category in &categories {
            let assignments: Vec<(i64, Value)> = cells
                .iter()
                .map(|(id, value)| {
                    (*id, Value::Bool(value.as_text() == Some(category.as_str())))
                })
                .collect();
            if let Err(err) = self
                .write_new_column(dataset, table, category, ColumnType::Boolean, &assignments)
                .await
            {
                for flag in &created {
                    if let Err(cleanup) = self.repo().delete_column(dataset, table, flag).await {
                        log::error!(
                            "failed to drop flag column '{}' of table '{}' while compensating: {}",
                            flag,
                            table,
                            cleanup
                        );
                    }
                }
                return Err(err);
            }
            created.push(category.clone());
        }

        let description = format!(
            "One-hot encoded column '{}' into {} flag column(s)",
            column,
            created.len()
        );
        self.record(
            dataset,
            table,
            description,
            Some(InverseAction::DropColumn { columns: created }),
        )
        .await
    }
}
