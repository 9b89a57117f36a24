//! Find-and-replace over text columns.

use regex::Regex;

use crate::api::DatasetId;
use crate::db::models::InverseAction;
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::db::services::{fetch_column_values, require_typed_column};
use crate::models::{ColumnType, Value};
use crate::routes::transformations::{ReplaceMode, TransformOutcome, FIND_AND_REPLACE};

use super::TransformExecutor;

impl TransformExecutor {
    /// Rewrite matching cells of a text column.
    ///
    /// Substring mode replaces every occurrence inside a cell, full-value
    /// mode swaps cells equal to the needle, and regex mode applies
    /// `replace_all` with `$n` capture substitution. NULL cells never
    /// match. The inverse restores the prior cell values.
    pub async fn find_and_replace(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
        mode: ReplaceMode,
    ) -> RepositoryResult<TransformOutcome> {
        require_typed_column(self.repo(), dataset, table, column, ColumnType::Text)
            .await
            .map_err(|e| e.with_operation(FIND_AND_REPLACE))?;

        if let ReplaceMode::Substring { find, .. } = &mode {
            if find.is_empty() {
                return Err(RepositoryError::validation(
                    "Substring to find must not be empty",
                )
                .with_operation(FIND_AND_REPLACE));
            }
        }
        let regex = match &mode {
            ReplaceMode::Regex { pattern, .. } => Some(
                Regex::new(pattern)
                    .map_err(|e| RepositoryError::from(e).with_operation(FIND_AND_REPLACE))?,
            ),
            _ => None,
        };

        let cells = fetch_column_values(self.repo(), dataset, table, column).await?;
        let mut priors: Vec<(i64, Value)> = Vec::new();
        let mut assignments: Vec<(i64, Value)> = Vec::new();
        for (id, value) in &cells {
            let current = match value.as_text() {
                Some(text) => text,
                None => continue,
            };
            if let Some(new) = rewrite(current, &mode, regex.as_ref()) {
                if new != current {
                    priors.push((*id, value.clone()));
                    assignments.push((*id, Value::Text(new)));
                }
            }
        }

        if assignments.is_empty() {
            return Ok(TransformOutcome {
                description: format!("No cells in column '{}' matched", column),
                inverse_recorded: false,
            });
        }

        self.repo()
            .update_values(dataset, table, column, &assignments)
            .await?;

        let description = format!(
            "Replaced {} in {} cell(s) of column '{}'",
            mode.summary(),
            assignments.len(),
            column
        );
        self.record(
            dataset,
            table,
            description,
            Some(InverseAction::UpdateValues {
                column: column.to_string(),
                assignments: priors,
            }),
        )
        .await
    }
}

/// The rewritten cell, or `None` when the mode does not match it.
fn rewrite(current: &str, mode: &ReplaceMode, regex: Option<&Regex>) -> Option<String> {
    match mode {
        ReplaceMode::Substring { find, replace_with } => current
            .contains(find.as_str())
            .then(|| current.replace(find.as_str(), replace_with)),
        ReplaceMode::FullValue { from, to } => (current == from.as_str()).then(|| to.clone()),
        ReplaceMode::Regex { replace_with, .. } => match regex {
            Some(re) if re.is_match(current) => {
                Some(re.replace_all(current, replace_with.as_str()).into_owned())
            }
            _ => None,
        },
    }
}
