//! Missing-value imputation.

use crate::api::DatasetId;
use crate::db::models::InverseAction;
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::db::services::{fetch_column_values, require_column, require_numeric_column};
use crate::models::{ColumnType, Value};
use crate::routes::transformations::{ImputeMethod, TransformOutcome, IMPUTE_MISSING_DATA};
use crate::services::stats;

use super::TransformExecutor;

impl TransformExecutor {
    /// Replace every NULL in the column with a fill value derived from the
    /// chosen method.
    ///
    /// Mean and median require a numeric column, round the fill to the
    /// nearest integer when the column holds integers, and fill 0 when the
    /// column has no present values. A constant fill must be coercible to
    /// the column type. The inverse re-nulls exactly the rows that were
    /// filled.
    ///
    /// # Arguments
    /// * `dataset` - Dataset the table belongs to
    /// * `table` - Table holding the column
    /// * `column` - Column to fill
    /// * `method` - How to derive the fill value
    ///
    /// # Returns
    /// The recorded outcome, or a no-op outcome when the column has no
    /// missing values (nothing is logged in that case).
    pub async fn impute_missing_data(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
        method: ImputeMethod,
    ) -> RepositoryResult<TransformOutcome> {
        let target = match method {
            ImputeMethod::Mean | ImputeMethod::Median => {
                require_numeric_column(self.repo(), dataset, table, column)
                    .await
                    .map_err(|e| e.with_operation(IMPUTE_MISSING_DATA))?
            }
            _ => require_column(self.repo(), dataset, table, column)
                .await
                .map_err(|e| e.with_operation(IMPUTE_MISSING_DATA))?,
        };

        let cells = fetch_column_values(self.repo(), dataset, table, column).await?;
        let missing: Vec<i64> = cells
            .iter()
            .filter(|(_, value)| value.is_null())
            .map(|(id, _)| *id)
            .collect();

        if missing.is_empty() {
            return Ok(TransformOutcome {
                description: format!("No missing values in column '{}'; nothing to impute", column),
                inverse_recorded: false,
            });
        }

        let fill = derive_fill(&cells, target.column_type, &method)?;

        let assignments: Vec<(i64, Value)> =
            missing.iter().map(|id| (*id, fill.clone())).collect();
        self.repo()
            .update_values(dataset, table, column, &assignments)
            .await?;

        let description = format!(
            "Imputed {} missing value(s) in column '{}' with {} ({})",
            missing.len(),
            column,
            method.label(),
            fill
        );
        self.record(
            dataset,
            table,
            description,
            Some(InverseAction::SetNull {
                column: column.to_string(),
                row_ids: missing,
            }),
        )
        .await
    }
}

/// Compute the fill value for the given method over the column's cells.
fn derive_fill(
    cells: &[(i64, Value)],
    column_type: ColumnType,
    method: &ImputeMethod,
) -> RepositoryResult<Value> {
    match method {
        ImputeMethod::Mean | ImputeMethod::Median => {
            // An all-null column averages to 0 and fills with it.
            let numbers: Vec<f64> = cells
                .iter()
                .filter_map(|(_, value)| value.as_f64())
                .collect();
            let raw = match method {
                ImputeMethod::Mean => stats::mean(&numbers),
                _ => stats::median(&numbers),
            };
            Ok(numeric_fill(raw, column_type))
        }
        ImputeMethod::MostCommon => {
            let values: Vec<Value> = cells.iter().map(|(_, value)| value.clone()).collect();
            stats::most_common_value(&values).ok_or_else(|| {
                RepositoryError::validation(
                    "Column has no present values to derive a fill from",
                )
                .with_operation(IMPUTE_MISSING_DATA)
            })
        }
        ImputeMethod::Constant(value) => {
            if value.is_null() {
                return Err(RepositoryError::validation(
                    "Constant fill value must not be NULL",
                )
                .with_operation(IMPUTE_MISSING_DATA));
            }
            value.coerce_to(column_type).ok_or_else(|| {
                RepositoryError::validation(format!(
                    "Constant fill value {} is not compatible with column type {}",
                    value, column_type
                ))
                .with_operation(IMPUTE_MISSING_DATA)
            })
        }
    }
}

/// Integer columns receive a rounded fill, real columns the exact figure.
fn numeric_fill(raw: f64, column_type: ColumnType) -> Value {
    match column_type {
        ColumnType::Integer => Value::Int(raw.round() as i64),
        _ => Value::Real(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_fill_rounds_for_integer_columns() {
        assert_eq!(numeric_fill(34.6, ColumnType::Integer), Value::Int(35));
        assert_eq!(numeric_fill(34.6, ColumnType::Real), Value::Real(34.6));
    }

    #[test]
    fn test_constant_fill_coerces_to_column_type() {
        let cells = vec![(1, Value::Null)];
        let fill = derive_fill(
            &cells,
            ColumnType::Real,
            &ImputeMethod::Constant(Value::Int(5)),
        )
        .unwrap();
        assert_eq!(fill, Value::Real(5.0));
    }

    #[test]
    fn test_constant_fill_rejects_incompatible_value() {
        let cells = vec![(1, Value::Null)];
        let result = derive_fill(
            &cells,
            ColumnType::Integer,
            &ImputeMethod::Constant(Value::Text("not a number".into())),
        );
        assert!(result.is_err());
    }
}
