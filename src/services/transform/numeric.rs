//! Numeric column operations: normalization, discretization, outlier
//! removal.

use crate::api::DatasetId;
use crate::db::models::InverseAction;
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::db::services::{fetch_column_values, fetch_table, require_numeric_column};
use crate::models::{ColumnType, Value};
use crate::routes::transformations::{
    DiscretizeSpec, TransformOutcome, DISCRETIZE_COLUMN, NORMALIZE_COLUMN, REMOVE_OUTLIERS,
};
use crate::services::stats::{self, format_number};

use super::TransformExecutor;

impl TransformExecutor {
    // ==================== Normalization ====================

    /// Z-score the column into a new `<column>_norm` real column.
    ///
    /// NULL cells stay NULL. When the column has zero variance the values
    /// are copied through unchanged rather than divided by zero. The
    /// inverse drops the derived column.
    pub async fn normalize_column(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
    ) -> RepositoryResult<TransformOutcome> {
        require_numeric_column(self.repo(), dataset, table, column)
            .await
            .map_err(|e| e.with_operation(NORMALIZE_COLUMN))?;
        let target = format!("{}_norm", column);
        self.reject_existing_column(dataset, table, &target, NORMALIZE_COLUMN)
            .await?;

        let cells = fetch_column_values(self.repo(), dataset, table, column).await?;
        let numbers: Vec<f64> = cells.iter().filter_map(|(_, v)| v.as_f64()).collect();
        let mean = stats::mean(&numbers);
        let std_dev = stats::population_stddev(&numbers);
        let assignments: Vec<(i64, Value)> = cells
            .iter()
            .filter_map(|(id, value)| value.as_f64().map(|x| (*id, x)))
            .map(|(id, x)| {
                let scaled = if std_dev == 0.0 { x } else { (x - mean) / std_dev };
                (id, Value::Real(scaled))
            })
            .collect();

        self.write_new_column(dataset, table, &target, ColumnType::Real, &assignments)
            .await?;

        let description = format!(
            "Normalized column '{}' into '{}' (mean {}, std dev {})",
            column,
            target,
            format_number(mean),
            format_number(std_dev)
        );
        self.record(
            dataset,
            table,
            description,
            Some(InverseAction::DropColumn {
                columns: vec![target],
            }),
        )
        .await
    }

    // ==================== Discretization ====================

    /// Bucket the column into labelled intervals written to a new text
    /// column named after the request (see [`DiscretizeSpec::target_column`]).
    ///
    /// Intervals are half-open `(lo, hi]`; values outside every manual
    /// interval map to NULL. The inverse drops the derived column.
    pub async fn discretize_column(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
        spec: DiscretizeSpec,
    ) -> RepositoryResult<TransformOutcome> {
        require_numeric_column(self.repo(), dataset, table, column)
            .await
            .map_err(|e| e.with_operation(DISCRETIZE_COLUMN))?;
        let target = spec.target_column(column);
        self.reject_existing_column(dataset, table, &target, DISCRETIZE_COLUMN)
            .await?;

        let cells = fetch_column_values(self.repo(), dataset, table, column).await?;
        let numbers: Vec<f64> = cells.iter().filter_map(|(_, v)| v.as_f64()).collect();

        let edges = match &spec {
            DiscretizeSpec::EqualWidth { bins } => {
                let (min, max) = numeric_bounds(&numbers, column, DISCRETIZE_COLUMN)?;
                validate_bin_count(*bins)?;
                equal_width_edges(min, max, *bins)
            }
            DiscretizeSpec::EqualFrequency { bins } => {
                validate_bin_count(*bins)?;
                equal_frequency_edges(&numbers, *bins, column)?
            }
            DiscretizeSpec::Manual { edges } => {
                validate_manual_edges(edges)?;
                edges.clone()
            }
        };
        let labels = interval_labels(&edges);

        let assignments: Vec<(i64, Value)> = cells
            .iter()
            .filter_map(|(id, value)| value.as_f64().map(|x| (*id, x)))
            .map(|(id, x)| {
                let label = match bin_for(x, &edges) {
                    Some(i) => Value::Text(labels[i].clone()),
                    None => Value::Null,
                };
                (id, label)
            })
            .collect();

        self.write_new_column(dataset, table, &target, ColumnType::Text, &assignments)
            .await?;

        let description = format!(
            "Discretized column '{}' into '{}' ({})",
            column,
            target,
            spec.summary()
        );
        self.record(
            dataset,
            table,
            description,
            Some(InverseAction::DropColumn {
                columns: vec![target],
            }),
        )
        .await
    }

    // ==================== Outlier Removal ====================

    /// Delete every row whose value in the column lies strictly beyond the
    /// threshold (`less_than` picks the side). NULL cells never match.
    ///
    /// The inverse re-inserts the deleted rows with their original ids.
    pub async fn remove_outliers(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
        threshold: f64,
        less_than: bool,
    ) -> RepositoryResult<TransformOutcome> {
        require_numeric_column(self.repo(), dataset, table, column)
            .await
            .map_err(|e| e.with_operation(REMOVE_OUTLIERS))?;

        let snapshot = fetch_table(self.repo(), dataset, table).await?;
        let idx = snapshot.column_index(column).ok_or_else(|| {
            RepositoryError::not_found(format!("Column '{}' not found", column))
                .with_operation(REMOVE_OUTLIERS)
        })?;

        let outliers: Vec<&crate::models::Row> = snapshot
            .rows
            .iter()
            .filter(|row| match row.values[idx].as_f64() {
                Some(x) if less_than => x < threshold,
                Some(x) => x > threshold,
                None => false,
            })
            .collect();

        if outliers.is_empty() {
            return Ok(TransformOutcome {
                description: format!("No outliers found in column '{}'", column),
                inverse_recorded: false,
            });
        }

        let row_ids: Vec<i64> = outliers.iter().map(|row| row.id).collect();
        let columns: Vec<String> = snapshot.columns.iter().map(|c| c.name.clone()).collect();
        let rows: Vec<Vec<Value>> = outliers.iter().map(|row| row.values.clone()).collect();

        self.repo()
            .delete_rows(dataset, table, &row_ids)
            .await?;

        let description = format!(
            "Removed {} outlier row(s) where column '{}' {} {}",
            row_ids.len(),
            column,
            if less_than { "<" } else { ">" },
            format_number(threshold)
        );
        self.record(
            dataset,
            table,
            description,
            Some(InverseAction::ReinsertRows { columns, rows }),
        )
        .await
    }
}

// ==================== Bin Construction ====================

fn validate_bin_count(bins: usize) -> RepositoryResult<()> {
    if bins == 0 {
        return Err(RepositoryError::validation("At least one bin is required")
            .with_operation(DISCRETIZE_COLUMN));
    }
    Ok(())
}

fn numeric_bounds(
    numbers: &[f64],
    column: &str,
    operation: &'static str,
) -> RepositoryResult<(f64, f64)> {
    if numbers.is_empty() {
        return Err(RepositoryError::validation(format!(
            "Column '{}' has no present values to discretize",
            column
        ))
        .with_operation(operation));
    }
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &x in numbers {
        min = min.min(x);
        max = max.max(x);
    }
    Ok((min, max))
}

/// Equal-width edges over `[min, max]`, with the lowest edge nudged below
/// the minimum so the smallest value falls inside the first `(lo, hi]` bin.
fn equal_width_edges(mut min: f64, mut max: f64, bins: usize) -> Vec<f64> {
    if min == max {
        min = if min == 0.0 { -0.001 } else { min - min.abs() * 0.001 };
        max = if max == 0.0 { 0.001 } else { max + max.abs() * 0.001 };
    }
    let width = (max - min) / bins as f64;
    let mut edges: Vec<f64> = (0..=bins).map(|k| min + width * k as f64).collect();
    edges[0] = min - (max - min) * 0.001;
    edges[bins] = max;
    edges
}

/// Equal-frequency edges: each of the first `bins - 1` buckets holds
/// `count / bins` values, the last absorbs the remainder. Interior lower
/// edges sit a hair below the value that opens the bucket, so the bucket
/// boundary value lands in the bucket above it.
fn equal_frequency_edges(
    numbers: &[f64],
    bins: usize,
    column: &str,
) -> RepositoryResult<Vec<f64>> {
    let mut sorted = numbers.to_vec();
    sorted.sort_by(f64::total_cmp);
    let size = sorted.len() / bins;
    if size == 0 {
        return Err(RepositoryError::validation(format!(
            "Column '{}' holds {} present value(s); too few for {} bins",
            column,
            sorted.len(),
            bins
        ))
        .with_operation(DISCRETIZE_COLUMN));
    }
    let mut edges: Vec<f64> = (0..bins).map(|k| lower_edge(sorted[k * size])).collect();
    edges.push(sorted[sorted.len() - 1]);
    Ok(edges)
}

/// A value strictly below `x`, scaled to its magnitude.
fn lower_edge(x: f64) -> f64 {
    if x == 0.0 {
        -0.001
    } else {
        x - x.abs() / 1000.0
    }
}

fn validate_manual_edges(edges: &[f64]) -> RepositoryResult<()> {
    if edges.len() < 2 {
        return Err(
            RepositoryError::validation("At least 2 interval edges are required")
                .with_operation(DISCRETIZE_COLUMN),
        );
    }
    if edges.iter().any(|edge| !edge.is_finite()) {
        return Err(RepositoryError::validation("Interval edges must be finite")
            .with_operation(DISCRETIZE_COLUMN));
    }
    if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(RepositoryError::validation(
            "Interval edges must be strictly ascending",
        )
        .with_operation(DISCRETIZE_COLUMN));
    }
    Ok(())
}

fn interval_labels(edges: &[f64]) -> Vec<String> {
    edges
        .windows(2)
        .map(|pair| format!("({}, {}]", format_number(pair[0]), format_number(pair[1])))
        .collect()
}

/// Index of the `(lo, hi]` interval containing `x`, if any.
fn bin_for(x: f64, edges: &[f64]) -> Option<usize> {
    edges
        .windows(2)
        .position(|pair| x > pair[0] && x <= pair[1])
}
