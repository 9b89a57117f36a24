//! Chart-ready column profiles. Read-only; never logged to history.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::DatasetId;
use crate::db::repository::{FullRepository, RepositoryResult};
use crate::db::services::{fetch_column_values, require_column, require_numeric_column};
use crate::routes::charts::{ChartData, CHART_BAR, CHART_PIE, GET_CHART_DATA};
use crate::services::stats::format_number;

const HISTOGRAM_BINS: usize = 10;

/// Profiles columns for display.
pub struct ChartService {
    repo: Arc<dyn FullRepository>,
}

impl ChartService {
    pub fn new(repo: Arc<dyn FullRepository>) -> Self {
        ChartService { repo }
    }

    /// Ten-bin equal-width histogram of a numeric column, as a bar chart.
    ///
    /// NULL cells are skipped; a column with no present values yields an
    /// empty chart, and a single-valued column collapses to one bin.
    pub async fn numeric_histogram(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
    ) -> RepositoryResult<ChartData> {
        require_numeric_column(self.repo.as_ref(), dataset, table, column)
            .await
            .map_err(|e| e.with_operation(GET_CHART_DATA))?;
        let cells = fetch_column_values(self.repo.as_ref(), dataset, table, column).await?;
        let numbers: Vec<f64> = cells.iter().filter_map(|(_, v)| v.as_f64()).collect();

        if numbers.is_empty() {
            return Ok(ChartData {
                labels: Vec::new(),
                data: Vec::new(),
                label: column.to_string(),
                chart: CHART_BAR.to_string(),
            });
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &x in &numbers {
            min = min.min(x);
            max = max.max(x);
        }
        if min == max {
            return Ok(ChartData {
                labels: vec![format_number(min)],
                data: vec![numbers.len() as i64],
                label: column.to_string(),
                chart: CHART_BAR.to_string(),
            });
        }

        let width = (max - min) / HISTOGRAM_BINS as f64;
        let mut counts = vec![0i64; HISTOGRAM_BINS];
        for &x in &numbers {
            let mut bin = ((x - min) / width) as usize;
            if bin >= HISTOGRAM_BINS {
                bin = HISTOGRAM_BINS - 1;
            }
            counts[bin] += 1;
        }
        let labels: Vec<String> = (0..HISTOGRAM_BINS)
            .map(|k| {
                format!(
                    "({}, {}]",
                    format_number(min + width * k as f64),
                    format_number(min + width * (k + 1) as f64)
                )
            })
            .collect();

        Ok(ChartData {
            labels,
            data: counts,
            label: column.to_string(),
            chart: CHART_BAR.to_string(),
        })
    }

    /// Distinct-value counts of any column, largest first, as a pie chart.
    /// NULL cells count under the label `NULL`.
    pub async fn categorical_breakdown(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
    ) -> RepositoryResult<ChartData> {
        require_column(self.repo.as_ref(), dataset, table, column)
            .await
            .map_err(|e| e.with_operation(GET_CHART_DATA))?;
        let cells = fetch_column_values(self.repo.as_ref(), dataset, table, column).await?;

        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for (_, value) in &cells {
            let key = if value.is_null() {
                "NULL".to_string()
            } else {
                value.to_string()
            };
            *counts.entry(key).or_insert(0) += 1;
        }

        let mut ranked: Vec<(String, i64)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let (labels, data): (Vec<String>, Vec<i64>) = ranked.into_iter().unzip();
        Ok(ChartData {
            labels,
            data,
            label: column.to_string(),
            chart: CHART_PIE.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::{RepositoryError, TableRepository};
    use crate::models::{Column, ColumnType, Value};

    async fn seeded_service() -> (ChartService, DatasetId) {
        let repo = Arc::new(LocalRepository::new());
        let dataset = DatasetId::new(1);
        repo.create_table(
            dataset,
            "people",
            &[
                Column::new("city", ColumnType::Text),
                Column::new("age", ColumnType::Real),
            ],
        )
        .await
        .unwrap();
        let cols = ["city".to_string(), "age".to_string()];
        for (city, age) in [
            (Value::Text("london".into()), Value::Real(0.0)),
            (Value::Text("london".into()), Value::Real(5.0)),
            (Value::Null, Value::Real(10.0)),
        ] {
            repo.insert_row(dataset, "people", &cols, &[city, age])
                .await
                .unwrap();
        }
        (ChartService::new(repo), dataset)
    }

    #[tokio::test]
    async fn test_numeric_histogram_bins_and_edge_clamp() {
        let (charts, dataset) = seeded_service().await;
        let chart = charts
            .numeric_histogram(dataset, "people", "age")
            .await
            .unwrap();
        assert_eq!(chart.chart, CHART_BAR);
        assert_eq!(chart.labels.len(), HISTOGRAM_BINS);
        assert_eq!(chart.labels[0], "(0, 1]");
        // 0 lands in the first bin, 5 in the sixth, 10 clamps into the last
        assert_eq!(chart.data[0], 1);
        assert_eq!(chart.data[5], 1);
        assert_eq!(chart.data[9], 1);
        assert_eq!(chart.data.iter().sum::<i64>(), 3);
    }

    #[tokio::test]
    async fn test_numeric_histogram_single_value_collapses() {
        let (charts, dataset) = seeded_service().await;
        let assignments: Vec<(i64, Value)> =
            (1..=3).map(|id| (id, Value::Real(7.5))).collect();
        charts
            .repo
            .update_values(dataset, "people", "age", &assignments)
            .await
            .unwrap();
        let chart = charts
            .numeric_histogram(dataset, "people", "age")
            .await
            .unwrap();
        assert_eq!(chart.labels, vec!["7.5"]);
        assert_eq!(chart.data, vec![3]);
    }

    #[tokio::test]
    async fn test_numeric_histogram_all_null_is_empty() {
        let (charts, dataset) = seeded_service().await;
        let assignments: Vec<(i64, Value)> = (1..=3).map(|id| (id, Value::Null)).collect();
        charts
            .repo
            .update_values(dataset, "people", "age", &assignments)
            .await
            .unwrap();
        let chart = charts
            .numeric_histogram(dataset, "people", "age")
            .await
            .unwrap();
        assert!(chart.labels.is_empty());
        assert!(chart.data.is_empty());
    }

    #[tokio::test]
    async fn test_numeric_histogram_rejects_text_column() {
        let (charts, dataset) = seeded_service().await;
        let err = charts
            .numeric_histogram(dataset, "people", "city")
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert_eq!(err.context().operation.as_deref(), Some(GET_CHART_DATA));
    }

    #[tokio::test]
    async fn test_categorical_breakdown_ranks_and_labels_nulls() {
        let (charts, dataset) = seeded_service().await;
        let chart = charts
            .categorical_breakdown(dataset, "people", "city")
            .await
            .unwrap();
        assert_eq!(chart.chart, CHART_PIE);
        assert_eq!(chart.labels, vec!["london", "NULL"]);
        assert_eq!(chart.data, vec![2, 1]);
    }
}
