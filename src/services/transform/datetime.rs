//! Timestamp element extraction.

use chrono::{Datelike, NaiveDateTime};

use crate::api::DatasetId;
use crate::db::models::InverseAction;
use crate::db::repository::RepositoryResult;
use crate::db::services::{fetch_column_values, require_typed_column};
use crate::models::{ColumnType, Value};
use crate::routes::transformations::{DateElement, TransformOutcome, EXTRACT_DATE_PART};

use super::TransformExecutor;

impl TransformExecutor {
    /// Derive one element of a timestamp column into a new column named
    /// `<column> (<ELEMENT>)`.
    ///
    /// Day-of-week (0 = Sunday), month and year land in a real column;
    /// DATE (`YYYY-MM-DD`) and TIME (`HH:MM:SS`) land in a text column.
    /// NULL timestamps stay NULL. The inverse drops the derived column.
    pub async fn extract_date_part(
        &self,
        dataset: DatasetId,
        table: &str,
        column: &str,
        element: DateElement,
    ) -> RepositoryResult<TransformOutcome> {
        require_typed_column(self.repo(), dataset, table, column, ColumnType::Timestamp)
            .await
            .map_err(|e| e.with_operation(EXTRACT_DATE_PART))?;
        let target = format!("{} ({})", column, element.as_str());
        self.reject_existing_column(dataset, table, &target, EXTRACT_DATE_PART)
            .await?;

        let cells = fetch_column_values(self.repo(), dataset, table, column).await?;
        let assignments: Vec<(i64, Value)> = cells
            .iter()
            .filter_map(|(id, value)| {
                value
                    .as_timestamp()
                    .map(|ts| (*id, extract_element(ts, element)))
            })
            .collect();

        let column_type = if element.is_numeric() {
            ColumnType::Real
        } else {
            ColumnType::Text
        };
        self.write_new_column(dataset, table, &target, column_type, &assignments)
            .await?;

        let description = format!(
            "Extracted {} from column '{}' into '{}'",
            element.as_str(),
            column,
            target
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
}

fn extract_element(ts: NaiveDateTime, element: DateElement) -> Value {
    match element {
        DateElement::Dow => Value::Real(ts.weekday().num_days_from_sunday() as f64),
        DateElement::Month => Value::Real(ts.month() as f64),
        DateElement::Year => Value::Real(ts.year() as f64),
        DateElement::Date => Value::Text(ts.format("%Y-%m-%d").to_string()),
        DateElement::Time => Value::Text(ts.format("%H:%M:%S").to_string()),
    }
}
