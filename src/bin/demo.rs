//! Workbench demo binary.
//!
//! Seeds an in-memory repository with a small messy dataset, runs a cleaning
//! session end to end (imputation, find-and-replace, outlier removal,
//! normalization, date extraction with undo, deduplication with review),
//! and prints the surviving table plus the history ledger as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin dcw-demo --features demo
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dcw_rust::api::DatasetId;
use dcw_rust::db::{FullRepository, RepositoryFactory};
use dcw_rust::models::{parse_timestamp, Column, ColumnType, TableQuery, Value};
use dcw_rust::routes::dedup::DedupConfig;
use dcw_rust::routes::transformations::{DateElement, ImputeMethod, ReplaceMode};
use dcw_rust::services::{ChartService, DedupEngine, HistoryService, TransformExecutor};

const TABLE: &str = "people";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(false)
        .init();

    info!("Starting the data cleaning demo");

    let repo = RepositoryFactory::create_local();
    let dataset = DatasetId::new(1);
    seed(&repo, dataset).await?;

    let executor = TransformExecutor::new(Arc::clone(&repo));
    let history = HistoryService::new(Arc::clone(&repo));
    let charts = ChartService::new(Arc::clone(&repo));
    let dedup = DedupEngine::new(Arc::clone(&repo));

    // Fill the missing age with the column mean.
    let outcome = executor
        .impute_missing_data(dataset, TABLE, "age", ImputeMethod::Mean)
        .await?;
    info!("{}", outcome.description);

    // Standardize the lowercase city spelling.
    let outcome = executor
        .find_and_replace(
            dataset,
            TABLE,
            "city",
            ReplaceMode::FullValue {
                from: "london".into(),
                to: "London".into(),
            },
        )
        .await?;
    info!("{}", outcome.description);

    // Drop the implausible age before normalizing.
    let outcome = executor
        .remove_outliers(dataset, TABLE, "age", 100.0, false)
        .await?;
    info!("{}", outcome.description);

    let outcome = executor.normalize_column(dataset, TABLE, "age").await?;
    info!("{}", outcome.description);

    // Extract the signup weekday, then change our mind.
    let outcome = executor
        .extract_date_part(dataset, TABLE, "signup", DateElement::Dow)
        .await?;
    info!("{}", outcome.description);
    let outcome = executor.undo_last(dataset, TABLE).await?;
    info!("{}", outcome.description);

    let chart = charts.categorical_breakdown(dataset, TABLE, "city").await?;
    info!("city breakdown: {:?} -> {:?}", chart.labels, chart.data);

    // Deduplicate on the name column, reviewing each group in turn.
    let config = DedupConfig::new("name", vec!["city".into()], vec!["name".into()]);
    let summary = dedup.start_run(dataset, TABLE, &config).await?;
    info!(
        "dedup: {} candidate pair(s), {} match pair(s), {} group(s)",
        summary.candidate_pairs, summary.match_pairs, summary.group_count
    );

    if summary.found_duplicates {
        while let Some(group) = dedup.next_pending_group_id(dataset, TABLE).await? {
            let cluster = dedup
                .get_cluster(dataset, TABLE, group, &TableQuery::all())
                .await?;
            let mut ids: Vec<i64> = cluster.rows.iter().map(|row| row.id).collect();
            ids.sort_unstable();
            let keep = ids.remove(0);
            info!("group {}: keeping row {}, marking {:?}", group, keep, ids);
            dedup.mark_for_deletion(dataset, TABLE, &ids).await?;
            dedup.resolve_group(dataset, TABLE, group).await?;
        }
        let removed = dedup.finish_run(dataset, TABLE).await?;
        info!("dedup removed {} duplicate row(s)", removed);
    } else {
        info!("no duplicates found");
    }

    let table = repo.get_table(dataset, TABLE, &TableQuery::all()).await?;
    println!("{}", serde_json::to_string_pretty(&table)?);

    let entries = history.get_all_actions(dataset, TABLE).await?;
    println!("{}", serde_json::to_string_pretty(&entries)?);

    Ok(())
}

async fn seed(repo: &Arc<dyn FullRepository>, dataset: DatasetId) -> anyhow::Result<()> {
    repo.create_table(
        dataset,
        TABLE,
        &[
            Column::new("name", ColumnType::Text),
            Column::new("age", ColumnType::Integer),
            Column::new("city", ColumnType::Text),
            Column::new("signup", ColumnType::Timestamp),
        ],
    )
    .await?;

    let columns: Vec<String> = ["name", "age", "city", "signup"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let rows = vec![
        vec![text("alice smith"), Value::Int(34), text("london"), ts("2021-03-01 09:30:00")?],
        vec![text("alice smyth"), Value::Null, text("London"), ts("2021-03-01 09:30:00")?],
        vec![text("bob jones"), Value::Int(29), text("Paris"), ts("2020-11-15 14:00:00")?],
        vec![text("carol white"), Value::Int(45), text("Berlin"), ts("2019-06-20 08:15:00")?],
        vec![text("dave green"), Value::Int(120), text("Madrid"), ts("2022-01-05 17:45:00")?],
        vec![text("erin black"), Value::Int(27), text("Rome"), Value::Null],
    ];
    let inserted = repo.insert_rows(dataset, TABLE, &columns, &rows).await?;
    info!("seeded '{}' with {} row(s)", TABLE, inserted);
    Ok(())
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn ts(raw: &str) -> anyhow::Result<Value> {
    parse_timestamp(raw)
        .map(Value::Timestamp)
        .ok_or_else(|| anyhow::anyhow!("invalid timestamp literal: {raw}"))
}
