//! Near-duplicate detection and review.
//!
//! A run walks the pipeline: candidate pairs from a sorted neighbourhood
//! over the blocking key, per-pair similarity features, unsupervised
//! two-cluster match classification, union-find grouping, and a persisted
//! group table the review operations work against.
//!
//! The group table is named `_dedup_<table>` and holds one
//! `(id, group_id, delete)` row per grouped live row. It exists only
//! between [`DedupEngine::start_run`] and a finishing or discarding call;
//! review never touches live rows until [`DedupEngine::finish_run`].

mod classify;
mod grouping;
mod indexing;
mod similarity;

pub use classify::classify_matches;
pub use grouping::{group_matches, UnionFind};
pub use indexing::candidate_pairs;
pub use similarity::{
    exact_feature, jaro_winkler, levenshtein, levenshtein_similarity, metric_feature, score,
    trigram_similarity,
};

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::api::{DatasetId, GroupId};
use crate::db::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::db::services::{fetch_table, require_column};
use crate::models::{
    Column, ColumnType, Row, SortDirection, Table, TableQuery, Value, ID_COLUMN,
};
use crate::routes::dedup::{
    DedupConfig, DedupSummary, DISCARD_DEDUP, FINISH_DEDUP, GET_CLUSTER, MARK_FOR_DELETION,
    NEXT_PENDING_GROUP, REMAINING_CLUSTER_COUNT, RESOLVE_GROUP, START_DEDUP,
};

pub const GROUP_ID_COLUMN: &str = "group_id";
pub const DELETE_COLUMN: &str = "delete";

/// Name of the persisted group table for a live table.
pub fn group_table_name(table: &str) -> String {
    format!("_dedup_{}", table)
}

/// One group-table row, decoded.
struct GroupRow {
    row_id: i64,
    group_id: i64,
    delete: bool,
}

/// Runs deduplication and serves the review workflow for one repository.
pub struct DedupEngine {
    repo: Arc<dyn FullRepository>,
}

impl DedupEngine {
    pub fn new(repo: Arc<dyn FullRepository>) -> Self {
        DedupEngine { repo }
    }

    // ==================== Run Pipeline ====================

    /// Detect duplicate groups and persist them for review.
    ///
    /// Returns the terminal "no duplicates" summary when the window yields
    /// no candidate pairs or the classifier labels none a match; only when
    /// groups were persisted does `found_duplicates` come back true. A
    /// leftover group table from an abandoned run is dropped first, and a
    /// storage failure while persisting removes the partial table before
    /// the error propagates.
    pub async fn start_run(
        &self,
        dataset: DatasetId,
        table: &str,
        config: &DedupConfig,
    ) -> RepositoryResult<DedupSummary> {
        if config.fixed_columns.is_empty() && config.variable_columns.is_empty() {
            return Err(RepositoryError::validation(
                "At least one fixed or variable comparison column is required",
            )
            .with_operation(START_DEDUP));
        }
        require_column(self.repo.as_ref(), dataset, table, &config.key)
            .await
            .map_err(|e| e.with_operation(START_DEDUP))?;
        for column in config.fixed_columns.iter().chain(&config.variable_columns) {
            require_column(self.repo.as_ref(), dataset, table, column)
                .await
                .map_err(|e| e.with_operation(START_DEDUP))?;
        }

        let group_table = group_table_name(table);
        if self.repo.table_exists(dataset, &group_table).await? {
            log::warn!(
                "dropping leftover group table '{}' from an abandoned run",
                group_table
            );
            self.repo.delete_table(dataset, &group_table).await?;
        }

        let snapshot = fetch_table(self.repo.as_ref(), dataset, table).await?;
        let key_idx = column_index_of(&snapshot, &config.key)?;
        let fixed_idx = resolve_indices(&snapshot, &config.fixed_columns)?;
        let var_idx = resolve_indices(&snapshot, &config.variable_columns)?;

        let keys: Vec<(i64, Value)> = snapshot
            .rows
            .iter()
            .map(|row| (row.id, row.values[key_idx].clone()))
            .collect();
        let pairs = candidate_pairs(&keys, config.window);
        log::info!(
            "dedup on '{}': {} candidate pair(s) within window {}",
            table,
            pairs.len(),
            config.window
        );
        if pairs.is_empty() {
            return Ok(DedupSummary::empty(0));
        }

        let by_id: HashMap<i64, &Row> =
            snapshot.rows.iter().map(|row| (row.id, row)).collect();
        let vectors: Vec<Vec<f64>> = pairs
            .iter()
            .map(|(a, b)| pair_features(by_id[a], by_id[b], &fixed_idx, &var_idx, config))
            .collect();
        let labels = classify_matches(&vectors);
        let matched: Vec<(i64, i64)> = pairs
            .iter()
            .zip(&labels)
            .filter(|(_, is_match)| **is_match)
            .map(|(pair, _)| *pair)
            .collect();
        if matched.is_empty() {
            log::info!("dedup on '{}': classifier labelled no pair a match", table);
            return Ok(DedupSummary::empty(pairs.len()));
        }

        let groups = group_matches(&matched);
        self.persist_groups(dataset, &group_table, &groups).await?;
        log::info!(
            "dedup on '{}': {} group(s) from {} match pair(s)",
            table,
            groups.len(),
            matched.len()
        );
        Ok(DedupSummary {
            found_duplicates: true,
            group_count: groups.len(),
            candidate_pairs: pairs.len(),
            match_pairs: matched.len(),
        })
    }

    /// Create and fill `_dedup_<table>`; a failed fill drops the table.
    async fn persist_groups(
        &self,
        dataset: DatasetId,
        group_table: &str,
        groups: &[Vec<i64>],
    ) -> RepositoryResult<()> {
        let columns = vec![
            Column::new(GROUP_ID_COLUMN, ColumnType::Integer),
            Column::new(DELETE_COLUMN, ColumnType::Boolean),
        ];
        self.repo.create_table(dataset, group_table, &columns).await?;

        let insert_columns: Vec<String> = vec![
            ID_COLUMN.to_string(),
            GROUP_ID_COLUMN.to_string(),
            DELETE_COLUMN.to_string(),
        ];
        let mut rows = Vec::new();
        for (offset, members) in groups.iter().enumerate() {
            let group_id = (offset + 1) as i64;
            for &row_id in members {
                rows.push(vec![
                    Value::Int(row_id),
                    Value::Int(group_id),
                    Value::Bool(false),
                ]);
            }
        }
        if let Err(err) = self
            .repo
            .insert_rows(dataset, group_table, &insert_columns, &rows)
            .await
        {
            if let Err(cleanup) = self.repo.delete_table(dataset, group_table).await {
                log::error!(
                    "failed to drop partial group table '{}': {}",
                    group_table,
                    cleanup
                );
            }
            return Err(err);
        }
        Ok(())
    }

    // ==================== Review ====================

    /// The joined view of one group: live columns plus a trailing
    /// `group_id` column, restricted to the group's rows, then searched,
    /// ordered and paged per the query.
    pub async fn get_cluster(
        &self,
        dataset: DatasetId,
        table: &str,
        group_id: GroupId,
        query: &TableQuery,
    ) -> RepositoryResult<Table> {
        let entries = self.load_group_rows(dataset, table, GET_CLUSTER).await?;
        let members: BTreeSet<i64> = entries
            .iter()
            .filter(|entry| entry.group_id == group_id.value())
            .map(|entry| entry.row_id)
            .collect();
        if members.is_empty() {
            return Err(RepositoryError::not_found(format!(
                "Group {} not found in the current run",
                group_id
            ))
            .with_operation(GET_CLUSTER));
        }

        let live = fetch_table(self.repo.as_ref(), dataset, table).await?;
        let mut columns = live.columns.clone();
        columns.push(Column::new(GROUP_ID_COLUMN, ColumnType::Integer));
        let rows: Vec<Row> = live
            .rows
            .iter()
            .filter(|row| members.contains(&row.id))
            .map(|row| {
                let mut values = row.values.clone();
                values.push(Value::Int(group_id.value()));
                Row::new(row.id, values)
            })
            .collect();

        apply_query(
            Table {
                name: live.name.clone(),
                columns,
                rows,
            },
            query,
        )
    }

    /// Flag rows for deletion at finish. One-way: flags are never cleared
    /// within a run. All-or-nothing; an id outside the run is `NotFound`.
    pub async fn mark_for_deletion(
        &self,
        dataset: DatasetId,
        table: &str,
        row_ids: &[i64],
    ) -> RepositoryResult<usize> {
        let group_table = self
            .require_run(dataset, table, MARK_FOR_DELETION)
            .await?;
        if row_ids.is_empty() {
            return Ok(0);
        }
        let assignments: Vec<(i64, Value)> =
            row_ids.iter().map(|&id| (id, Value::Bool(true))).collect();
        let marked = self
            .repo
            .update_values(dataset, &group_table, DELETE_COLUMN, &assignments)
            .await?;
        log::debug!("marked {} row(s) for deletion in '{}'", marked, group_table);
        Ok(marked)
    }

    /// Smallest group id that still has an unmarked row, if any.
    pub async fn next_pending_group_id(
        &self,
        dataset: DatasetId,
        table: &str,
    ) -> RepositoryResult<Option<GroupId>> {
        let entries = self
            .load_group_rows(dataset, table, NEXT_PENDING_GROUP)
            .await?;
        Ok(pending_group_ids(&entries).into_iter().next().map(GroupId::new))
    }

    /// How many groups still have an unmarked row.
    pub async fn remaining_cluster_count(
        &self,
        dataset: DatasetId,
        table: &str,
    ) -> RepositoryResult<usize> {
        let entries = self
            .load_group_rows(dataset, table, REMAINING_CLUSTER_COUNT)
            .await?;
        Ok(pending_group_ids(&entries).len())
    }

    /// Take a group out of the pending set by removing its unmarked rows
    /// from the group table. Marked rows stay behind for `finish_run`;
    /// live rows are untouched. Returns how many rows were removed.
    pub async fn resolve_group(
        &self,
        dataset: DatasetId,
        table: &str,
        group_id: GroupId,
    ) -> RepositoryResult<usize> {
        let entries = self.load_group_rows(dataset, table, RESOLVE_GROUP).await?;
        let mut known = false;
        let mut unmarked: Vec<i64> = Vec::new();
        for entry in &entries {
            if entry.group_id != group_id.value() {
                continue;
            }
            known = true;
            if !entry.delete {
                unmarked.push(entry.row_id);
            }
        }
        if !known {
            return Err(RepositoryError::not_found(format!(
                "Group {} not found in the current run",
                group_id
            ))
            .with_operation(RESOLVE_GROUP));
        }
        if unmarked.is_empty() {
            return Ok(0);
        }
        let removed = self
            .repo
            .delete_rows(dataset, &group_table_name(table), &unmarked)
            .await?;
        log::debug!("resolved group {} ({} row(s) released)", group_id, removed);
        Ok(removed)
    }

    /// Delete every live row marked in the group table, then drop the
    /// group table. Returns how many live rows were deleted.
    pub async fn finish_run(
        &self,
        dataset: DatasetId,
        table: &str,
    ) -> RepositoryResult<usize> {
        let entries = self.load_group_rows(dataset, table, FINISH_DEDUP).await?;
        let doomed: Vec<i64> = entries
            .iter()
            .filter(|entry| entry.delete)
            .map(|entry| entry.row_id)
            .collect();
        let deleted = if doomed.is_empty() {
            0
        } else {
            self.repo.delete_rows(dataset, table, &doomed).await?
        };
        self.repo
            .delete_table(dataset, &group_table_name(table))
            .await?;
        log::info!(
            "dedup finished on '{}': removed {} duplicate row(s)",
            table,
            deleted
        );
        Ok(deleted)
    }

    /// Drop the group table without touching live rows.
    pub async fn discard_run(&self, dataset: DatasetId, table: &str) -> RepositoryResult<()> {
        let group_table = self.require_run(dataset, table, DISCARD_DEDUP).await?;
        self.repo.delete_table(dataset, &group_table).await?;
        log::info!("dedup run on '{}' discarded", table);
        Ok(())
    }

    // ==================== Group Table Access ====================

    async fn require_run(
        &self,
        dataset: DatasetId,
        table: &str,
        operation: &str,
    ) -> RepositoryResult<String> {
        let group_table = group_table_name(table);
        if self.repo.table_exists(dataset, &group_table).await? {
            Ok(group_table)
        } else {
            Err(RepositoryError::not_found(format!(
                "No active deduplication run for table '{}'",
                table
            ))
            .with_operation(operation))
        }
    }

    async fn load_group_rows(
        &self,
        dataset: DatasetId,
        table: &str,
        operation: &str,
    ) -> RepositoryResult<Vec<GroupRow>> {
        let group_table = self.require_run(dataset, table, operation).await?;
        let snapshot = fetch_table(self.repo.as_ref(), dataset, &group_table).await?;
        let gid_idx = snapshot.column_index(GROUP_ID_COLUMN).ok_or_else(|| {
            RepositoryError::internal(format!(
                "Group table '{}' is missing its '{}' column",
                group_table, GROUP_ID_COLUMN
            ))
        })?;
        let del_idx = snapshot.column_index(DELETE_COLUMN).ok_or_else(|| {
            RepositoryError::internal(format!(
                "Group table '{}' is missing its '{}' column",
                group_table, DELETE_COLUMN
            ))
        })?;

        let mut entries = Vec::with_capacity(snapshot.rows.len());
        for row in &snapshot.rows {
            let group_id = match &row.values[gid_idx] {
                Value::Int(g) => *g,
                _ => {
                    return Err(RepositoryError::internal(format!(
                        "Group table '{}' holds a non-integer group id",
                        group_table
                    )))
                }
            };
            entries.push(GroupRow {
                row_id: row.id,
                group_id,
                delete: matches!(row.values[del_idx], Value::Bool(true)),
            });
        }
        Ok(entries)
    }
}

/// Group ids that still have at least one unmarked row, ascending.
fn pending_group_ids(entries: &[GroupRow]) -> BTreeSet<i64> {
    entries
        .iter()
        .filter(|entry| !entry.delete)
        .map(|entry| entry.group_id)
        .collect()
}

fn column_index_of(table: &Table, column: &str) -> RepositoryResult<usize> {
    table.column_index(column).ok_or_else(|| {
        RepositoryError::not_found(format!("Column '{}' not found", column))
    })
}

fn resolve_indices(table: &Table, columns: &[String]) -> RepositoryResult<Vec<usize>> {
    columns
        .iter()
        .map(|column| column_index_of(table, column))
        .collect()
}

/// Similarity feature vector for one candidate pair: fixed columns first,
/// then variable columns, in configured order.
fn pair_features(
    a: &Row,
    b: &Row,
    fixed: &[usize],
    variable: &[usize],
    config: &DedupConfig,
) -> Vec<f64> {
    let mut features = Vec::with_capacity(fixed.len() + variable.len());
    for &idx in fixed {
        features.push(exact_feature(&a.values[idx], &b.values[idx]));
    }
    for &idx in variable {
        features.push(metric_feature(
            config.metric,
            config.threshold,
            &a.values[idx],
            &b.values[idx],
        ));
    }
    features
}

/// Search, order and page an in-memory view, mirroring the repository's
/// query semantics.
fn apply_query(mut view: Table, query: &TableQuery) -> RepositoryResult<Table> {
    if let Some(needle) = &query.search {
        let needle = needle.to_lowercase();
        view.rows.retain(|row| {
            row.values
                .iter()
                .any(|value| value.to_string().to_lowercase().contains(&needle))
        });
    }
    if let Some(ordering) = &query.order_by {
        let idx = view.column_index(&ordering.column).ok_or_else(|| {
            RepositoryError::not_found(format!(
                "Cannot order by unknown column '{}'",
                ordering.column
            ))
        })?;
        view.rows.sort_by(|a, b| {
            let cmp = a.values[idx]
                .sort_cmp(&b.values[idx])
                .then_with(|| a.id.cmp(&b.id));
            match ordering.direction {
                SortDirection::Asc => cmp,
                SortDirection::Desc => cmp.reverse(),
            }
        });
    }
    if let Some(offset) = query.offset {
        let offset = offset.min(view.rows.len());
        view.rows.drain(..offset);
    }
    if let Some(limit) = query.limit {
        view.rows.truncate(limit);
    }
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_table_name() {
        assert_eq!(group_table_name("addresses"), "_dedup_addresses");
    }

    #[test]
    fn test_pair_features_layout() {
        let a = Row::new(1, vec![Value::Int(1), Value::Int(7), Value::Text("ann".into())]);
        let b = Row::new(2, vec![Value::Int(2), Value::Int(7), Value::Text("anne".into())]);
        let config = DedupConfig::new("name", vec!["n".into()], vec!["name".into()]);
        let features = pair_features(&a, &b, &[1], &[2], &config);
        assert_eq!(features.len(), 2);
        assert_eq!(features[0], 1.0);
        assert_eq!(features[1], 1.0);
    }

    #[test]
    fn test_apply_query_orders_and_pages() {
        let view = Table {
            name: "t".into(),
            columns: vec![
                Column::new(ID_COLUMN, ColumnType::Integer),
                Column::new("score", ColumnType::Integer),
            ],
            rows: vec![
                Row::new(1, vec![Value::Int(1), Value::Int(30)]),
                Row::new(2, vec![Value::Int(2), Value::Int(10)]),
                Row::new(3, vec![Value::Int(3), Value::Int(20)]),
            ],
        };
        let query = TableQuery {
            offset: Some(1),
            limit: Some(1),
            order_by: Some(crate::models::ColumnOrdering::asc("score")),
            search: None,
        };
        let paged = apply_query(view, &query).unwrap();
        assert_eq!(paged.rows.len(), 1);
        assert_eq!(paged.rows[0].id, 3);
    }

    #[test]
    fn test_apply_query_unknown_order_column() {
        let view = Table {
            name: "t".into(),
            columns: vec![Column::new(ID_COLUMN, ColumnType::Integer)],
            rows: vec![],
        };
        let query = TableQuery::ordered_by(crate::models::ColumnOrdering::asc("ghost"));
        assert!(apply_query(view, &query).is_err());
    }
}
