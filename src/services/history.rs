//! Read-side service over the history ledger.

use std::sync::Arc;

use crate::api::{ActionId, DatasetId};
use crate::db::models::{HistoryEntry, HistoryQuery};
use crate::db::repository::{FullRepository, RepositoryResult};
use crate::routes::history::HistoryPage;

/// Serves history pages with the counters a table widget needs.
pub struct HistoryService {
    repo: Arc<dyn FullRepository>,
}

impl HistoryService {
    pub fn new(repo: Arc<dyn FullRepository>) -> Self {
        HistoryService { repo }
    }

    /// One page of a table's history.
    ///
    /// `records_total` counts every entry for the (dataset, table);
    /// `records_filtered` counts the entries matching the query's search
    /// before paging.
    pub async fn get_actions(
        &self,
        dataset: DatasetId,
        table: &str,
        query: &HistoryQuery,
    ) -> RepositoryResult<HistoryPage> {
        let entries = self.repo.get_actions(dataset, table, query).await?;
        let records_total = self
            .repo
            .get_actions(dataset, table, &HistoryQuery::default())
            .await?
            .len();
        let records_filtered = if query.search.is_none() {
            records_total
        } else {
            let mut unpaged = query.clone();
            unpaged.offset = None;
            unpaged.limit = None;
            self.repo.get_actions(dataset, table, &unpaged).await?.len()
        };
        Ok(HistoryPage {
            entries,
            records_total,
            records_filtered,
        })
    }

    /// Every entry recorded for the table, oldest first.
    pub async fn get_all_actions(
        &self,
        dataset: DatasetId,
        table: &str,
    ) -> RepositoryResult<Vec<HistoryEntry>> {
        self.repo.get_all_actions(dataset, table).await
    }

    pub async fn get_action(&self, entry_id: ActionId) -> RepositoryResult<HistoryEntry> {
        self.repo.get_action(entry_id).await
    }

    /// The most recent entry for a table, if any.
    pub async fn last_action(
        &self,
        dataset: DatasetId,
        table: &str,
    ) -> RepositoryResult<Option<HistoryEntry>> {
        self.repo.last_action(dataset, table).await
    }
}
