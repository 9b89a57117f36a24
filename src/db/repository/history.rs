//! History repository trait: the append-only action ledger.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{ActionId, DatasetId};
use crate::db::models::{HistoryEntry, HistoryQuery, NewHistoryEntry};

/// Repository trait for the transformation history ledger.
///
/// Entries are owned by a (dataset, table) pair, appended in order and never
/// mutated afterwards. Reads order by timestamp with the id as tie-break
/// unless the query asks otherwise.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append one entry; fails only on storage unavailability.
    ///
    /// # Returns
    /// * `Ok(ActionId)` - The assigned entry id
    async fn log_action(&self, entry: NewHistoryEntry) -> RepositoryResult<ActionId>;

    /// A page of entries for one (dataset, table), ordered and filtered per
    /// the query.
    async fn get_actions(
        &self,
        dataset: DatasetId,
        table: &str,
        query: &HistoryQuery,
    ) -> RepositoryResult<Vec<HistoryEntry>>;

    /// Every entry for one (dataset, table), unfiltered, in append order.
    /// Used to compute result-set totals.
    async fn get_all_actions(
        &self,
        dataset: DatasetId,
        table: &str,
    ) -> RepositoryResult<Vec<HistoryEntry>>;

    /// Fetch one entry by id.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If no such entry exists
    async fn get_action(&self, id: ActionId) -> RepositoryResult<HistoryEntry>;

    /// The most recent entry for one (dataset, table), if any.
    async fn last_action(
        &self,
        dataset: DatasetId,
        table: &str,
    ) -> RepositoryResult<Option<HistoryEntry>>;
}
