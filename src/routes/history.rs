use serde::{Deserialize, Serialize};

use crate::db::models::HistoryEntry;

/// One page of history entries plus the totals a table widget needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    /// All entries for the (dataset, table), ignoring any search filter.
    pub records_total: usize,
    /// Entries matching the search filter, before paging.
    pub records_filtered: usize,
}

pub const GET_ACTIONS: &str = "get_actions";
