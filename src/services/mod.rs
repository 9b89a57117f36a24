//! Service layer for the cleaning workflows.
//!
//! This module contains the engines that sit between callers and the
//! repository traits. Each service is constructed with its storage
//! dependency (`Arc<dyn FullRepository>`) and orchestrates repository
//! calls: transformations with undo, history reads, deduplication with
//! review, column statistics and chart profiles.

pub mod charts;

pub mod dedup;

pub mod history;

pub mod stats;

pub mod transform;

pub use charts::ChartService;
pub use dedup::{group_table_name, DedupEngine};
pub use history::HistoryService;
pub use transform::TransformExecutor;
