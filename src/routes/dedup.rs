use serde::{Deserialize, Serialize};

/// String-similarity metric used for "variable" columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    Levenshtein,
    JaroWinkler,
    Trigram,
}

impl Default for SimilarityMetric {
    fn default() -> Self {
        SimilarityMetric::JaroWinkler
    }
}

impl SimilarityMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityMetric::Levenshtein => "levenshtein",
            SimilarityMetric::JaroWinkler => "jaro_winkler",
            SimilarityMetric::Trigram => "trigram",
        }
    }
}

/// Parameters of a deduplication run.
///
/// `key` is the sort/blocking column; `fixed_columns` must match exactly and
/// `variable_columns` are compared with the string metric. Window and
/// threshold keep their conventional defaults (3 and 0.75) unless the caller
/// overrides them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupConfig {
    pub key: String,
    #[serde(default)]
    pub fixed_columns: Vec<String>,
    #[serde(default)]
    pub variable_columns: Vec<String>,
    #[serde(default)]
    pub metric: SimilarityMetric,
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_window() -> usize {
    3
}

fn default_threshold() -> f64 {
    0.75
}

impl DedupConfig {
    pub fn new(
        key: impl Into<String>,
        fixed_columns: Vec<String>,
        variable_columns: Vec<String>,
    ) -> Self {
        DedupConfig {
            key: key.into(),
            fixed_columns,
            variable_columns,
            metric: SimilarityMetric::default(),
            window: default_window(),
            threshold: default_threshold(),
        }
    }

    pub fn with_metric(mut self, metric: SimilarityMetric) -> Self {
        self.metric = metric;
        self
    }
}

/// What a dedup run found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupSummary {
    /// True iff at least one duplicate group was persisted.
    pub found_duplicates: bool,
    pub group_count: usize,
    /// Candidate pairs produced by the neighbourhood window.
    pub candidate_pairs: usize,
    /// Pairs the classifier labelled as matches.
    pub match_pairs: usize,
}

impl DedupSummary {
    /// The terminal "no duplicates" result.
    pub fn empty(candidate_pairs: usize) -> Self {
        DedupSummary {
            found_duplicates: false,
            group_count: 0,
            candidate_pairs,
            match_pairs: 0,
        }
    }
}

pub const START_DEDUP: &str = "start_dedup";
pub const GET_CLUSTER: &str = "get_cluster";
pub const MARK_FOR_DELETION: &str = "mark_for_deletion";
pub const NEXT_PENDING_GROUP: &str = "next_pending_group";
pub const REMAINING_CLUSTER_COUNT: &str = "remaining_cluster_count";
pub const RESOLVE_GROUP: &str = "resolve_group";
pub const FINISH_DEDUP: &str = "finish_dedup";
pub const DISCARD_DEDUP: &str = "discard_dedup";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: DedupConfig = serde_json::from_str(r#"{"key":"name"}"#).unwrap();
        assert_eq!(config.window, 3);
        assert_eq!(config.threshold, 0.75);
        assert_eq!(config.metric, SimilarityMetric::JaroWinkler);
        assert!(config.fixed_columns.is_empty());
    }

    #[test]
    fn test_metric_serde_names() {
        let m: SimilarityMetric = serde_json::from_str("\"jaro_winkler\"").unwrap();
        assert_eq!(m, SimilarityMetric::JaroWinkler);
        assert_eq!(
            serde_json::to_string(&SimilarityMetric::Trigram).unwrap(),
            "\"trigram\""
        );
    }

    #[test]
    fn test_empty_summary() {
        let summary = DedupSummary::empty(9);
        assert!(!summary.found_duplicates);
        assert_eq!(summary.candidate_pairs, 9);
        assert_eq!(summary.group_count, 0);
    }

    #[test]
    fn test_const_values() {
        assert_eq!(START_DEDUP, "start_dedup");
        assert_eq!(DISCARD_DEDUP, "discard_dedup");
    }
}
