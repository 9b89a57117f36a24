use serde::{Deserialize, Serialize};

/// Chart-ready column profile: bin/category labels plus counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub data: Vec<i64>,
    /// The profiled column's name.
    pub label: String,
    /// Chart kind hint for the UI: "bar" or "pie".
    pub chart: String,
}

pub const CHART_BAR: &str = "bar";
pub const CHART_PIE: &str = "pie";

pub const GET_CHART_DATA: &str = "get_chart_data";
