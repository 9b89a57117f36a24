use serde::{Deserialize, Serialize};

use crate::models::Value;

/// Result of a transformation entry point: what was done, and whether an
/// inverse was recorded for undo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformOutcome {
    pub description: String,
    pub inverse_recorded: bool,
}

/// How missing values are filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "value", rename_all = "snake_case")]
pub enum ImputeMethod {
    Mean,
    Median,
    MostCommon,
    Constant(Value),
}

impl ImputeMethod {
    /// Human label used in action descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            ImputeMethod::Mean => "mean",
            ImputeMethod::Median => "median",
            ImputeMethod::MostCommon => "most common value",
            ImputeMethod::Constant(_) => "constant",
        }
    }
}

/// Discretization request: which algorithm and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscretizeSpec {
    EqualWidth { bins: usize },
    EqualFrequency { bins: usize },
    Manual { edges: Vec<f64> },
}

impl DiscretizeSpec {
    /// Name of the interval column the request creates.
    ///
    /// The "equal width" request runs the equal-width algorithm and writes
    /// `_intervals_eq_w_<N>`; "equal frequency" writes `_intervals_eq_f_<N>`;
    /// manual edges write `_intervals_custom`.
    pub fn target_column(&self, column: &str) -> String {
        match self {
            DiscretizeSpec::EqualWidth { bins } => {
                format!("{}_intervals_eq_w_{}", column, bins)
            }
            DiscretizeSpec::EqualFrequency { bins } => {
                format!("{}_intervals_eq_f_{}", column, bins)
            }
            DiscretizeSpec::Manual { .. } => format!("{}_intervals_custom", column),
        }
    }

    /// Short phrase used in action descriptions.
    pub fn summary(&self) -> String {
        match self {
            DiscretizeSpec::EqualWidth { bins } => format!("{} equal-width bins", bins),
            DiscretizeSpec::EqualFrequency { bins } => {
                format!("{} equal-frequency bins", bins)
            }
            DiscretizeSpec::Manual { edges } => {
                format!("{} manual bins", edges.len().saturating_sub(1))
            }
        }
    }
}

/// Date/time element extracted from a timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DateElement {
    /// Day of week, 0 = Sunday .. 6 = Saturday
    Dow,
    /// Month number, 1..12
    Month,
    Year,
    /// Calendar date as `YYYY-MM-DD`
    Date,
    /// Clock time as `HH:MM:SS`
    Time,
}

impl DateElement {
    pub const ALL: [DateElement; 5] = [
        DateElement::Dow,
        DateElement::Month,
        DateElement::Year,
        DateElement::Date,
        DateElement::Time,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateElement::Dow => "DOW",
            DateElement::Month => "MONTH",
            DateElement::Year => "YEAR",
            DateElement::Date => "DATE",
            DateElement::Time => "TIME",
        }
    }

    /// Numeric extracts get a double-precision column; date/time extracts
    /// get a text column.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DateElement::Dow | DateElement::Month | DateElement::Year)
    }
}

/// Find-and-replace request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReplaceMode {
    /// Literal substring replacement in every cell containing `find`.
    Substring { find: String, replace_with: String },
    /// Whole-cell equality replacement.
    FullValue { from: String, to: String },
    /// Regular-expression replacement (`$n` capture substitution).
    Regex { pattern: String, replace_with: String },
}

impl ReplaceMode {
    /// Short phrase used in action descriptions.
    pub fn summary(&self) -> String {
        match self {
            ReplaceMode::Substring { find, replace_with } => {
                format!("substring '{}' with '{}'", find, replace_with)
            }
            ReplaceMode::FullValue { from, to } => {
                format!("value '{}' with '{}'", from, to)
            }
            ReplaceMode::Regex { pattern, replace_with } => {
                format!("pattern '{}' with '{}'", pattern, replace_with)
            }
        }
    }
}

pub const IMPUTE_MISSING_DATA: &str = "impute_missing_data";
pub const NORMALIZE_COLUMN: &str = "normalize_column";
pub const DISCRETIZE_COLUMN: &str = "discretize_column";
pub const EXTRACT_DATE_PART: &str = "extract_date_part";
pub const FIND_AND_REPLACE: &str = "find_and_replace";
pub const REMOVE_OUTLIERS: &str = "remove_outliers";
pub const ONE_HOT_ENCODE: &str = "one_hot_encode";
pub const UNDO_ACTION: &str = "undo_action";
