//! Column statistics shared by imputation, normalization and profiling.

use crate::models::Value;

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median with even-count interpolation; 0.0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Population standard deviation; 0.0 for an empty slice.
pub fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Render with at most three decimals, trailing zeros trimmed. Used for
/// bin labels and action descriptions.
pub fn format_number(x: f64) -> String {
    let rendered = format!("{:.3}", x);
    let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Most frequent non-null value; ties go to the smaller value under the
/// engine's value ordering. `None` when every value is null.
pub fn most_common_value(values: &[Value]) -> Option<Value> {
    let mut sorted: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.sort_cmp(b));

    let mut best = sorted[0];
    let mut best_count = 0usize;
    let mut run_start = 0usize;
    for i in 0..=sorted.len() {
        let run_ended = i == sorted.len() || sorted[i] != sorted[run_start];
        if run_ended {
            let run_len = i - run_start;
            if run_len > best_count {
                best_count = run_len;
                best = sorted[run_start];
            }
            run_start = i;
        }
    }
    Some(best.clone())
}
