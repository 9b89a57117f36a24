//! Sorted-neighbourhood candidate generation.
//!
//! Instead of comparing all row pairs, rows are sorted by a blocking key
//! and only pairs within a sliding window of the sorted order are
//! compared, keeping the candidate count near-linear in row count.

use crate::models::Value;

/// Candidate row-id pairs: rows sorted by `(key, id)`, emitting every pair
/// whose sorted positions are less than `window` apart. Windows below 2
/// pair nothing.
pub fn candidate_pairs(keys: &[(i64, Value)], window: usize) -> Vec<(i64, i64)> {
    if window < 2 {
        return Vec::new();
    }
    let mut sorted: Vec<&(i64, Value)> = keys.iter().collect();
    sorted.sort_by(|x, y| x.1.sort_cmp(&y.1).then_with(|| x.0.cmp(&y.0)));

    let mut pairs = Vec::new();
    for (i, left) in sorted.iter().enumerate() {
        let hi = (i + window).min(sorted.len());
        for right in &sorted[i + 1..hi] {
            pairs.push((left.0, right.0));
        }
    }
    pairs
}
