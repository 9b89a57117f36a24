//! String-similarity metrics and per-column pair features.
//!
//! All metrics score in `[0, 1]` with 1.0 meaning identical. Variable
//! columns compare by the display form of their cells.

use std::collections::BTreeSet;

use crate::models::Value;
use crate::routes::dedup::SimilarityMetric;

/// Edit distance between two strings, by character.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Levenshtein distance rescaled to a similarity: `1 - d / max_len`.
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Jaro-Winkler similarity (prefix bonus capped at 4, scaling 0.1).
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let jaro = jaro(&a, &b);
    let prefix = a
        .iter()
        .zip(b.iter())
        .take(4)
        .take_while(|(x, y)| x == y)
        .count();
    jaro + prefix as f64 * 0.1 * (1.0 - jaro)
}

fn jaro(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let window = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;
    for (i, ca) in a.iter().enumerate() {
        let lo = i.saturating_sub(window);
        let hi = (i + window + 1).min(b.len());
        for j in lo..hi {
            if !b_matched[j] && b[j] == *ca {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }
    if matches == 0 {
        return 0.0;
    }
    let mut transpositions = 0usize;
    let mut j = 0usize;
    for (i, ca) in a.iter().enumerate() {
        if !a_matched[i] {
            continue;
        }
        while !b_matched[j] {
            j += 1;
        }
        if *ca != b[j] {
            transpositions += 1;
        }
        j += 1;
    }
    let m = matches as f64;
    let t = transpositions as f64 / 2.0;
    (m / a.len() as f64 + m / b.len() as f64 + (m - t) / m) / 3.0
}

/// Jaccard similarity over padded, lowercased character trigrams.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let ta = trigrams(a);
    let tb = trigrams(b);
    if ta.is_empty() && tb.is_empty() {
        return 1.0;
    }
    let shared = ta.intersection(&tb).count();
    let total = ta.union(&tb).count();
    shared as f64 / total as f64
}

fn trigrams(s: &str) -> BTreeSet<String> {
    if s.is_empty() {
        return BTreeSet::new();
    }
    let padded: Vec<char> = format!("  {} ", s.to_lowercase()).chars().collect();
    padded.windows(3).map(|w| w.iter().collect()).collect()
}

/// Score two strings with the chosen metric.
pub fn score(metric: SimilarityMetric, a: &str, b: &str) -> f64 {
    match metric {
        SimilarityMetric::Levenshtein => levenshtein_similarity(a, b),
        SimilarityMetric::JaroWinkler => jaro_winkler(a, b),
        SimilarityMetric::Trigram => trigram_similarity(a, b),
    }
}

// ==================== Pair Features ====================

/// Fixed-column feature: 1.0 on exact equality (two NULLs are equal).
pub fn exact_feature(a: &Value, b: &Value) -> f64 {
    if a.sort_cmp(b) == std::cmp::Ordering::Equal {
        1.0
    } else {
        0.0
    }
}

/// Variable-column feature: 1.0 when the metric scores the display strings
/// strictly above the threshold. Two NULLs agree; one NULL never matches.
pub fn metric_feature(metric: SimilarityMetric, threshold: f64, a: &Value, b: &Value) -> f64 {
    match (a.is_null(), b.is_null()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => {
            if score(metric, &a.to_string(), &b.to_string()) > threshold {
                1.0
            } else {
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn test_levenshtein_similarity_scale() {
        assert_eq!(levenshtein_similarity("", ""), 1.0);
        assert_eq!(levenshtein_similarity("abcd", "abcd"), 1.0);
        assert_eq!(levenshtein_similarity("abcd", "wxyz"), 0.0);
    }

    #[test]
    fn test_jaro_winkler_known_value() {
        let s = jaro_winkler("martha", "marhta");
        assert!((s - 0.9611).abs() < 1e-3, "got {s}");
        assert_eq!(jaro_winkler("same", "same"), 1.0);
        assert_eq!(jaro_winkler("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_trigram_similarity() {
        assert_eq!(trigram_similarity("london", "london"), 1.0);
        assert_eq!(trigram_similarity("", ""), 1.0);
        let s = trigram_similarity("london", "londom");
        assert!(s > 0.4 && s < 1.0, "got {s}");
        assert_eq!(trigram_similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_exact_feature_null_semantics() {
        assert_eq!(exact_feature(&Value::Null, &Value::Null), 1.0);
        assert_eq!(exact_feature(&Value::Null, &Value::Int(1)), 0.0);
        assert_eq!(exact_feature(&Value::Int(3), &Value::Real(3.0)), 1.0);
        assert_eq!(
            exact_feature(&Value::Text("a".into()), &Value::Text("b".into())),
            0.0
        );
    }

    #[test]
    fn test_metric_feature_binarizes() {
        let near = Value::Text("jonathan".into());
        let near2 = Value::Text("jonathon".into());
        let far = Value::Text("elizabeth".into());
        assert_eq!(
            metric_feature(SimilarityMetric::JaroWinkler, 0.75, &near, &near2),
            1.0
        );
        assert_eq!(
            metric_feature(SimilarityMetric::JaroWinkler, 0.75, &near, &far),
            0.0
        );
        assert_eq!(
            metric_feature(SimilarityMetric::Levenshtein, 0.75, &Value::Null, &Value::Null),
            1.0
        );
    }

    // ==================== Property Tests ====================

    use proptest::prelude::*;

    const METRICS: [SimilarityMetric; 3] = [
        SimilarityMetric::Levenshtein,
        SimilarityMetric::JaroWinkler,
        SimilarityMetric::Trigram,
    ];

    proptest! {
        #[test]
        fn prop_levenshtein_is_symmetric(a in "[a-z]{0,12}", b in "[a-z]{0,12}") {
            prop_assert_eq!(levenshtein(&a, &b), levenshtein(&b, &a));
        }

        #[test]
        fn prop_scores_stay_in_unit_interval(a in "[a-z ]{0,12}", b in "[a-z ]{0,12}") {
            for metric in METRICS {
                let s = score(metric, &a, &b);
                prop_assert!((0.0..=1.0).contains(&s), "{:?} scored {}", metric, s);
            }
        }

        #[test]
        fn prop_identical_strings_score_one(s in "[a-z ]{0,12}") {
            for metric in METRICS {
                prop_assert_eq!(score(metric, &s, &s), 1.0);
            }
        }

        #[test]
        fn prop_metric_feature_is_binary(
            a in "[a-z]{0,10}",
            b in "[a-z]{0,10}",
            threshold in 0.0f64..1.0,
        ) {
            let feature = metric_feature(
                SimilarityMetric::JaroWinkler,
                threshold,
                &Value::Text(a),
                &Value::Text(b),
            );
            prop_assert!(feature == 0.0 || feature == 1.0);
        }
    }
}
