//! Unsupervised two-cluster match classification.

const MAX_ITERATIONS: usize = 100;

/// Label each feature vector as match (`true`) or distinct (`false`) with
/// a deterministic 2-means.
///
/// Centroids seed from the extreme vectors by coordinate sum, so runs are
/// reproducible without randomness; after convergence the cluster whose
/// centroid has the larger sum is the match class. When every vector is
/// identical there is nothing to split and each is labelled by whether its
/// mean feature reaches 0.5.
pub fn classify_matches(vectors: &[Vec<f64>]) -> Vec<bool> {
    if vectors.is_empty() {
        return Vec::new();
    }
    if vectors.windows(2).all(|w| w[0] == w[1]) {
        return vectors.iter().map(|v| mean(v) >= 0.5).collect();
    }

    let mut hi = 0usize;
    let mut lo = 0usize;
    for (i, v) in vectors.iter().enumerate() {
        if sum(v) > sum(&vectors[hi]) {
            hi = i;
        }
        if sum(v) < sum(&vectors[lo]) {
            lo = i;
        }
    }
    let mut match_centroid = vectors[hi].clone();
    let mut distinct_centroid = vectors[lo].clone();
    let mut assignment = vec![false; vectors.len()];

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (i, v) in vectors.iter().enumerate() {
            // Ties stay on the distinct side; only decisively closer
            // vectors join the match cluster.
            let to_match =
                distance_sq(v, &match_centroid) < distance_sq(v, &distinct_centroid);
            if to_match != assignment[i] {
                assignment[i] = to_match;
                changed = true;
            }
        }
        recompute(&mut match_centroid, vectors, &assignment, true);
        recompute(&mut distinct_centroid, vectors, &assignment, false);
        if !changed {
            break;
        }
    }

    if sum(&match_centroid) >= sum(&distinct_centroid) {
        assignment
    } else {
        assignment.into_iter().map(|m| !m).collect()
    }
}

fn sum(v: &[f64]) -> f64 {
    v.iter().sum()
}

fn mean(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    sum(v) / v.len() as f64
}

fn distance_sq(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Mean of the side's members; an empty side keeps its previous centroid.
fn recompute(centroid: &mut [f64], vectors: &[Vec<f64>], assignment: &[bool], side: bool) {
    let mut count = 0usize;
    let mut acc = vec![0.0; centroid.len()];
    for (v, &assigned) in vectors.iter().zip(assignment) {
        if assigned == side {
            for (slot, x) in acc.iter_mut().zip(v) {
                *slot += x;
            }
            count += 1;
        }
    }
    if count > 0 {
        for (slot, total) in centroid.iter_mut().zip(acc) {
            *slot = total / count as f64;
        }
    }
}
