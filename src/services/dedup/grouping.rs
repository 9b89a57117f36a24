//! Transitive grouping of match pairs.

use std::collections::{BTreeMap, BTreeSet};

/// Disjoint-set forest over dense indices, with path halving. Roots are
/// always the smallest index of their component, which keeps the final
/// group order independent of union order.
pub struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub fn new(len: usize) -> Self {
        UnionFind {
            parent: (0..len).collect(),
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }
}

/// Merge match pairs into maximal transitively-connected groups.
///
/// Each group is sorted ascending; groups are ordered by their smallest
/// member, so the result does not depend on pair order.
pub fn group_matches(pairs: &[(i64, i64)]) -> Vec<Vec<i64>> {
    let ids: BTreeSet<i64> = pairs.iter().flat_map(|&(a, b)| [a, b]).collect();
    let index: BTreeMap<i64, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    let ordered: Vec<i64> = ids.into_iter().collect();

    let mut forest = UnionFind::new(ordered.len());
    for (a, b) in pairs {
        forest.union(index[a], index[b]);
    }

    let mut groups: BTreeMap<usize, Vec<i64>> = BTreeMap::new();
    for (i, &id) in ordered.iter().enumerate() {
        groups.entry(forest.find(i)).or_default().push(id);
    }
    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitive_merge() {
        let pairs = [(0, 1), (1, 2), (3, 4), (2, 3)];
        let groups = group_matches(&pairs);
        assert_eq!(groups, vec![vec![0, 1, 2, 3, 4]]);
    }

    #[test]
    fn test_disjoint_groups_ordered_by_smallest_member() {
        let pairs = [(10, 12), (5, 7), (12, 11)];
        let groups = group_matches(&pairs);
        assert_eq!(groups, vec![vec![5, 7], vec![10, 11, 12]]);
    }

    #[test]
    fn test_pair_order_does_not_matter() {
        let forward = [(1, 2), (2, 3), (8, 9)];
        let backward = [(8, 9), (3, 2), (2, 1)];
        assert_eq!(group_matches(&forward), group_matches(&backward));
    }

    #[test]
    fn test_idempotent_on_maximal_groups() {
        let pairs = [(1, 2), (2, 3), (1, 3)];
        let groups = group_matches(&pairs);
        assert_eq!(groups, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_no_pairs() {
        assert!(group_matches(&[]).is_empty());
    }

    #[test]
    fn test_union_find_roots_are_smallest() {
        let mut forest = UnionFind::new(5);
        forest.union(4, 3);
        forest.union(3, 0);
        assert_eq!(forest.find(4), 0);
        assert_eq!(forest.find(3), 0);
        assert_eq!(forest.find(1), 1);
    }
}
