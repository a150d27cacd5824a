//! On-demand statistics over resource collections.
//!
//! Everything here is computed from the rows handed in; nothing is cached.
//! Rankings order by count descending and break ties on the key ascending,
//! so equal counts always come back in the same order.

pub mod grouped;
pub mod portfolio;
pub mod reports;

use std::collections::{BTreeMap, BTreeSet};

/// Counts occurrences of each key.
pub fn tally<K, I>(keys: I) -> BTreeMap<K, usize>
where
    K: Ord,
    I: IntoIterator<Item = K>,
{
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Orders counted keys by count descending, then key ascending.
pub fn ranked<K: Ord>(counts: BTreeMap<K, usize>) -> Vec<(K, usize)> {
    let mut ranked: Vec<(K, usize)> = counts.into_iter().collect();
    // The map yields keys ascending and the sort is stable.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// The `n` highest-ranked keys.
pub fn top_n<K: Ord>(counts: BTreeMap<K, usize>, n: usize) -> Vec<(K, usize)> {
    let mut ranked = ranked(counts);
    ranked.truncate(n);
    ranked
}

pub fn distinct_count<K, I>(keys: I) -> usize
where
    K: Ord,
    I: IntoIterator<Item = K>,
{
    keys.into_iter().collect::<BTreeSet<K>>().len()
}

/// Percentage of `part` in `whole`, rounded to one decimal place.
/// `None` when `whole` is zero.
pub fn coverage(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        return None;
    }
    let pct = part as f64 / whole as f64 * 100.0;
    Some((pct * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranked_breaks_ties_on_key() {
        let counts = tally(["rust", "go", "rust", "python", "go", "c"]);
        assert_eq!(
            ranked(counts),
            vec![("go", 2), ("rust", 2), ("c", 1), ("python", 1)]
        );
    }

    #[test]
    fn test_top_n_truncates() {
        let counts = tally(["a", "b", "b", "c", "c", "c"]);
        assert_eq!(top_n(counts, 2), vec![("c", 3), ("b", 2)]);
        assert!(top_n(BTreeMap::<&str, usize>::new(), 5).is_empty());
    }

    #[test]
    fn test_distinct_count() {
        assert_eq!(distinct_count([1, 2, 2, 3, 3, 3]), 3);
        assert_eq!(distinct_count(Vec::<i64>::new()), 0);
    }

    #[test]
    fn test_coverage_rounds_to_one_decimal() {
        assert_eq!(coverage(1, 3), Some(33.3));
        assert_eq!(coverage(2, 3), Some(66.7));
        assert_eq!(coverage(3, 3), Some(100.0));
        assert_eq!(coverage(0, 0), None);
    }
}
