use indexmap::IndexMap;

use crate::types::{ByteCount, CategoryId, Weight};

/// Share of the achieved mixture contributed by one category.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryShare {
    /// Category name.
    pub category: CategoryId,
    /// Bytes selected for the category.
    pub bytes: ByteCount,
    /// Fraction of all achieved bytes, `0.0` when nothing was selected.
    pub share: f64,
}

/// Compute per-category shares of the achieved bytes, in recorded order.
pub fn category_shares(byte_count: &IndexMap<CategoryId, ByteCount>) -> Vec<CategoryShare> {
    let total: ByteCount = byte_count.values().sum();
    byte_count
        .iter()
        .map(|(category, bytes)| CategoryShare {
            category: category.clone(),
            bytes: *bytes,
            share: if total == 0 {
                0.0
            } else {
                *bytes as f64 / total as f64
            },
        })
        .collect()
}

/// Largest absolute gap between a sampled weight and the achieved share.
///
/// Categories missing from `byte_count` count as a zero share.
pub fn max_share_deviation(
    weights: &IndexMap<CategoryId, Weight>,
    byte_count: &IndexMap<CategoryId, ByteCount>,
) -> f64 {
    let shares = category_shares(byte_count);
    weights
        .iter()
        .map(|(category, weight)| {
            let achieved = shares
                .iter()
                .find(|share| &share.category == category)
                .map(|share| share.share)
                .unwrap_or(0.0);
            (weight - achieved).abs()
        })
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shares_follow_recorded_order() {
        let counts = IndexMap::from([
            ("web".to_string(), 30),
            ("code".to_string(), 10),
            ("books".to_string(), 60),
        ]);
        let shares = category_shares(&counts);
        let names: Vec<_> = shares.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, vec!["web", "code", "books"]);
        assert!((shares[2].share - 0.6).abs() < 1e-12);
        assert_eq!(shares[1].bytes, 10);
    }

    #[test]
    fn empty_totals_have_zero_share() {
        let counts = IndexMap::from([("a".to_string(), 0), ("b".to_string(), 0)]);
        assert!(category_shares(&counts).iter().all(|s| s.share == 0.0));
    }

    #[test]
    fn deviation_measures_worst_category() {
        let weights = IndexMap::from([("a".to_string(), 0.5), ("b".to_string(), 0.5)]);
        let exact = IndexMap::from([("a".to_string(), 60), ("b".to_string(), 60)]);
        assert_eq!(max_share_deviation(&weights, &exact), 0.0);

        let skewed = IndexMap::from([("a".to_string(), 75), ("b".to_string(), 25)]);
        assert!((max_share_deviation(&weights, &skewed) - 0.25).abs() < 1e-12);

        let partial = IndexMap::from([("a".to_string(), 10)]);
        assert!((max_share_deviation(&weights, &partial) - 0.5).abs() < 1e-12);
    }
}
