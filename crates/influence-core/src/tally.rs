//! Per-article credit counts produced by an aggregator.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::Serialize;

/// Mapping from article url to the number of users credited with reading
/// it before registering.
///
/// Returned by value from every aggregator; there is no shared tally.
/// Iteration is in url order so two equal tallies always print the same.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tally {
    counts: BTreeMap<String, u64>,
}

impl Tally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one credit to `url`.
    pub fn credit(&mut self, url: &str) {
        self.add(url, 1);
    }

    /// Add `count` credits to `url`. Adding zero leaves the tally unchanged.
    pub fn add(&mut self, url: &str, count: u64) {
        if count == 0 {
            return;
        }
        if let Some(existing) = self.counts.get_mut(url) {
            *existing += count;
        } else {
            self.counts.insert(url.to_string(), count);
        }
    }

    /// Fold another tally into this one by summing counts.
    ///
    /// Commutative and associative, so partial tallies over disjoint user
    /// partitions can be combined in any order.
    pub fn merge(&mut self, other: Self) {
        for (url, count) in other.counts {
            *self.counts.entry(url).or_insert(0) += count;
        }
    }

    /// Credits for `url` (zero when absent).
    #[must_use]
    pub fn get(&self, url: &str) -> u64 {
        self.counts.get(url).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all credits.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Iterate `(url, count)` pairs in url order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(url, count)| (url.as_str(), *count))
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for Tally {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut tally = Self::new();
        for (url, count) in iter {
            let url: String = url.into();
            tally.add(&url, count);
        }
        tally
    }
}

impl IntoIterator for Tally {
    type Item = (String, u64);
    type IntoIter = btree_map::IntoIter<String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_and_get() {
        let mut tally = Tally::new();
        tally.credit("/a");
        tally.credit("/a");
        tally.credit("/b");
        assert_eq!(tally.get("/a"), 2);
        assert_eq!(tally.get("/b"), 1);
        assert_eq!(tally.get("/missing"), 0);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn zero_counts_are_not_stored() {
        let tally: Tally = [("/a", 0), ("/b", 3)].into_iter().collect();
        assert_eq!(tally.len(), 1);
        assert!(tally.iter().all(|(_, count)| count > 0));
    }

    #[test]
    fn merge_sums_counts() {
        let mut left: Tally = [("/a", 1), ("/b", 2)].into_iter().collect();
        let right: Tally = [("/b", 3), ("/c", 1)].into_iter().collect();
        left.merge(right);

        let expected: Tally = [("/a", 1), ("/b", 5), ("/c", 1)].into_iter().collect();
        assert_eq!(left, expected);
    }

    #[test]
    fn merge_is_commutative() {
        let a: Tally = [("/a", 1), ("/b", 2)].into_iter().collect();
        let b: Tally = [("/b", 4), ("/c", 7)].into_iter().collect();

        let mut ab = a.clone();
        ab.merge(b.clone());
        let mut ba = b;
        ba.merge(a);
        assert_eq!(ab, ba);
    }

    #[test]
    fn iteration_is_url_ordered() {
        let tally: Tally = [("/c", 1), ("/a", 1), ("/b", 1)].into_iter().collect();
        let urls: Vec<&str> = tally.iter().map(|(url, _)| url).collect();
        assert_eq!(urls, ["/a", "/b", "/c"]);
    }

    #[test]
    fn serializes_as_plain_map() {
        let tally: Tally = [("/a", 2)].into_iter().collect();
        let json = serde_json::to_string(&tally).unwrap();
        assert_eq!(json, r#"{"/a":2}"#);
    }
}
