//! Ordered label/value results shared by every aggregate.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Values that can be drawn on a chart axis.
pub trait ChartValue: Copy + PartialOrd {
    fn as_f64(self) -> f64;
}

impl ChartValue for f64 {
    fn as_f64(self) -> f64 {
        self
    }
}

impl ChartValue for usize {
    fn as_f64(self) -> f64 {
        self as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry<V> {
    pub label: String,
    pub value: V,
}

/// Entries sorted descending by value.
///
/// Ties keep the order in which their labels were first seen in the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ranking<V> {
    entries: Vec<RankEntry<V>>,
}

impl<V> Default for Ranking<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V: ChartValue> Ranking<V> {
    /// Build from groups listed in first-seen order.
    pub fn from_groups(groups: impl IntoIterator<Item = (String, V)>) -> Self {
        let mut entries: Vec<RankEntry<V>> = groups
            .into_iter()
            .map(|(label, value)| RankEntry { label, value })
            .collect();
        // sort_by is stable, which keeps the first-seen tie order
        entries.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
        Self { entries }
    }

    pub fn get(&self, label: &str) -> Option<V> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.value)
    }

    /// The first `n` entries (all of them if fewer).
    pub fn top(&self, n: usize) -> &[RankEntry<V>] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// The first `n` entries as chart points.
    pub fn top_points(&self, n: usize) -> Vec<(String, f64)> {
        self.top(n)
            .iter()
            .map(|e| (e.label.clone(), e.value.as_f64()))
            .collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }
}

impl<V> Ranking<V> {
    pub fn entries(&self) -> &[RankEntry<V>] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankEntry<V>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Group accumulator that remembers first-seen key order.
#[derive(Debug)]
pub(crate) struct FirstSeen<T> {
    index: HashMap<String, usize>,
    groups: Vec<(String, T)>,
}

impl<T> Default for FirstSeen<T> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }
}

impl<T: Default> FirstSeen<T> {
    pub(crate) fn entry(&mut self, key: &str) -> &mut T {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.index.insert(key.to_string(), self.groups.len());
                self.groups.push((key.to_string(), T::default()));
                self.groups.len() - 1
            }
        };
        &mut self.groups[idx].1
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub(crate) fn into_groups(self) -> Vec<(String, T)> {
        self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_keep_first_seen_order() {
        let ranking = Ranking::from_groups(vec![
            ("b".to_string(), 1usize),
            ("a".to_string(), 3),
            ("c".to_string(), 1),
            ("d".to_string(), 3),
        ]);
        assert_eq!(ranking.labels(), vec!["a", "d", "b", "c"]);
    }

    #[test]
    fn top_truncates_without_panicking() {
        let ranking = Ranking::from_groups(vec![("x".to_string(), 2.0), ("y".to_string(), 1.0)]);
        assert_eq!(ranking.top(1).len(), 1);
        assert_eq!(ranking.top(50).len(), 2);
        assert_eq!(ranking.top_points(1), vec![("x".to_string(), 2.0)]);
    }

    #[test]
    fn accumulator_preserves_insertion_order() {
        let mut acc: FirstSeen<f64> = FirstSeen::default();
        *acc.entry("z") += 1.0;
        *acc.entry("a") += 2.0;
        *acc.entry("z") += 3.0;
        assert!(acc.contains("a"));
        assert_eq!(
            acc.into_groups(),
            vec![("z".to_string(), 4.0), ("a".to_string(), 2.0)]
        );
    }
}
