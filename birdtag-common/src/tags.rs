//! Tag histogram logic
//!
//! A media record carries a histogram of detected species labels. The
//! histogram never stores zero or negative counts: a count that drops to
//! zero removes the key entirely.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label → occurrence-count histogram for one media record
///
/// Serializes as a plain JSON object, e.g. `{"crow": 2, "pigeon": 1}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagCounts(HashMap<String, u64>);

impl TagCounts {
    /// Create an empty histogram
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Build from a raw map, dropping any zero-count entries
    ///
    /// Used when loading persisted rows that may predate the
    /// no-zero-counts rule.
    pub fn from_map(map: HashMap<String, u64>) -> Self {
        let mut counts = Self(map);
        counts.0.retain(|_, v| *v > 0);
        counts
    }

    /// Count for a label, 0 when absent
    pub fn get(&self, label: &str) -> u64 {
        self.0.get(label).copied().unwrap_or(0)
    }

    /// Whether the label is present (count >= 1)
    pub fn contains(&self, label: &str) -> bool {
        self.0.contains_key(label)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.0.iter()
    }

    /// Add `delta` occurrences of `label`
    ///
    /// A zero delta is a no-op so that no zero-count key is ever created.
    pub fn add(&mut self, label: &str, delta: u64) {
        if delta == 0 {
            return;
        }
        *self.0.entry(label.to_string()).or_insert(0) += delta;
    }

    /// Subtract `delta` occurrences of `label`, clamping at zero
    ///
    /// When the count reaches zero the key is removed rather than stored.
    pub fn remove(&mut self, label: &str, delta: u64) {
        let current = self.get(label);
        let new_count = current.saturating_sub(delta);
        if new_count > 0 {
            self.0.insert(label.to_string(), new_count);
        } else {
            self.0.remove(label);
        }
    }

    /// Threshold test: every `(label, min)` pair must satisfy
    /// `count(label) >= min`, with an absent label counting as 0
    pub fn meets_thresholds(&self, thresholds: &HashMap<String, f64>) -> bool {
        thresholds
            .iter()
            .all(|(label, min)| self.get(label) as f64 >= *min)
    }
}

impl FromIterator<(String, u64)> for TagCounts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

/// Aggregate an ordered label sequence into a histogram
///
/// Repeats accumulate: `["crow", "pigeon", "crow"]` yields
/// `{"crow": 2, "pigeon": 1}`. Empty input yields an empty histogram.
pub fn aggregate<I, S>(labels: I) -> TagCounts
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts = TagCounts::new();
    for label in labels {
        counts.add(label.as_ref(), 1);
    }
    counts
}
