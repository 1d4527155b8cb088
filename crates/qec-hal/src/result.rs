//! Execution result types.
//!
//! Bitstring ordering: the rightmost character is classical bit 0
//! (OpenQASM 3 convention). For a two-bit register, `"01"` means bit 0
//! read `1` and bit 1 read `0`.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Measurement counts from circuit execution.
///
/// Maps bitstrings to occurrence counts. Produced once per execution and
/// treated as immutable by every consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// Map from bitstring to count.
    counts: FxHashMap<String, u64>,
}

impl Counts {
    /// Create empty counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create counts from an iterator of (bitstring, count) pairs.
    /// Duplicate bitstrings are accumulated (summed), consistent with `insert()`.
    pub fn from_pairs(iter: impl IntoIterator<Item = (impl Into<String>, u64)>) -> Self {
        let mut counts = Self::new();
        for (k, v) in iter {
            counts.insert(k, v);
        }
        counts
    }

    /// Add `count` occurrences of a bitstring.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        let key = bitstring.into();
        *self.counts.entry(key).or_default() += count;
    }

    /// Get the count for a bitstring.
    pub fn get(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Iterate over (bitstring, count) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.counts.iter()
    }

    /// Get the total number of shots.
    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Get the most frequent bitstring.
    pub fn most_frequent(&self) -> Option<(&String, &u64)> {
        self.counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
    }

    /// Get probabilities for each bitstring.
    #[allow(clippy::cast_precision_loss)]
    pub fn probabilities(&self) -> FxHashMap<String, f64> {
        let total = self.total_shots() as f64;
        if total == 0.0 {
            return FxHashMap::default();
        }
        self.counts
            .iter()
            .map(|(k, &v)| (k.clone(), v as f64 / total))
            .collect()
    }

    /// Get sorted counts (by count descending, then bitstring ascending).
    pub fn sorted(&self) -> Vec<(&String, &u64)> {
        let mut items: Vec<_> = self.counts.iter().collect();
        items.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        items
    }

    /// Bitstring width shared by every entry.
    ///
    /// `None` if the counts are empty or the entries disagree.
    pub fn width(&self) -> Option<usize> {
        let mut widths = self.counts.keys().map(String::len);
        let first = widths.next()?;
        widths.all(|w| w == first).then_some(first)
    }

    /// Get the number of unique bitstrings.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if counts are empty.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut counts = Self::new();
        for (key, value) in iter {
            counts.insert(key, value);
        }
        counts
    }
}

/// Result of circuit execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement counts.
    pub counts: Counts,
    /// Number of shots executed.
    pub shots: u32,
    /// Execution time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    /// Additional metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl ExecutionResult {
    /// Create a new execution result.
    pub fn new(counts: Counts, shots: u32) -> Self {
        Self {
            counts,
            shots,
            execution_time_ms: None,
            metadata: serde_json::Value::Null,
        }
    }

    /// Set the execution time.
    pub fn with_execution_time(mut self, time_ms: u64) -> Self {
        self.execution_time_ms = Some(time_ms);
        self
    }

    /// Set metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether the counts add up to the requested number of shots.
    pub fn is_complete(&self) -> bool {
        self.counts.total_shots() == u64::from(self.shots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_basic() {
        let mut counts = Counts::new();
        counts.insert("0", 500);
        counts.insert("1", 400);
        counts.insert("1", 100);

        assert_eq!(counts.get("0"), 500);
        assert_eq!(counts.get("1"), 500);
        assert_eq!(counts.get("01"), 0);
        assert_eq!(counts.total_shots(), 1000);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_counts_probabilities() {
        let counts = Counts::from_pairs([("00", 300), ("01", 200), ("10", 300), ("11", 200)]);

        let probs = counts.probabilities();
        assert!((probs["00"] - 0.3).abs() < 1e-10);
        assert!((probs["01"] - 0.2).abs() < 1e-10);
        assert!(Counts::new().probabilities().is_empty());
    }

    #[test]
    fn test_counts_most_frequent_and_sorted() {
        let counts = Counts::from_pairs([("0", 100), ("1", 900)]);

        let (most, count) = counts.most_frequent().unwrap();
        assert_eq!(most, "1");
        assert_eq!(*count, 900);

        let sorted = counts.sorted();
        assert_eq!(sorted[0].0, "1");
        assert_eq!(sorted[1].0, "0");
    }

    #[test]
    fn test_counts_width() {
        assert_eq!(Counts::new().width(), None);
        assert_eq!(Counts::from_pairs([("010", 1), ("111", 2)]).width(), Some(3));
        assert_eq!(Counts::from_pairs([("0", 1), ("11", 2)]).width(), None);
    }

    #[test]
    fn test_execution_result_completeness() {
        let counts = Counts::from_pairs([("0", 500), ("1", 500)]);
        let result = ExecutionResult::new(counts, 1000).with_execution_time(42);

        assert_eq!(result.execution_time_ms, Some(42));
        assert!(result.is_complete());

        let short = ExecutionResult::new(Counts::from_pairs([("0", 10)]), 11);
        assert!(!short.is_complete());
    }
}
