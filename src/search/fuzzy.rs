//! Approximate matching over the searchable fields.
//!
//! The index is built once from the [`RecordStore`] and keeps a lowercased
//! copy of every searchable field. Scoring is delegated to a pluggable
//! [`FuzzyMatcher`]; the default [`EditDistanceMatcher`] uses Damerau-Levenshtein
//! distance from `strsim`, so transpositions count as a single edit.

use std::sync::Arc;

use strsim::damerau_levenshtein;

use crate::catalog::RecordStore;
use crate::models::{RankedMatch, Record};

/// Default acceptance threshold (lower is stricter)
pub const DEFAULT_THRESHOLD: f64 = 0.35;

/// Contract of the approximate string-matching engine.
///
/// Inputs are already lowercased. Implementations return a normalized
/// distance in `[0, 1]` (0 is a perfect match) when `text` is an acceptable
/// match for `pattern`, and `None` otherwise. Where in `text` the match
/// occurs must not affect the score.
pub trait FuzzyMatcher: Send + Sync + std::fmt::Debug {
    fn score(&self, pattern: &str, text: &str) -> Option<f64>;
}

/// Edit-distance matcher tolerant of typos and transpositions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditDistanceMatcher {
    threshold: f64,
}

impl Default for EditDistanceMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl EditDistanceMatcher {
    /// Create a matcher with the given acceptance threshold, clamped to `[0, 1]`
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// Acceptance threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Best normalized distance between the pattern and any window of the text
    fn distance(&self, pattern: &str, text: &str) -> f64 {
        if text.contains(pattern) {
            return 0.0;
        }

        let pattern_tokens = tokenize(pattern);
        let text_tokens = tokenize(text);
        if pattern_tokens.is_empty() || text_tokens.is_empty() {
            return 1.0;
        }

        let pattern = pattern_tokens.join(" ");
        let pattern_len = pattern.chars().count();
        let width = pattern_tokens.len().min(text_tokens.len());

        let mut best = usize::MAX;
        for window in text_tokens.windows(width) {
            let candidate = window.join(" ");
            best = best.min(damerau_levenshtein(&pattern, &candidate));

            // Partial input: compare against the window's leading characters
            if candidate.chars().count() > pattern_len {
                let prefix: String = candidate.chars().take(pattern_len).collect();
                best = best.min(damerau_levenshtein(&pattern, &prefix));
            }
            if best == 0 {
                break;
            }
        }

        (best as f64 / pattern_len as f64).min(1.0)
    }
}

impl FuzzyMatcher for EditDistanceMatcher {
    fn score(&self, pattern: &str, text: &str) -> Option<f64> {
        if pattern.is_empty() || text.is_empty() {
            return None;
        }
        let distance = self.distance(pattern, text);
        (distance <= self.threshold).then_some(distance)
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Debug)]
struct IndexEntry {
    position: usize,
    record: Arc<Record>,
    values: Vec<String>,
}

/// Fuzzy index over a fixed set of searchable fields
#[derive(Debug)]
pub struct FuzzyIndex {
    entries: Vec<IndexEntry>,
    matcher: Box<dyn FuzzyMatcher>,
}

impl FuzzyIndex {
    /// Build the index once from the store
    pub fn build(store: &RecordStore, fields: &[&str], matcher: Box<dyn FuzzyMatcher>) -> Self {
        let entries = store
            .all()
            .iter()
            .enumerate()
            .map(|(position, record)| IndexEntry {
                position,
                record: Arc::clone(record),
                values: fields
                    .iter()
                    .map(|field| record.text(field).trim().to_lowercase())
                    .collect(),
            })
            .collect();

        tracing::debug!(
            "Built fuzzy index over {} records and {} fields",
            store.len(),
            fields.len()
        );

        Self { entries, matcher }
    }

    /// Number of indexed records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Accepted matches, best first; ties keep store order.
    ///
    /// A record's score is its best score over all searchable fields. Blank
    /// queries match nothing.
    pub fn search(&self, query: &str) -> Vec<RankedMatch> {
        let pattern = query.trim().to_lowercase();
        if pattern.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<RankedMatch> = self
            .entries
            .iter()
            .filter_map(|entry| {
                entry
                    .values
                    .iter()
                    .filter_map(|value| self.matcher.score(&pattern, value))
                    .min_by(|a, b| a.total_cmp(b))
                    .map(|score| RankedMatch::scored(entry.position, Arc::clone(&entry.record), score))
            })
            .collect();

        // Stable sort: equal scores stay in store order
        matches.sort_by(|a, b| {
            a.score
                .unwrap_or(1.0)
                .total_cmp(&b.score.unwrap_or(1.0))
        });

        tracing::debug!("Fuzzy query {:?} accepted {} records", pattern, matches.len());
        matches
    }
}
