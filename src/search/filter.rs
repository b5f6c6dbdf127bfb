//! Structured filtering: substring, year range and categorical equality.

use std::sync::Arc;

use crate::catalog::RecordStore;
use crate::models::{ConstraintSet, RankedMatch, Record};

/// Evaluates a [`ConstraintSet`] against the store.
///
/// Filtering is a pure subset operation: the result keeps store order and is
/// never re-ranked or truncated.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterEngine;

impl FilterEngine {
    /// All records satisfying every constraint, in store order
    pub fn evaluate(store: &RecordStore, constraints: &ConstraintSet) -> Vec<RankedMatch> {
        let results: Vec<RankedMatch> = store
            .all()
            .iter()
            .enumerate()
            .filter(|(_, record)| Self::matches(record, constraints))
            .map(|(position, record)| RankedMatch::unscored(position, Arc::clone(record)))
            .collect();

        tracing::debug!(
            "Filter kept {} of {} records",
            results.len(),
            store.len()
        );
        results
    }

    /// Whether a single record satisfies every constraint
    pub fn matches(record: &Record, constraints: &ConstraintSet) -> bool {
        let text_ok = constraints.text.iter().all(|c| {
            record
                .text(c.field.field_name())
                .to_lowercase()
                .contains(&c.needle)
        });
        if !text_ok {
            return false;
        }

        if constraints.year.is_bounded() && !constraints.year.contains(record.year()) {
            return false;
        }

        constraints
            .categorical
            .iter()
            .all(|c| record.text(&c.field) == c.value)
    }
}
