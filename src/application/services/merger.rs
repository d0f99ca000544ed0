//! # Merger
//!
//! Combines per-source outcomes into one globally ordered list.
//!
//! Records from successful sources are concatenated and sorted by timestamp
//! descending. Equal timestamps are ordered by transaction id ascending, then
//! by source id ascending, so merging the same outcomes always yields the same
//! sequence regardless of the order sources settled in. Failed sources add
//! nothing.

use crate::application::services::source_client::FetchOutcome;
use crate::domain::entities::Transaction;
use std::cmp::Ordering;

/// Merge ordering: newest first, then id ascending, then source ascending.
#[must_use]
pub fn merge_order(a: &Transaction, b: &Transaction) -> Ordering {
    b.timestamp()
        .cmp(&a.timestamp())
        .then_with(|| a.id().cmp(b.id()))
        .then_with(|| a.source_id().cmp(b.source_id()))
}

/// Merges outcomes into a single ordered list. Inputs are not modified.
#[must_use]
pub fn merge(outcomes: &[FetchOutcome]) -> Vec<Transaction> {
    let capacity = outcomes.iter().map(|o| o.transactions().len()).sum();
    let mut merged: Vec<Transaction> = Vec::with_capacity(capacity);
    for outcome in outcomes {
        merged.extend_from_slice(outcome.transactions());
    }
    merged.sort_by(merge_order);
    merged
}
