use std::collections::BTreeMap;

use crate::tally::total_entries;
use crate::types::{ParticipantTally, RankedResult};

/// Derives the ranked probability table from a final tally. Each probability
/// is `entries / total_entries`; a run with zero total entries is valid and
/// yields all-zero probabilities rather than a division error.
///
/// Ordering is deterministic: descending by entries, ties broken by username
/// ascending.
pub fn rank(participants: &BTreeMap<String, ParticipantTally>) -> Vec<RankedResult> {
    let total = total_entries(participants);

    let mut results: Vec<RankedResult> = participants
        .values()
        .map(|p| RankedResult {
            username: p.username.clone(),
            entries: p.entries,
            probability: if total > 0 {
                p.entries as f64 / total as f64
            } else {
                0.0
            },
        })
        .collect();

    results.sort_by(|a, b| {
        b.entries
            .cmp(&a.entries)
            .then_with(|| a.username.cmp(&b.username))
    });

    results
}
