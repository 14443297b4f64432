use std::collections::BTreeMap;

use tracing::info;

use crate::tally::total_entries;
use crate::types::{DrawOutcome, ParticipantTally};

/// Picks a winner weighted by entry count, then a uniformly random winning
/// comment among the winner's qualifying comments. Returns `None` when no
/// participant has any entries.
///
/// Iteration over the tally map is ordered by username, so a seeded `rng`
/// makes the draw reproducible.
pub fn draw_winner(
    participants: &BTreeMap<String, ParticipantTally>,
    rng: &mut fastrand::Rng,
) -> Option<DrawOutcome> {
    let total = total_entries(participants);
    if total == 0 {
        return None;
    }

    let mut pick = rng.u64(0..total);
    for participant in participants.values() {
        if pick < participant.entries {
            let winning_comment = &participant.comments[rng.usize(0..participant.comments.len())];
            info!(
                winner = %participant.username,
                entries = participant.entries,
                comment_id = winning_comment.id,
                "Winner drawn"
            );
            return Some(DrawOutcome {
                username: participant.username.clone(),
                entries: participant.entries,
                winning_comment_id: winning_comment.id,
            });
        }
        pick -= participant.entries;
    }

    // Unreachable: pick < total and the entry counts sum to total.
    None
}
