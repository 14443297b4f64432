use std::collections::BTreeMap;

use tracing::debug;

use crate::types::{Comment, ParticipantTally, TallyOptions};

/// Folds the full comment snapshot into per-user tallies under the active
/// counting policy. A single linear pass; accumulation is commutative, so
/// fetch order only matters for the order of each participant's recorded
/// comments.
///
/// Policy precedence:
/// 1. A comment with no extracted links contributes nothing and is skipped.
/// 2. `dedupe_recipes_per_user`: entries equal the number of distinct recipe
///    IDs the user has ever posted. The per-link flag is ignored.
/// 3. `count_multiple_links_per_comment`: one entry per extracted link,
///    duplicates included.
/// 4. Default: one entry per qualifying comment.
pub fn tally(comments: &[Comment], options: TallyOptions) -> BTreeMap<String, ParticipantTally> {
    let mut participants: BTreeMap<String, ParticipantTally> = BTreeMap::new();

    for comment in comments {
        if comment.author.is_empty() {
            debug!("Skipping comment {} with missing author", comment.id);
            continue;
        }
        if comment.recipe_ids.is_empty() {
            continue;
        }

        let participant = participants
            .entry(comment.author.clone())
            .or_insert_with(|| ParticipantTally::new(comment.author.clone(), comment.author_id));

        participant.comments.push(comment.clone());

        if options.dedupe_recipes_per_user {
            let before = participant.recipe_ids.len();
            participant
                .recipe_ids
                .extend(comment.recipe_ids.iter().cloned());
            participant.entries += (participant.recipe_ids.len() - before) as u64;
        } else {
            participant
                .recipe_ids
                .extend(comment.recipe_ids.iter().cloned());
            if options.count_multiple_links_per_comment {
                participant.entries += comment.recipe_ids.len() as u64;
            } else {
                participant.entries += 1;
            }
        }
    }

    debug!(
        participants = participants.len(),
        total_entries = total_entries(&participants),
        "Tally complete"
    );

    participants
}

/// Sum of entries across all participants.
pub fn total_entries(participants: &BTreeMap<String, ParticipantTally>) -> u64 {
    participants.values().map(|p| p.entries).sum()
}
