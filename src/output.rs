use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;

use giveaway_core::{Comment, CoreError, DrawOutcome, ParticipantTally, RankedResult};
use serde::Serialize;

const CSV_HEADER: &str = "username,user_id,entry_count,probability,comment_ids,recipe_ids_posted";

/// Renders the ranked probability table. An empty result set renders the
/// "no qualifying entries" report instead of an empty table.
pub fn render_table(results: &[RankedResult]) -> String {
    if results.is_empty() {
        return "No qualifying entries found.\n".to_string();
    }

    let name_width = results
        .iter()
        .map(|r| r.username.chars().count())
        .max()
        .unwrap_or(0)
        .max("username".len());

    let mut out = String::new();
    out.push_str("Participants (sorted by probability):\n");
    out.push_str(&format!(
        "{:>4}  {:<name_width$}  {:>7}  {:>11}\n",
        "rank", "username", "entries", "probability",
    ));
    for (position, result) in results.iter().enumerate() {
        out.push_str(&format!(
            "{:>4}  {:<name_width$}  {:>7}  {:>10.2}%\n",
            position + 1,
            result.username,
            result.entries,
            result.probability * 100.0,
        ));
    }
    out
}

/// Writes the CSV summary: one row per participant in rank order.
pub fn write_csv(
    path: &Path,
    results: &[RankedResult],
    participants: &BTreeMap<String, ParticipantTally>,
) -> Result<(), CoreError> {
    let mut out = String::new();
    out.push_str(CSV_HEADER);
    out.push('\n');

    for result in results {
        let Some(participant) = participants.get(&result.username) else {
            continue;
        };
        let comment_ids = participant
            .comments
            .iter()
            .map(|c| c.id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let recipe_ids = participant
            .recipe_ids
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(",");

        let row = [
            csv_field(&participant.username),
            participant
                .user_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            result.entries.to_string(),
            format!("{:.6}", result.probability),
            csv_field(&comment_ids),
            csv_field(&recipe_ids),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    std::fs::write(path, out)?;
    Ok(())
}

#[derive(Serialize)]
struct ParticipantExport<'a> {
    username: &'a str,
    user_id: Option<u64>,
    entries: u64,
    probability: f64,
    recipe_ids: &'a BTreeSet<String>,
    comments: &'a [Comment],
}

/// Writes the JSON details: the ranked participants with their qualifying
/// comments.
pub fn write_json(
    path: &Path,
    results: &[RankedResult],
    participants: &BTreeMap<String, ParticipantTally>,
) -> Result<(), CoreError> {
    let export: Vec<ParticipantExport> = results
        .iter()
        .filter_map(|result| {
            participants.get(&result.username).map(|p| ParticipantExport {
                username: &p.username,
                user_id: p.user_id,
                entries: p.entries,
                probability: result.probability,
                recipe_ids: &p.recipe_ids,
                comments: &p.comments,
            })
        })
        .collect();

    let raw = serde_json::to_string_pretty(&export)?;
    std::fs::write(path, raw)?;
    Ok(())
}

/// Boxed winner announcement for the terminal.
pub fn render_winner_box(outcome: &DrawOutcome) -> String {
    let lines = [
        format!("winner: {}", outcome.username),
        format!("  entries: {}", outcome.entries),
        format!("  winning_comment_id: {}", outcome.winning_comment_id),
    ];
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let indent = "  ";
    let mut out = String::new();
    out.push_str(&format!("{}┌{}┐\n", indent, "─".repeat(width + 2)));
    for line in &lines {
        out.push_str(&format!("{}│ {:<width$} │\n", indent, line));
    }
    out.push_str(&format!("{}└{}┘\n", indent, "─".repeat(width + 2)));
    out
}

fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use giveaway_core::{rank, tally, Comment, TallyOptions};

    fn comment(id: u64, author: &str, text: &str) -> Comment {
        let created_at = Utc.timestamp_opt(1_690_000_000 + id as i64, 0).unwrap();
        Comment::new(id, author, Some(500 + id), created_at, text)
    }

    fn sample() -> (
        Vec<RankedResult>,
        BTreeMap<String, ParticipantTally>,
    ) {
        let comments = vec![
            comment(1, "alice", "https://jorbites.com/recipes/1"),
            comment(2, "alice", "https://jorbites.com/recipes/2"),
            comment(3, "bob", "https://jorbites.com/recipes/3"),
        ];
        let participants = tally(&comments, TallyOptions::default());
        let results = rank(&participants);
        (results, participants)
    }

    #[test]
    fn test_render_table() {
        let (results, _) = sample();
        let table = render_table(&results);

        assert!(table.contains("rank"));
        assert!(table.contains("alice"));
        assert!(table.contains("66.67%"));
        assert!(table.contains("33.33%"));

        let alice_line = table.lines().find(|l| l.contains("alice")).unwrap();
        assert!(alice_line.trim_start().starts_with('1'));
    }

    #[test]
    fn test_render_empty_table() {
        assert_eq!(render_table(&[]), "No qualifying entries found.\n");
    }

    #[test]
    fn test_csv_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("participants.csv");
        let (results, participants) = sample();

        write_csv(&path, &results, &participants).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let mut lines = raw.lines();

        assert_eq!(lines.next(), Some(CSV_HEADER));
        let alice = lines.next().unwrap();
        assert_eq!(alice, "alice,501,2,0.666667,\"1,2\",\"1,2\"");
        let bob = lines.next().unwrap();
        assert_eq!(bob, "bob,503,1,0.333333,3,3");
    }

    #[test]
    fn test_csv_field_escaping() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_json_export_is_ranked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("participants.json");
        let (results, participants) = sample();

        write_json(&path, &results, &participants).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();

        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["username"], "alice");
        assert_eq!(rows[0]["entries"], 2);
        assert_eq!(rows[0]["comments"].as_array().unwrap().len(), 2);
        assert_eq!(rows[1]["username"], "bob");
    }

    #[test]
    fn test_winner_box_is_aligned() {
        let outcome = DrawOutcome {
            username: "alice".to_string(),
            entries: 2,
            winning_comment_id: 17_900_001,
        };
        let rendered = render_winner_box(&outcome);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[1].contains("winner: alice"));
        let widths: BTreeSet<usize> = lines.iter().map(|l| l.chars().count()).collect();
        assert_eq!(widths.len(), 1); // every line is the same width
    }
}
