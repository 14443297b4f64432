use std::sync::LazyLock;

use regex::Regex;

static RECIPE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://(?:www\.)?jorbites\.com/recipes/([A-Za-z0-9_-]+)")
        .expect("recipe link pattern is valid")
});

/// Extracts every recipe identifier embedded in `text`, in order of
/// appearance. Duplicates within the same text are preserved; deduplication
/// is a tally-stage concern. Text without a matching link yields an empty
/// vector, never an error.
pub fn extract_recipe_ids(text: &str) -> Vec<String> {
    RECIPE_LINK_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_link_yields_empty() {
        assert!(extract_recipe_ids("").is_empty());
        assert!(extract_recipe_ids("love this giveaway!!").is_empty());
        assert!(extract_recipe_ids("see jorbites.com/recipes/123").is_empty()); // no scheme
        assert!(extract_recipe_ids("https://jorbites.com/users/42").is_empty());
    }

    #[test]
    fn test_single_link() {
        let ids = extract_recipe_ids("my entry: https://jorbites.com/recipes/abc123 good luck");
        assert_eq!(ids, vec!["abc123".to_string()]);
    }

    #[test]
    fn test_scheme_and_host_variants() {
        assert_eq!(
            extract_recipe_ids("http://jorbites.com/recipes/a-b_c"),
            vec!["a-b_c".to_string()]
        );
        assert_eq!(
            extract_recipe_ids("https://www.jorbites.com/recipes/42"),
            vec!["42".to_string()]
        );
        assert_eq!(
            extract_recipe_ids("HTTPS://WWW.JORBITES.COM/recipes/42"),
            vec!["42".to_string()]
        );
    }

    #[test]
    fn test_multiple_links_preserve_order_and_duplicates() {
        let text = "https://jorbites.com/recipes/2 then https://jorbites.com/recipes/1 \
                    and again https://jorbites.com/recipes/2";
        assert_eq!(
            extract_recipe_ids(text),
            vec!["2".to_string(), "1".to_string(), "2".to_string()]
        );
    }

    #[test]
    fn test_id_stops_at_non_identifier_chars() {
        let ids = extract_recipe_ids("https://jorbites.com/recipes/99?utm_source=ig");
        assert_eq!(ids, vec!["99".to_string()]);

        let ids = extract_recipe_ids("(https://jorbites.com/recipes/tarta-de-queso)");
        assert_eq!(ids, vec!["tarta-de-queso".to_string()]);
    }
}
