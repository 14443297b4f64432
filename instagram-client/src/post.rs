use giveaway_core::{CoreError, InstagramApiError};
use url::Url;

/// Extracts the shortcode from an Instagram post URL. Accepts the
/// `/p/{shortcode}` and `/reel/{shortcode}` forms; query strings and
/// trailing slashes are ignored.
pub fn shortcode_from_url(post_url: &str) -> Result<String, CoreError> {
    let invalid = || {
        CoreError::InstagramApi(InstagramApiError::InvalidPostUrl {
            url: post_url.to_string(),
        })
    };

    let parsed = Url::parse(post_url).map_err(|_| invalid())?;
    let mut segments = parsed
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|s| !s.is_empty());

    while let Some(segment) = segments.next() {
        if segment == "p" || segment == "reel" {
            return match segments.next() {
                Some(shortcode) if !shortcode.is_empty() => Ok(shortcode.to_string()),
                _ => Err(invalid()),
            };
        }
    }

    Err(invalid())
}
