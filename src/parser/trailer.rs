//! Trailer embed derivation.
//!
//! Operators paste whatever YouTube link they have at hand; the detail page
//! needs the canonical embed form to render an inline player.

use regex::Regex;
use std::sync::OnceLock;

/// YouTube video ids are exactly this long; a capture of any other length
/// means the pattern matched something that is not a video link.
const VIDEO_ID_LEN: usize = 11;

fn trailer_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^.*(?:youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*$")
            .expect("Invalid regex pattern defined in code")
    })
}

/// Derive an embeddable player URL from any of the common YouTube URL
/// shapes (watch, short link, embed, `v/`, user/channel-qualified).
/// Returns `None` when the URL is not recognizably a YouTube video link.
#[must_use]
pub fn youtube_embed_url(url: &str) -> Option<String> {
    let caps = trailer_regex().captures(url)?;
    let id = caps.get(1)?.as_str();

    if id.len() != VIDEO_ID_LEN {
        return None;
    }

    Some(format!("https://www.youtube.com/embed/{id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_link() {
        assert_eq!(
            youtube_embed_url("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_watch_link() {
        assert_eq!(
            youtube_embed_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_watch_link_with_extra_params() {
        assert_eq!(
            youtube_embed_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s").as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_embed_link_is_idempotent() {
        assert_eq!(
            youtube_embed_url("https://www.youtube.com/embed/dQw4w9WgXcQ").as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_user_qualified_link() {
        assert_eq!(
            youtube_embed_url("https://www.youtube.com/u/c/dQw4w9WgXcQ").as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_non_video_url() {
        assert_eq!(youtube_embed_url("https://example.com/no-video"), None);
    }

    #[test]
    fn test_wrong_id_length() {
        assert_eq!(youtube_embed_url("https://youtu.be/short"), None);
        assert_eq!(
            youtube_embed_url("https://youtu.be/waytoolongforanid"),
            None
        );
    }

    #[test]
    fn test_empty_capture() {
        assert_eq!(youtube_embed_url("https://www.youtube.com/watch?v="), None);
    }
}
