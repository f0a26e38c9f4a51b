//! Repost detection.

use crate::channels::IncomingPost;

/// Marker a manual repost carries in its text
const REPOST_MARKER: &str = "RT @";

/// Whether a post re-shares someone else's post.
///
/// True when the service flags it natively or the text contains `RT @`
/// anywhere (case-sensitive).
pub fn is_repost(post: &IncomingPost) -> bool {
    post.is_repost || post.text.contains(REPOST_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_flag_wins_regardless_of_text() {
        let post = IncomingPost::new("1", "bob", "I love Go alot").with_repost_flag(true);
        assert!(is_repost(&post));
    }

    #[test]
    fn test_marker_anywhere_in_text() {
        assert!(is_repost(&IncomingPost::new("1", "bob", "RT @x: I love Go alot")));
        assert!(is_repost(&IncomingPost::new("1", "bob", "so true RT @x: alot")));
    }

    #[test]
    fn test_marker_is_case_sensitive() {
        assert!(!is_repost(&IncomingPost::new("1", "bob", "rt @x: alot")));
        assert!(!is_repost(&IncomingPost::new("1", "bob", "RT@x alot")));
    }

    #[test]
    fn test_original_post() {
        assert!(!is_repost(&IncomingPost::new("1", "bob", "I love Go alot")));
    }
}
