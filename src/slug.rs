//! Post addressing: a display title maps to a URL-safe slug.
//!
//! Lossy in both directions. "a b" and "a-b" encode to the same slug, so
//! two posts can collide on the same address (lookup returns whichever was
//! stored first), and [`decode`] cannot tell an original hyphen from a
//! space. Decoded titles are for display only, never for re-lookup.

pub fn encode(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join("-")
}

pub fn decode(slug: &str) -> String {
    slug.split('-').collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encode_joins_with_hyphens() {
        assert_eq!(encode("my first post"), "my-first-post");
    }

    #[test]
    fn encode_trims_and_collapses_whitespace() {
        assert_eq!(encode("  spaced   out\ttitle "), "spaced-out-title");
    }

    #[test]
    fn hyphenated_and_spaced_titles_collide() {
        assert_eq!(encode("a b"), "a-b");
        assert_eq!(encode("a-b"), "a-b");
    }

    #[test]
    fn decode_restores_spaces() {
        assert_eq!(decode("my-first-post"), "my first post");
    }

    #[test]
    fn decode_is_not_an_inverse_for_hyphenated_titles() {
        let original = "self-hosting for fun";
        assert_eq!(decode(&encode(original)), "self hosting for fun");
    }
}
