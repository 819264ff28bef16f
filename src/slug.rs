use lazy_static::lazy_static;
use regex::Regex;

/// Converts a title to a lowercase, url-safe string usable as a file stem.
/// Every run of characters outside [a-zA-Z0-9_-] collapses into a single
/// dash, and a leading or trailing dash is trimmed.
pub fn slugify(title: &str) -> String {
    lazy_static! {
        static ref UNSAFE_RUN: Regex = Regex::new(r"[^a-zA-Z0-9_-]+").unwrap();
    }

    let lowered = title.to_lowercase();
    let slug = UNSAFE_RUN.replace_all(&lowered, "-");
    slug.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  spaces   everywhere  "), "spaces-everywhere");
        assert_eq!(slugify("under_score-dash"), "under_score-dash");
        assert_eq!(slugify("Caf\u{e9} au lait"), "caf-au-lait");
        assert_eq!(slugify("100% Rust"), "100-rust");
    }

    #[test]
    fn test_slugify_is_idempotent() {
        for title in ["Hello, World!", "a--b", "Déjà vu?", "", "---", "plain"] {
            let once = slugify(title);
            assert_eq!(slugify(&once), once);
        }
    }

    #[test]
    fn test_slugify_empty_results() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("---"), "");
    }
}
