use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating shop slugs
    /// Must be lowercase alphanumeric segments joined by single hyphens
    /// - Valid: "pizza-place", "shop123", "cafe-2"
    /// - Invalid: "-shop", "shop-", "pizza--place", "Pizza", "pizza_place"
    pub static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();

    /// Characters that never survive slug derivation (anything but ASCII word chars, whitespace, hyphen)
    pub static ref SLUG_STRIP_REGEX: Regex = Regex::new(r"[^a-zA-Z0-9_\s-]").unwrap();

    /// Runs of separators collapsed into a single hyphen
    pub static ref SLUG_SEPARATOR_REGEX: Regex = Regex::new(r"[\s_-]+").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_regex_valid() {
        assert!(SLUG_REGEX.is_match("pizza-place"));
        assert!(SLUG_REGEX.is_match("shop123"));
        assert!(SLUG_REGEX.is_match("a-b-c"));
        assert!(SLUG_REGEX.is_match("a"));
    }

    #[test]
    fn test_slug_regex_invalid() {
        assert!(!SLUG_REGEX.is_match("-shop")); // starts with hyphen
        assert!(!SLUG_REGEX.is_match("shop-")); // ends with hyphen
        assert!(!SLUG_REGEX.is_match("pizza--place")); // double hyphen
        assert!(!SLUG_REGEX.is_match("Pizza")); // uppercase
        assert!(!SLUG_REGEX.is_match("pizza_place")); // underscore
        assert!(!SLUG_REGEX.is_match("")); // empty
        assert!(!SLUG_REGEX.is_match("pizza place")); // space
    }

    #[test]
    fn test_strip_regex_keeps_only_ascii_word_chars() {
        assert_eq!(SLUG_STRIP_REGEX.replace_all("café!! déjà_vu", ""), "caf dj_vu");
        assert_eq!(SLUG_STRIP_REGEX.replace_all("محل", ""), "");
    }
}
