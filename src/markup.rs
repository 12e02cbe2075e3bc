//! HTML markup removal for text shown to assistants.

use regex::Regex;
use std::sync::LazyLock;

// A tag runs from `<` to the next `>`; an unterminated `<` at the very end is
// dropped along with the rest of the tag.
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>?").unwrap());

/// Remove all markup tags, leaving text content and entities untouched.
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    TAG.replace_all(html, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_tags() {
        assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn test_attributes_and_self_closing() {
        assert_eq!(
            strip_html(r#"<div class="x">line<br/>next <a href="/y">link</a></div>"#),
            "linenext link"
        );
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(strip_html("no markup &amp; here"), "no markup &amp; here");
    }

    #[test]
    fn test_unterminated_tag() {
        assert_eq!(strip_html("text <span"), "text ");
    }

    #[test]
    fn test_empty() {
        assert_eq!(strip_html(""), "");
    }
}
