pub mod client;
pub mod locator;
pub mod parser;

pub use client::OutlineClient;
pub use locator::NodeLocator;
pub use parser::{parse_section, outline_text, ParsedSection};

use scraper::Html;

/// Plain text of a possibly HTML-formatted outline string.
pub fn strip_markup(text: &str) -> String {
    if !text.contains('<') && !text.contains('&') {
        return text.to_string();
    }
    let fragment = Html::parse_fragment(text);
    fragment.root_element().text().collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markup_removes_tags() {
        assert_eq!(strip_markup("<b>Spiky POV</b>"), "Spiky POV");
        assert_eq!(strip_markup("plain name"), "plain name");
        assert_eq!(strip_markup("a <i>b</i> c"), "a b c");
    }

    #[test]
    fn test_strip_markup_decodes_entities() {
        assert_eq!(strip_markup("Q&amp;A"), "Q&A");
    }
}
