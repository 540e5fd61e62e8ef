//! Content signatures and text similarity.
//!
//! A signature is a stable equality key over a point's normalized text; the
//! similarity score drives add/delete-vs-update reconciliation in the diff
//! engine.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use similar::{ChangeTag, TextDiff};

/// Separator between the main line and each sub-line inside the hash input.
const FIELD_SEPARATOR: char = '\u{1f}';

/// Decode the HTML entities that show up in outline exports.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '&' {
            out.push(c);
            continue;
        }
        let rest = &text[i..];
        let Some(end) = rest.find(';') else {
            out.push(c);
            continue;
        };
        let entity = &rest[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(d) => {
                out.push(d);
                // skip the consumed entity body and trailing ';'
                while let Some(&(j, _)) = chars.peek() {
                    if j > i + end {
                        break;
                    }
                    chars.next();
                }
            }
            None => out.push(c),
        }
    }
    out
}

/// Canonical form used for both hashing and equality: entity-decoded,
/// trimmed, lowercased, inner whitespace collapsed.
pub fn normalize(text: &str) -> String {
    decode_entities(text)
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stable hash of a point's normalized main content plus sub-points in order.
pub fn signature(main_content: &str, sub_points: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(main_content).as_bytes());
    for sub in sub_points {
        let mut field = String::new();
        field.push(FIELD_SEPARATOR);
        field.push_str(&normalize(sub));
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Character counts of one text pair's diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCounts {
    pub additions: usize,
    pub deletions: usize,
    pub unchanged: usize,
}

/// Character-level diff counts between two texts.
pub fn change_counts(a: &str, b: &str) -> ChangeCounts {
    let diff = TextDiff::from_chars(a, b);
    let mut counts = ChangeCounts::default();
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Equal => counts.unchanged += 1,
            ChangeTag::Delete => counts.deletions += 1,
            ChangeTag::Insert => counts.additions += 1,
        }
    }
    counts
}

/// Symmetric similarity in `[0, 1]`: unchanged characters over the longer
/// text's length. Identical texts score 1.0, disjoint texts 0.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }
    let unchanged = change_counts(a, b).unchanged;
    unchanged as f64 / len_a.max(len_b) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_decodes_and_collapses() {
        assert_eq!(normalize("  Hello &amp; World  "), "hello & world");
        assert_eq!(normalize("A&nbsp;&nbsp;B"), "a b");
        assert_eq!(normalize("caf&#233;"), "café");
        assert_eq!(normalize("caf&#xE9;"), "café");
        assert_eq!(normalize("Tabs\tand\nnewlines"), "tabs and newlines");
    }

    #[test]
    fn test_normalize_leaves_bare_ampersands() {
        assert_eq!(normalize("black & white"), "black & white");
        assert_eq!(normalize("a &unknown; b"), "a &unknown; b");
    }

    #[test]
    fn test_signature_is_stable_under_formatting() {
        let a = signature("Hello World", &["sub one".to_string()]);
        let b = signature("  hello   world ", &[" Sub One".to_string()]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_depends_on_sub_point_order() {
        let a = signature("main", &["x".to_string(), "y".to_string()]);
        let b = signature("main", &["y".to_string(), "x".to_string()]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_signature_separates_main_from_subs() {
        let a = signature("main sub", &[]);
        let b = signature("main", &["sub".to_string()]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_similarity_identical() {
        assert_eq!(similarity("same text", "same text"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn test_similarity_disjoint() {
        assert_eq!(similarity("aaaa", "bbbb"), 0.0);
        assert_eq!(similarity("something", ""), 0.0);
    }

    #[test]
    fn test_similarity_symmetry() {
        let pairs = [
            ("The quick brown fox jumps", "The quick brown fox leaps"),
            ("short", "a much longer different string"),
            ("", "nonempty"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a), "asymmetric for {:?}", (a, b));
        }
    }

    #[test]
    fn test_similarity_near_match_scores_high() {
        let score = similarity("The quick brown fox jumps", "The quick brown fox leaps");
        assert!(score > 0.5, "expected > 0.5, got {}", score);
    }

    #[test]
    fn test_change_counts_roundup() {
        let counts = change_counts("abc", "abd");
        assert_eq!(counts.unchanged, 2);
        assert_eq!(counts.deletions, 1);
        assert_eq!(counts.additions, 1);
    }
}
