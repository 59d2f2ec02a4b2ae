//! Anchor ids and `[label](#c-id)` links.

use std::ops::Range;

/// One `[label](#c-id)` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorLink<'a> {
    pub label: &'a str,
    pub target: &'a str,
    /// Byte range of the whole link in the scanned text.
    pub span: Range<usize>,
}

fn is_id_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// `c-` followed by at least one letter, digit, underscore or hyphen.
#[must_use]
pub fn is_anchor_id(candidate: &str) -> bool {
    candidate
        .strip_prefix("c-")
        .is_some_and(|body| !body.is_empty() && body.chars().all(is_id_char))
}

/// Every anchor link in `text`, left to right, non-overlapping.
#[must_use]
pub fn find_anchor_links(text: &str) -> Vec<AnchorLink<'_>> {
    let mut links = Vec::new();
    let mut cursor = 0;
    while let Some(offset) = text[cursor..].find('[') {
        let start = cursor + offset;
        match match_link_at(text, start) {
            Some(link) => {
                cursor = link.span.end;
                links.push(link);
            }
            None => cursor = start + 1,
        }
    }
    links
}

/// Replace each anchor link with its label.
#[must_use]
pub fn strip_anchor_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    for link in find_anchor_links(text) {
        out.push_str(&text[copied..link.span.start]);
        out.push_str(link.label);
        copied = link.span.end;
    }
    out.push_str(&text[copied..]);
    out
}

fn match_link_at(text: &str, start: usize) -> Option<AnchorLink<'_>> {
    let label_start = start + 1;
    let label_len = text[label_start..].find(']')?;
    if label_len == 0 {
        return None;
    }
    let label_end = label_start + label_len;
    let id_start = label_end + "](#".len();
    if !text[label_end..].starts_with("](#") {
        return None;
    }
    let id_len = text[id_start..]
        .find(|c: char| !is_id_char(c))
        .unwrap_or(text.len() - id_start);
    let id_end = id_start + id_len;
    let target = &text[id_start..id_end];
    if !text[id_end..].starts_with(')') || !is_anchor_id(target) {
        return None;
    }
    Some(AnchorLink {
        label: &text[label_start..label_end],
        target,
        span: start..id_end + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::{find_anchor_links, is_anchor_id, strip_anchor_links};

    fn targets(text: &str) -> Vec<&str> {
        find_anchor_links(text).iter().map(|link| link.target).collect()
    }

    #[test]
    fn finds_links_in_order() {
        assert_eq!(
            targets("see [Joins](#c-sql-joins) and [Keys](#c-keys)."),
            vec!["c-sql-joins", "c-keys"]
        );
        let links = find_anchor_links("x [A b](#c-a)");
        assert_eq!(links[0].label, "A b");
        assert_eq!(links[0].span, 2..13);
    }

    #[test]
    fn label_may_contain_an_opening_bracket() {
        let links = find_anchor_links("[a [nested](#c-x)");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].label, "a [nested");
        assert_eq!(links[0].target, "c-x");
    }

    #[test]
    fn rejects_malformed_links() {
        assert!(targets("[](#c-x) [t](https://x) [t](#other) [t](#c-)").is_empty());
        assert!(targets("[t](#c-x").is_empty());
        assert!(targets("[t](#c-x y)").is_empty());
        assert!(targets("[t] (#c-x)").is_empty());
    }

    #[test]
    fn strip_keeps_labels_and_surrounding_text() {
        assert_eq!(
            strip_anchor_links("Use [SQL Joins](#c-sql-joins) with [docs](https://d)."),
            "Use SQL Joins with [docs](https://d)."
        );
        assert_eq!(strip_anchor_links("plain"), "plain");
        assert_eq!(strip_anchor_links("é [ü](#c-ü) ß"), "é ü ß");
    }

    #[test]
    fn anchor_ids() {
        assert!(is_anchor_id("c-a"));
        assert!(is_anchor_id("c-sql_joins-2"));
        assert!(!is_anchor_id("c-"));
        assert!(!is_anchor_id("c-a b"));
        assert!(!is_anchor_id("x-a"));
    }
}
