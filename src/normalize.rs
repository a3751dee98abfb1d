//! Comment-body cleanup for the bracket-quote markup used by the source
//! site's comment system.
//!
//! A quotation looks like `[quote]…[/quote]` or `[quote=Author]…[/quote]`
//! and may nest quotations of the same kind. An outer quotation is removed
//! as one unit: the scan pairs the earliest opening marker with the *last*
//! closing marker in the rest of the string, so nested content disappears
//! in a single removal.

const OPEN_BARE: &str = "[quote]";
const OPEN_ATTR: &str = "[quote=";
const CLOSE: &str = "[/quote]";

/// Removes every quoted span from `text` and drops lines that end up blank.
///
/// An opening marker with no closing marker anywhere after it is left in
/// place along with everything that follows it.
pub fn strip_quoted_spans(text: &str) -> String {
    let (residue, _) = remove_spans(text);
    drop_blank_lines(&residue)
}

/// Counts the quoted spans [`strip_quoted_spans`] would remove, without
/// touching the input. Nested quotations count as one span.
pub fn count_quoted_spans(text: &str) -> usize {
    remove_spans(text).1
}

fn remove_spans(text: &str) -> (String, usize) {
    let mut s = text.to_string();
    let mut removed = 0;
    while let Some(start) = earliest_opener(&s) {
        // The last closer in the remainder, not the nearest: an outer span
        // swallows any inner spans it contains.
        let Some(close) = s[start..].rfind(CLOSE) else {
            break;
        };
        let end = start + close + CLOSE.len();
        s.replace_range(start..end, "");
        removed += 1;
    }
    (s, removed)
}

fn earliest_opener(s: &str) -> Option<usize> {
    match (s.find(OPEN_ATTR), s.find(OPEN_BARE)) {
        (Some(attr), Some(bare)) => Some(attr.min(bare)),
        (Some(attr), None) => Some(attr),
        (None, Some(bare)) => Some(bare),
        (None, None) => None,
    }
}

fn drop_blank_lines(s: &str) -> String {
    s.split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(strip_quoted_spans("no markup here"), "no markup here");
        assert_eq!(count_quoted_spans("no markup here"), 0);
    }

    #[test]
    fn single_span_is_removed() {
        let text = "before [quote]quoted[/quote] after";
        assert_eq!(strip_quoted_spans(text), "before  after");
        assert_eq!(count_quoted_spans(text), 1);
    }

    #[test]
    fn attributed_opener_is_recognized() {
        let text = "[quote=Somebody]their words[/quote]reply";
        assert_eq!(strip_quoted_spans(text), "reply");
        assert_eq!(count_quoted_spans(text), 1);
    }

    #[test]
    fn nested_spans_collapse_into_one_removal() {
        let text = "[quote]a[quote]b[/quote]c[/quote]";
        assert_eq!(count_quoted_spans(text), 1);
        assert_eq!(strip_quoted_spans(text), "");
    }

    #[test]
    fn unterminated_opener_is_left_in_place() {
        let text = "[quote]abc";
        assert_eq!(strip_quoted_spans(text), "[quote]abc");
        assert_eq!(count_quoted_spans(text), 0);
    }

    #[test]
    fn later_spans_merge_through_the_last_closer() {
        // The first opener pairs with the LAST closer, so separate spans
        // and the text between them vanish as one unit.
        let text = "a[quote]x[/quote]b[quote=U]y[/quote]c[quote]z[/quote]d";
        assert_eq!(count_quoted_spans(text), 1);
        assert_eq!(strip_quoted_spans(text), "ad");
    }

    #[test]
    fn span_count_matches_removals_after_each_merge() {
        // A span followed by an unterminated opener: one removal, then the
        // scan stops at the dangling opener.
        let text = "a[quote]x[/quote]b[quote]tail";
        assert_eq!(count_quoted_spans(text), 1);
        assert_eq!(strip_quoted_spans(text), "ab[quote]tail");
    }

    #[test]
    fn spans_on_their_own_lines_leave_no_blanks() {
        let text = "first\n[quote]quoted\nmore quoted[/quote]\nlast";
        let stripped = strip_quoted_spans(text);
        assert_eq!(stripped, "first\nlast");
        assert!(stripped.lines().all(|line| !line.trim().is_empty()));
    }

    #[test]
    fn whitespace_only_lines_are_dropped() {
        assert_eq!(strip_quoted_spans("a\n   \n\t\nb"), "a\nb");
    }

    #[test]
    fn residual_text_has_no_markers() {
        let text = "x[quote=A]p[/quote]y\n[quote]q[/quote]\nz";
        let stripped = strip_quoted_spans(text);
        assert!(!stripped.contains("[quote"));
        assert!(!stripped.contains(CLOSE));
    }

    #[test]
    fn count_does_not_consume_the_input() {
        let text = String::from("[quote]gone[/quote]kept");
        let n = count_quoted_spans(&text);
        assert_eq!(n, 1);
        assert_eq!(text, "[quote]gone[/quote]kept");
    }

    #[test]
    fn closer_before_any_opener_is_ignored() {
        let text = "[/quote]tail[quote]q[/quote]";
        assert_eq!(count_quoted_spans(text), 1);
        assert_eq!(strip_quoted_spans(text), "[/quote]tail");
    }
}
