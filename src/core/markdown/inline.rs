//! Inline markup scanner.
//!
//! Turns one line of Markdown into the text that should be inserted plus the
//! style and image requests that decorate it. Offsets are absolute document
//! indices starting at the `start_index` supplied by the caller.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::requests::{utf16_len, InsertionPoint, Request, TextStyle};

// Tried in this order at every scan position. Italic must not swallow the
// first half of a bold marker, hence `[^*]`. Bold lets one extra `*` sit just
// inside each marker so `***both***` nests italic inside bold.
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*(\*?[^*].*?\*?)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\*([^*]+?)\*").unwrap());
static STRIKETHROUGH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^~~(.+?)~~").unwrap());
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!\[([^\]]*)\]\(([^)]+)\)").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[([^\]]+)\]\(([^)]+)\)").unwrap());

/// Output of scanning one run of inline Markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineRun {
    /// Text with every markup character removed.
    pub text: String,
    /// `UpdateTextStyle` and `InsertInlineImage` requests, in scan order.
    pub requests: Vec<Request>,
    /// Index right after the last character of `text`.
    pub next_index: usize,
}

enum Markup<'a> {
    Styled { inner: &'a str, style: TextStyle },
    Image { uri: &'a str },
}

/// Scans `text` starting at document index `start_index`.
///
/// Malformed or unbalanced markup is never an error: anything that does not
/// match a pattern is copied through one character at a time.
pub fn parse_inline(text: &str, start_index: usize, target: &InsertionPoint) -> InlineRun {
    scan(text, start_index, &TextStyle::default(), target)
}

fn scan(text: &str, start_index: usize, inherited: &TextStyle, target: &InsertionPoint) -> InlineRun {
    let mut run = InlineRun {
        text: String::with_capacity(text.len()),
        requests: Vec::new(),
        next_index: start_index,
    };
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];

        if let Some((markup, consumed)) = match_markup(rest) {
            match markup {
                Markup::Styled { inner, style } => {
                    // Inner text first: the span length is the resolved length,
                    // not the raw length with markers.
                    let style = inherited.merge(&style);
                    let inner_run = scan(inner, run.next_index, &style, target);
                    if inner_run.next_index > run.next_index {
                        run.requests.push(Request::text_style(
                            style,
                            target.range(run.next_index, inner_run.next_index),
                        ));
                    }
                    run.requests.extend(inner_run.requests);
                    run.text.push_str(&inner_run.text);
                    run.next_index = inner_run.next_index;
                }
                Markup::Image { uri } => {
                    // Zero width in index space.
                    run.requests.push(Request::InsertInlineImage {
                        uri: uri.to_string(),
                        location: target.location(run.next_index),
                    });
                }
            }
            pos += consumed;
            continue;
        }

        let Some(ch) = rest.chars().next() else {
            break;
        };
        run.text.push(ch);
        run.next_index += ch.len_utf16();
        pos += ch.len_utf8();
    }

    debug_assert_eq!(run.next_index - start_index, utf16_len(&run.text));
    run
}

fn match_markup(rest: &str) -> Option<(Markup<'_>, usize)> {
    // Only the first char decides which patterns can apply.
    match rest.as_bytes().first()? {
        b'*' => BOLD
            .captures(rest)
            .map(|caps| styled(caps, TextStyle::bold()))
            .or_else(|| ITALIC.captures(rest).map(|caps| styled(caps, TextStyle::italic()))),
        b'~' => STRIKETHROUGH
            .captures(rest)
            .map(|caps| styled(caps, TextStyle::strikethrough())),
        b'!' => IMAGE.captures(rest).map(|caps| {
            let uri = caps.get(2).map_or("", |m| m.as_str().trim());
            (Markup::Image { uri }, whole_len(&caps))
        }),
        b'[' => LINK.captures(rest).map(|caps| {
            let url = caps.get(2).map_or("", |m| m.as_str().trim());
            styled(caps, TextStyle::link(url))
        }),
        _ => None,
    }
}

fn styled<'a>(caps: Captures<'a>, style: TextStyle) -> (Markup<'a>, usize) {
    let inner = caps.get(1).map_or("", |m| m.as_str());
    (Markup::Styled { inner, style }, whole_len(&caps))
}

fn whole_len(caps: &Captures<'_>) -> usize {
    caps.get(0).map_or(0, |m| m.end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::markdown::requests::{Location, Range};

    fn target() -> InsertionPoint {
        InsertionPoint::default()
    }

    fn range(start: usize, end: usize) -> Range {
        target().range(start, end)
    }

    #[test]
    fn test_plain_text_passes_through() {
        let run = parse_inline("hello world", 1, &target());

        assert_eq!(run.text, "hello world");
        assert!(run.requests.is_empty());
        assert_eq!(run.next_index, 12);
    }

    #[test]
    fn test_bold_strips_markers() {
        let run = parse_inline("a **bold** b", 1, &target());

        assert_eq!(run.text, "a bold b");
        assert_eq!(run.requests, vec![Request::text_style(TextStyle::bold(), range(3, 7))]);
    }

    #[test]
    fn test_italic_and_strikethrough() {
        let run = parse_inline("*it* ~~gone~~", 10, &target());

        assert_eq!(run.text, "it gone");
        assert_eq!(
            run.requests,
            vec![
                Request::text_style(TextStyle::italic(), range(10, 12)),
                Request::text_style(TextStyle::strikethrough(), range(13, 17)),
            ]
        );
    }

    #[test]
    fn test_link_wraps_resolved_text() {
        let run = parse_inline("[click](http://x)", 1, &target());

        assert_eq!(run.text, "click");
        assert_eq!(
            run.requests,
            vec![Request::text_style(TextStyle::link("http://x"), range(1, 6))]
        );
    }

    #[test]
    fn test_link_nested_in_bold_keeps_bold() {
        let run = parse_inline("**see [docs](http://d)**", 1, &target());

        assert_eq!(run.text, "see docs");
        assert_eq!(run.requests.len(), 2);
        assert_eq!(run.requests[0], Request::text_style(TextStyle::bold(), range(1, 9)));
        assert_eq!(
            run.requests[1],
            Request::text_style(TextStyle::bold().merge(&TextStyle::link("http://d")), range(5, 9))
        );
    }

    #[test]
    fn test_bold_italic_nests() {
        let run = parse_inline("***both***", 1, &target());

        assert_eq!(run.text, "both");
        assert_eq!(
            run.requests,
            vec![
                Request::text_style(TextStyle::bold(), range(1, 5)),
                Request::text_style(TextStyle::bold().merge(&TextStyle::italic()), range(1, 5)),
            ]
        );
    }

    #[test]
    fn test_image_is_zero_width() {
        let run = parse_inline("a![alt](http://x/y.png)b", 1, &target());

        assert_eq!(run.text, "ab");
        assert_eq!(run.next_index, 3);
        assert_eq!(
            run.requests,
            vec![Request::InsertInlineImage {
                uri: "http://x/y.png".to_string(),
                location: Location {
                    index: 2,
                    segment_id: None,
                    tab_id: None,
                },
            }]
        );
    }

    #[test]
    fn test_unbalanced_markup_is_literal() {
        for input in ["**open", "*", "~~half~", "[text](", "![alt]", "[](x)"] {
            let run = parse_inline(input, 1, &target());
            assert_eq!(run.text, input, "input {input:?}");
            assert!(run.requests.is_empty(), "input {input:?}");
        }
    }

    #[test]
    fn test_indices_count_utf16_units() {
        let run = parse_inline("😀 **ok**", 1, &target());

        assert_eq!(run.next_index, 1 + 2 + 1 + 2);
        assert_eq!(run.requests, vec![Request::text_style(TextStyle::bold(), range(4, 6))]);
    }

    #[test]
    fn test_tab_target_is_carried_into_ranges() {
        let target = InsertionPoint::at(1).with_tab(Some("t.1".to_string()));
        let run = parse_inline("**x**", 1, &target);

        match &run.requests[0] {
            Request::UpdateTextStyle { range, .. } => {
                assert_eq!(range.tab_id.as_deref(), Some("t.1"))
            }
            other => panic!("unexpected request {other:?}"),
        }
    }
}
