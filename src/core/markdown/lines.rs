//! Line classification and the per-line compiler.

use std::sync::LazyLock;

use regex::Regex;

use super::inline::parse_inline;
use super::lists::{ListItemSpan, ListKind};
use super::requests::{utf16_len, InsertionPoint, NamedStyleType, Request};

static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").unwrap());
static BULLETED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-\s+(.*)$").unwrap());
static NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s*(.*)$").unwrap());

/// Spaces per list nesting level.
const INDENT_WIDTH: usize = 2;

/// Block type of a single logical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    PageBreak,
    Heading {
        style: NamedStyleType,
        text: &'a str,
    },
    ListItem {
        kind: ListKind,
        level: usize,
        text: &'a str,
    },
    Paragraph(&'a str),
}

/// Classifies a line. Anything unrecognised is a plain paragraph.
pub fn classify(line: &str) -> LineKind<'_> {
    let line = line.trim_end();
    let trimmed = line.trim_start();

    if trimmed.starts_with("---") {
        return LineKind::PageBreak;
    }

    if let Some(caps) = HEADING.captures(trimmed) {
        let level = caps.get(1).map_or(0, |m| m.as_str().len());
        if let Some(style) = NamedStyleType::heading(level) {
            let text = caps.get(2).map_or("", |m| m.as_str());
            return LineKind::Heading { style, text };
        }
    }

    let level = indent_width(line) / INDENT_WIDTH;
    if let Some(caps) = BULLETED.captures(trimmed) {
        return LineKind::ListItem {
            kind: ListKind::Bulleted,
            level,
            text: caps.get(1).map_or("", |m| m.as_str()),
        };
    }
    if let Some(caps) = NUMBERED.captures(trimmed) {
        return LineKind::ListItem {
            kind: ListKind::Numbered,
            level,
            text: caps.get(1).map_or("", |m| m.as_str()),
        };
    }

    LineKind::Paragraph(trimmed)
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { INDENT_WIDTH } else { 1 })
        .sum()
}

/// Requests produced by one line, split by the stream they belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineOutput {
    /// The `InsertText` or `InsertPageBreak` for the line, if it inserts anything.
    pub insert: Option<Request>,
    /// Paragraph and text style requests, in scan order.
    pub styles: Vec<Request>,
    /// `InsertInlineImage` requests; images are zero-width in index space.
    pub images: Vec<Request>,
    /// Set for list items; handed to the list-run tracker by the caller.
    pub list_item: Option<ListItemSpan>,
    /// Index right after everything this line inserted.
    pub next_index: usize,
}

/// Compiles one logical line starting at `start_index`.
///
/// With `terminate` set the inserted text ends with a paragraph break; style
/// ranges never include it. Page breaks ignore `terminate` and always take
/// exactly one index.
pub fn compile_line(
    line: &str,
    start_index: usize,
    terminate: bool,
    target: &InsertionPoint,
) -> LineOutput {
    let kind = classify(line);

    if kind == LineKind::PageBreak {
        return LineOutput {
            insert: Some(Request::InsertPageBreak {
                location: target.location(start_index),
            }),
            next_index: start_index + 1,
            ..LineOutput::default()
        };
    }

    // Nested list items carry one leading tab per level; the Docs API turns
    // those into the nesting level when the bullets are created.
    let (prefix, text) = match kind {
        LineKind::Heading { text, .. } | LineKind::Paragraph(text) => (String::new(), text),
        LineKind::ListItem { level, text, .. } => ("\t".repeat(level), text),
        LineKind::PageBreak => (String::new(), ""),
    };

    let inline_start = start_index + utf16_len(&prefix);
    let run = parse_inline(text, inline_start, target);
    let text_end = run.next_index;

    let mut output = LineOutput::default();
    let mut content = prefix;
    content.push_str(&run.text);

    if let LineKind::Heading { style, .. } = kind {
        if text_end > inline_start {
            output
                .styles
                .push(Request::named_style(style, target.range(inline_start, text_end)));
        }
    }

    for request in run.requests {
        match request {
            Request::InsertInlineImage { .. } => output.images.push(request),
            other => output.styles.push(other),
        }
    }

    if let LineKind::ListItem { kind, .. } = kind {
        output.list_item = Some(ListItemSpan {
            kind,
            start_index,
            end_index: text_end,
        });
    }

    output.next_index = text_end;
    if terminate {
        content.push('\n');
        output.next_index += 1;
    }
    if !content.is_empty() {
        output.insert = Some(Request::insert_text(content, target.location(start_index)));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::markdown::requests::TextStyle;

    fn target() -> InsertionPoint {
        InsertionPoint::default()
    }

    #[test]
    fn test_classify_page_break() {
        assert_eq!(classify("---"), LineKind::PageBreak);
        assert_eq!(classify("  -----  "), LineKind::PageBreak);
    }

    #[test]
    fn test_classify_headings() {
        assert_eq!(
            classify("### Section"),
            LineKind::Heading {
                style: NamedStyleType::Heading3,
                text: "Section",
            }
        );
        assert_eq!(classify("####### seven"), LineKind::Paragraph("####### seven"));
        assert_eq!(classify("#hashtag"), LineKind::Paragraph("#hashtag"));
    }

    #[test]
    fn test_classify_list_items() {
        assert_eq!(
            classify("- item"),
            LineKind::ListItem {
                kind: ListKind::Bulleted,
                level: 0,
                text: "item",
            }
        );
        assert_eq!(
            classify("    12. twelfth"),
            LineKind::ListItem {
                kind: ListKind::Numbered,
                level: 2,
                text: "twelfth",
            }
        );
    }

    #[test]
    fn test_classify_paragraph_fallback() {
        assert_eq!(classify("just text  "), LineKind::Paragraph("just text"));
        assert_eq!(classify("-dash"), LineKind::Paragraph("-dash"));
    }

    #[test]
    fn test_heading_style_spans_text_only() {
        let output = compile_line("# Title", 1, true, &target());

        assert_eq!(
            output.insert,
            Some(Request::insert_text("Title\n", target().location(1)))
        );
        assert_eq!(
            output.styles,
            vec![Request::named_style(NamedStyleType::Heading1, target().range(1, 6))]
        );
        assert_eq!(output.next_index, 7);
    }

    #[test]
    fn test_page_break_takes_one_index() {
        let output = compile_line("---", 4, true, &target());

        assert_eq!(
            output.insert,
            Some(Request::InsertPageBreak {
                location: target().location(4)
            })
        );
        assert!(output.styles.is_empty());
        assert_eq!(output.next_index, 5);
    }

    #[test]
    fn test_list_item_reports_span() {
        let output = compile_line("- **a**b", 10, false, &target());

        assert_eq!(
            output.insert,
            Some(Request::insert_text("ab", target().location(10)))
        );
        assert_eq!(
            output.styles,
            vec![Request::text_style(TextStyle::bold(), target().range(10, 11))]
        );
        assert_eq!(
            output.list_item,
            Some(ListItemSpan {
                kind: ListKind::Bulleted,
                start_index: 10,
                end_index: 12,
            })
        );
    }

    #[test]
    fn test_nested_list_item_gets_tab_prefix() {
        let output = compile_line("  - *deep*", 1, false, &target());

        assert_eq!(
            output.insert,
            Some(Request::insert_text("\tdeep", target().location(1)))
        );
        assert_eq!(
            output.styles,
            vec![Request::text_style(TextStyle::italic(), target().range(2, 6))]
        );
        assert_eq!(output.next_index, 6);
    }

    #[test]
    fn test_image_only_line_inserts_no_text() {
        let output = compile_line("![logo](http://x/l.png)", 3, false, &target());

        assert!(output.insert.is_none());
        assert_eq!(output.images.len(), 1);
        assert_eq!(output.next_index, 3);
    }
}
