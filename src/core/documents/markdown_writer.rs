//! Document → Markdown, the inverse of the compiler.
//!
//! Produces the same dialect the compiler reads, so a document written by
//! the compiler reads back as (close to) the Markdown it came from.

use crate::core::markdown::{ListOrdinals, TextStyle};

use super::document_models::{
    Body, Document, ElementKind, InlineElement, Paragraph, StructuralElement, Table,
};

/// Renders one tab body as Markdown.
pub fn body_to_markdown(body: &Body) -> String {
    let mut writer = MarkdownWriter::default();
    writer.write_elements(&body.content);
    writer.finish()
}

/// Renders every tab, each introduced by a heading carrying its title.
pub fn all_tabs_to_markdown(document: &Document) -> String {
    let mut sections = Vec::new();
    for (depth, tab) in document.flatten_tabs() {
        let heading = format!("{} {}", "#".repeat((depth + 1).min(6)), tab.title);
        let body = body_to_markdown(&tab.body);
        if body.is_empty() {
            sections.push(heading);
        } else {
            sections.push(format!("{}\n\n{}", heading, body));
        }
    }
    sections.join("\n\n")
}

struct Block {
    text: String,
    list_item: bool,
}

#[derive(Default)]
struct MarkdownWriter {
    blocks: Vec<Block>,
    ordinals: ListOrdinals,
}

impl MarkdownWriter {
    fn write_elements(&mut self, elements: &[StructuralElement]) {
        for element in elements {
            match &element.kind {
                ElementKind::Paragraph(paragraph) => self.write_paragraph(paragraph),
                ElementKind::Table(table) => {
                    if let Some(text) = render_table(table) {
                        self.push(text, false);
                    }
                }
                // The body always opens with a section break; neither it nor a
                // generated table of contents has a Markdown form.
                ElementKind::SectionBreak | ElementKind::TableOfContents(_) => {}
            }
        }
    }

    fn write_paragraph(&mut self, paragraph: &Paragraph) {
        // Page breaks sit inside paragraphs; split around them.
        let mut segment: Vec<&InlineElement> = Vec::new();
        for element in &paragraph.elements {
            if matches!(element, InlineElement::PageBreak) {
                self.write_segment(paragraph, &segment);
                segment.clear();
                self.push("---".to_string(), false);
            } else {
                segment.push(element);
            }
        }
        self.write_segment(paragraph, &segment);
    }

    fn write_segment(&mut self, paragraph: &Paragraph, elements: &[&InlineElement]) {
        let text = render_inline(elements);
        let text = text.trim_end();
        if text.trim().is_empty() {
            return;
        }

        if let Some(level) = paragraph.style.heading_level() {
            self.push(format!("{} {}", "#".repeat(level), text.trim_start()), false);
        } else if let Some(bullet) = &paragraph.bullet {
            let indent = "  ".repeat(bullet.nesting_level);
            let marker = if bullet.ordered {
                format!("{}.", self.ordinals.next(&bullet.list_id, bullet.nesting_level))
            } else {
                "-".to_string()
            };
            self.push(format!("{}{} {}", indent, marker, text.trim_start()), true);
        } else {
            self.push(text.to_string(), false);
        }
    }

    fn push(&mut self, text: String, list_item: bool) {
        self.blocks.push(Block { text, list_item });
    }

    fn finish(self) -> String {
        let mut out = String::new();
        let mut previous_was_list = false;
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                out.push_str(if previous_was_list && block.list_item {
                    "\n"
                } else {
                    "\n\n"
                });
            }
            out.push_str(&block.text);
            previous_was_list = block.list_item;
        }
        out
    }
}

fn render_inline(elements: &[&InlineElement]) -> String {
    let mut out = String::new();
    for element in elements {
        match element {
            InlineElement::TextRun { content, style } => {
                // Vertical tab is the Docs soft line break.
                let text: String = content
                    .chars()
                    .filter(|c| *c != '\n')
                    .map(|c| if c == '\u{000b}' { ' ' } else { c })
                    .collect();
                out.push_str(&wrap_style(&text, style));
            }
            InlineElement::InlineImage { url: Some(url), .. } => {
                out.push_str(&format!("![image]({})", url));
            }
            InlineElement::InlineImage { url: None, .. } | InlineElement::PageBreak => {}
        }
    }
    out
}

/// Wraps the non-whitespace core of `text` in the markers for `style`.
fn wrap_style(text: &str, style: &TextStyle) -> String {
    let core = text.trim();
    if core.is_empty() || style.is_plain() {
        return text.to_string();
    }

    let leading = &text[..text.len() - text.trim_start().len()];
    let trailing = &text[text.trim_end().len()..];

    let mut wrapped = core.to_string();
    if let Some(url) = style.link_url() {
        wrapped = format!("[{}]({})", wrapped, url);
    }
    if style.strikethrough {
        wrapped = format!("~~{}~~", wrapped);
    }
    if style.italic {
        wrapped = format!("*{}*", wrapped);
    }
    if style.bold {
        wrapped = format!("**{}**", wrapped);
    }
    format!("{}{}{}", leading, wrapped, trailing)
}

fn render_table(table: &Table) -> Option<String> {
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.cells.iter().map(|cell| render_cell(&cell.content)).collect())
        .collect();
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return None;
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (i, row) in rows.iter().enumerate() {
        let mut cells = row.clone();
        cells.resize(columns, String::new());
        lines.push(format!("| {} |", cells.join(" | ")));
        if i == 0 {
            lines.push(format!("|{}", " --- |".repeat(columns)));
        }
    }
    Some(lines.join("\n"))
}

fn render_cell(content: &[StructuralElement]) -> String {
    let mut parts = Vec::new();
    for element in content {
        if let ElementKind::Paragraph(paragraph) = &element.kind {
            let elements: Vec<&InlineElement> = paragraph.elements.iter().collect();
            let text = render_inline(&elements);
            let text = text.trim();
            if !text.is_empty() {
                parts.push(text.to_string());
            }
        }
    }
    parts.join(" ")
}
