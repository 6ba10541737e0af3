use serde::Serialize;

use crate::core::markdown::{NamedStyleType, TextStyle};

/// A Google Doc reduced to what the actions need: identity and tab tree.
///
/// Documents without tabs are represented with a single synthetic tab whose
/// `tab_id` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub document_id: String,
    pub title: String,
    pub tabs: Vec<Tab>,
}

impl Document {
    pub fn url(&self) -> String {
        document_url(&self.document_id)
    }

    pub fn first_tab(&self) -> Option<&Tab> {
        self.tabs.first()
    }

    /// Finds a tab anywhere in the tree by id, or by case-insensitive title.
    pub fn find_tab(&self, id_or_title: &str) -> Option<&Tab> {
        self.flatten_tabs()
            .into_iter()
            .map(|(_, tab)| tab)
            .find(|tab| tab.tab_id == id_or_title)
            .or_else(|| {
                self.flatten_tabs()
                    .into_iter()
                    .map(|(_, tab)| tab)
                    .find(|tab| tab.title.eq_ignore_ascii_case(id_or_title))
            })
    }

    pub fn tab_summaries(&self) -> Vec<TabSummary> {
        self.flatten_tabs()
            .into_iter()
            .map(|(depth, tab)| TabSummary {
                tab_id: tab.tab_id.clone(),
                title: tab.title.clone(),
                depth,
            })
            .collect()
    }

    /// Every tab in display order, paired with its nesting depth.
    pub fn flatten_tabs(&self) -> Vec<(usize, &Tab)> {
        fn walk<'a>(tabs: &'a [Tab], depth: usize, out: &mut Vec<(usize, &'a Tab)>) {
            for tab in tabs {
                out.push((depth, tab));
                walk(&tab.child_tabs, depth + 1, out);
            }
        }

        let mut out = Vec::new();
        walk(&self.tabs, 0, &mut out);
        out
    }
}

pub fn document_url(document_id: &str) -> String {
    format!("https://docs.google.com/document/d/{}/edit", document_id)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    pub tab_id: String,
    pub title: String,
    pub index: usize,
    pub body: Body,
    pub child_tabs: Vec<Tab>,
}

impl Tab {
    /// Tab id to put in request locations; `None` for the synthetic tab.
    pub fn request_tab_id(&self) -> Option<String> {
        (!self.tab_id.is_empty()).then(|| self.tab_id.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub content: Vec<StructuralElement>,
}

impl Body {
    /// Body length + 1; a body always ends with a paragraph break.
    pub fn end_index(&self) -> usize {
        self.content
            .last()
            .map(|element| element.end_index)
            .unwrap_or(1)
    }

    /// Index where appended content goes: just before the final paragraph break.
    pub fn append_index(&self) -> usize {
        self.end_index().saturating_sub(1).max(1)
    }

    /// Whether anything precedes the body's final, empty paragraph break.
    pub fn has_text(&self) -> bool {
        self.end_index() > 2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructuralElement {
    pub start_index: usize,
    pub end_index: usize,
    pub kind: ElementKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Paragraph(Paragraph),
    Table(Table),
    SectionBreak,
    TableOfContents(Vec<StructuralElement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub style: NamedStyleType,
    pub bullet: Option<Bullet>,
    pub elements: Vec<InlineElement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bullet {
    pub list_id: String,
    pub nesting_level: usize,
    /// Resolved from the document's list definitions (numbered glyph vs symbol).
    pub ordered: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InlineElement {
    TextRun {
        content: String,
        style: TextStyle,
    },
    InlineImage {
        object_id: String,
        /// `contentUri` from the document's inline object table, if present.
        url: Option<String>,
    },
    PageBreak,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCell {
    pub content: Vec<StructuralElement>,
}

/// A Drive comment on a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub comment_id: String,
    pub author: Option<String>,
    pub content: String,
    pub quoted_text: Option<String>,
    pub resolved: bool,
    pub created_time: Option<String>,
    pub replies: Vec<CommentReply>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentReply {
    pub author: Option<String>,
    pub content: String,
}

/// What a `batchUpdate` call reported back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchUpdateOutcome {
    pub document_id: String,
    pub replies: usize,
    pub occurrences_changed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabSummary {
    pub tab_id: String,
    pub title: String,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub document_id: String,
    pub title: String,
    pub url: String,
    pub requests_applied: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentContent {
    pub document_id: String,
    pub title: String,
    pub url: String,
    /// Tab the Markdown was read from; `None` when every tab was read.
    pub tab_id: Option<String>,
    pub tabs: Vec<TabSummary>,
    pub markdown: String,
}
