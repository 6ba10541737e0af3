// =============================================================================
// GOOGLE DOCS / DRIVE API RESPONSE STRUCTURES
// =============================================================================
//
// Wire shapes of the responses we read, converted into the core document
// model. Everything the conversion doesn't need is left out; serde ignores
// unknown fields.
//
// Images and list glyphs are not stored inline: paragraphs reference
// `inlineObjects` and `lists` side tables, keyed by id, that live next to the
// body (per tab, or at the document root for tab-less responses).

use std::collections::HashMap;

use serde::Deserialize;

use crate::core::documents::{
    BatchUpdateOutcome, Body, Bullet, Comment, CommentReply, Document, ElementKind,
    InlineElement, Paragraph, StructuralElement, Tab, Table, TableCell, TableRow,
};
use crate::core::markdown::{NamedStyleType, TextStyle};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDocument {
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    tabs: Vec<ApiTab>,
    // Legacy single-tab fields, present when tabs content isn't requested.
    body: Option<ApiBody>,
    #[serde(default)]
    inline_objects: HashMap<String, InlineObject>,
    #[serde(default)]
    lists: HashMap<String, ApiList>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTab {
    tab_properties: TabProperties,
    document_tab: Option<DocumentTab>,
    #[serde(default)]
    child_tabs: Vec<ApiTab>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TabProperties {
    tab_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentTab {
    body: Option<ApiBody>,
    #[serde(default)]
    inline_objects: HashMap<String, InlineObject>,
    #[serde(default)]
    lists: HashMap<String, ApiList>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiBody {
    #[serde(default)]
    content: Vec<ApiStructuralElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiStructuralElement {
    // The leading section break has no startIndex.
    #[serde(default)]
    start_index: usize,
    #[serde(default)]
    end_index: usize,
    paragraph: Option<ApiParagraph>,
    table: Option<ApiTable>,
    section_break: Option<serde_json::Value>,
    table_of_contents: Option<ApiTableOfContents>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiParagraph {
    #[serde(default)]
    elements: Vec<ApiParagraphElement>,
    paragraph_style: Option<ApiParagraphStyle>,
    bullet: Option<ApiBullet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiParagraphStyle {
    named_style_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiBullet {
    list_id: String,
    #[serde(default)]
    nesting_level: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiParagraphElement {
    text_run: Option<ApiTextRun>,
    inline_object_element: Option<ApiInlineObjectElement>,
    page_break: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTextRun {
    #[serde(default)]
    content: String,
    #[serde(default)]
    text_style: TextStyle,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiInlineObjectElement {
    inline_object_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTable {
    #[serde(default)]
    table_rows: Vec<ApiTableRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTableRow {
    #[serde(default)]
    table_cells: Vec<ApiTableCell>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTableCell {
    #[serde(default)]
    content: Vec<ApiStructuralElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTableOfContents {
    #[serde(default)]
    content: Vec<ApiStructuralElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineObject {
    inline_object_properties: Option<InlineObjectProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineObjectProperties {
    embedded_object: Option<EmbeddedObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddedObject {
    image_properties: Option<ImageProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageProperties {
    content_uri: Option<String>,
    source_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiList {
    list_properties: Option<ListProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListProperties {
    #[serde(default)]
    nesting_levels: Vec<NestingLevel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NestingLevel {
    glyph_type: Option<String>,
}

// =============================================================================
// CONVERSION
// =============================================================================

/// Side tables a body's paragraphs refer to.
struct Lookups<'a> {
    inline_objects: &'a HashMap<String, InlineObject>,
    lists: &'a HashMap<String, ApiList>,
}

impl Lookups<'_> {
    fn image_url(&self, object_id: &str) -> Option<String> {
        let image = self
            .inline_objects
            .get(object_id)?
            .inline_object_properties
            .as_ref()?
            .embedded_object
            .as_ref()?
            .image_properties
            .as_ref()?;
        image.source_uri.clone().or_else(|| image.content_uri.clone())
    }

    /// Numbered lists have a glyph type; symbol lists only a glyph symbol.
    fn is_ordered(&self, list_id: &str, level: usize) -> bool {
        self.lists
            .get(list_id)
            .and_then(|list| list.list_properties.as_ref())
            .and_then(|props| props.nesting_levels.get(level))
            .and_then(|level| level.glyph_type.as_deref())
            .map(|glyph| !matches!(glyph, "GLYPH_TYPE_UNSPECIFIED" | "NONE"))
            .unwrap_or(false)
    }
}

impl ApiDocument {
    pub fn into_document(self) -> Document {
        let tabs = if self.tabs.is_empty() {
            // Tab-less response: one synthetic tab without an id.
            let lookups = Lookups {
                inline_objects: &self.inline_objects,
                lists: &self.lists,
            };
            vec![Tab {
                tab_id: String::new(),
                title: self.title.clone(),
                index: 0,
                body: self
                    .body
                    .as_ref()
                    .map(|body| convert_body(body, &lookups))
                    .unwrap_or_default(),
                child_tabs: Vec::new(),
            }]
        } else {
            self.tabs.iter().map(convert_tab).collect()
        };

        Document {
            document_id: self.document_id,
            title: self.title,
            tabs,
        }
    }
}

fn convert_tab(tab: &ApiTab) -> Tab {
    let empty_objects = HashMap::new();
    let empty_lists = HashMap::new();
    let (body, lookups) = match &tab.document_tab {
        Some(doc_tab) => (
            doc_tab.body.as_ref(),
            Lookups {
                inline_objects: &doc_tab.inline_objects,
                lists: &doc_tab.lists,
            },
        ),
        None => (
            None,
            Lookups {
                inline_objects: &empty_objects,
                lists: &empty_lists,
            },
        ),
    };

    Tab {
        tab_id: tab.tab_properties.tab_id.clone(),
        title: tab.tab_properties.title.clone(),
        index: tab.tab_properties.index,
        body: body
            .map(|body| convert_body(body, &lookups))
            .unwrap_or_default(),
        child_tabs: tab.child_tabs.iter().map(convert_tab).collect(),
    }
}

fn convert_body(body: &ApiBody, lookups: &Lookups<'_>) -> Body {
    Body {
        content: convert_elements(&body.content, lookups),
    }
}

fn convert_elements(
    elements: &[ApiStructuralElement],
    lookups: &Lookups<'_>,
) -> Vec<StructuralElement> {
    elements
        .iter()
        .filter_map(|element| {
            let kind = if let Some(paragraph) = &element.paragraph {
                ElementKind::Paragraph(convert_paragraph(paragraph, lookups))
            } else if let Some(table) = &element.table {
                ElementKind::Table(convert_table(table, lookups))
            } else if let Some(toc) = &element.table_of_contents {
                ElementKind::TableOfContents(convert_elements(&toc.content, lookups))
            } else if element.section_break.is_some() {
                ElementKind::SectionBreak
            } else {
                return None;
            };
            Some(StructuralElement {
                start_index: element.start_index,
                end_index: element.end_index,
                kind,
            })
        })
        .collect()
}

fn convert_paragraph(paragraph: &ApiParagraph, lookups: &Lookups<'_>) -> Paragraph {
    let style = paragraph
        .paragraph_style
        .as_ref()
        .and_then(|style| style.named_style_type.as_deref())
        .map(named_style)
        .unwrap_or(NamedStyleType::NormalText);

    let bullet = paragraph.bullet.as_ref().map(|bullet| Bullet {
        list_id: bullet.list_id.clone(),
        nesting_level: bullet.nesting_level,
        ordered: lookups.is_ordered(&bullet.list_id, bullet.nesting_level),
    });

    let elements = paragraph
        .elements
        .iter()
        .filter_map(|element| {
            if let Some(run) = &element.text_run {
                Some(InlineElement::TextRun {
                    content: run.content.clone(),
                    style: run.text_style.clone(),
                })
            } else if let Some(object) = &element.inline_object_element {
                Some(InlineElement::InlineImage {
                    object_id: object.inline_object_id.clone(),
                    url: lookups.image_url(&object.inline_object_id),
                })
            } else if element.page_break.is_some() {
                Some(InlineElement::PageBreak)
            } else {
                None
            }
        })
        .collect();

    Paragraph {
        style,
        bullet,
        elements,
    }
}

fn convert_table(table: &ApiTable, lookups: &Lookups<'_>) -> Table {
    Table {
        rows: table
            .table_rows
            .iter()
            .map(|row| TableRow {
                cells: row
                    .table_cells
                    .iter()
                    .map(|cell| TableCell {
                        content: convert_elements(&cell.content, lookups),
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn named_style(name: &str) -> NamedStyleType {
    match name {
        "TITLE" => NamedStyleType::Title,
        "SUBTITLE" => NamedStyleType::Subtitle,
        "HEADING_1" => NamedStyleType::Heading1,
        "HEADING_2" => NamedStyleType::Heading2,
        "HEADING_3" => NamedStyleType::Heading3,
        "HEADING_4" => NamedStyleType::Heading4,
        "HEADING_5" => NamedStyleType::Heading5,
        "HEADING_6" => NamedStyleType::Heading6,
        _ => NamedStyleType::NormalText,
    }
}

// =============================================================================
// BATCH UPDATE RESPONSE
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBatchUpdateResponse {
    #[serde(default)]
    document_id: String,
    #[serde(default)]
    replies: Vec<ApiReply>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiReply {
    replace_all_text: Option<ReplaceAllTextReply>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplaceAllTextReply {
    #[serde(default)]
    occurrences_changed: u64,
}

impl ApiBatchUpdateResponse {
    pub fn into_outcome(self) -> BatchUpdateOutcome {
        BatchUpdateOutcome {
            occurrences_changed: self
                .replies
                .iter()
                .filter_map(|reply| reply.replace_all_text.as_ref())
                .map(|reply| reply.occurrences_changed)
                .sum(),
            replies: self.replies.len(),
            document_id: self.document_id,
        }
    }
}

// =============================================================================
// DRIVE COMMENTS
// =============================================================================

/// Fields requested from the Drive comments endpoint.
pub const COMMENT_FIELDS: &str = "id,content,quotedFileContent,resolved,createdTime,\
author(displayName),replies(content,author(displayName))";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCommentList {
    #[serde(default)]
    pub comments: Vec<ApiComment>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiComment {
    id: String,
    #[serde(default)]
    content: String,
    author: Option<ApiUser>,
    quoted_file_content: Option<QuotedFileContent>,
    #[serde(default)]
    resolved: bool,
    created_time: Option<String>,
    #[serde(default)]
    replies: Vec<ApiCommentReply>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUser {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuotedFileContent {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCommentReply {
    #[serde(default)]
    content: String,
    author: Option<ApiUser>,
}

impl ApiComment {
    pub fn into_comment(self) -> Comment {
        Comment {
            comment_id: self.id,
            author: self.author.and_then(|a| a.display_name),
            content: self.content,
            quoted_text: self.quoted_file_content.and_then(|q| q.value),
            resolved: self.resolved,
            created_time: self.created_time,
            replies: self
                .replies
                .into_iter()
                .map(|reply| CommentReply {
                    author: reply.author.and_then(|a| a.display_name),
                    content: reply.content,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tabbed_response() -> serde_json::Value {
        json!({
            "documentId": "doc1",
            "title": "Launch plan",
            "tabs": [{
                "tabProperties": {"tabId": "t.0", "title": "Overview", "index": 0},
                "documentTab": {
                    "body": {"content": [
                        {"endIndex": 1, "sectionBreak": {"sectionStyle": {}}},
                        {"startIndex": 1, "endIndex": 7, "paragraph": {
                            "elements": [{"startIndex": 1, "endIndex": 7,
                                "textRun": {"content": "Goals\n", "textStyle": {}}}],
                            "paragraphStyle": {"namedStyleType": "HEADING_1"}
                        }},
                        {"startIndex": 7, "endIndex": 12, "paragraph": {
                            "elements": [
                                {"startIndex": 7, "endIndex": 11,
                                    "textRun": {"content": "ship", "textStyle": {"bold": true}}},
                                {"startIndex": 11, "endIndex": 12,
                                    "inlineObjectElement": {"inlineObjectId": "kix.img1"}}
                            ],
                            "paragraphStyle": {"namedStyleType": "NORMAL_TEXT"},
                            "bullet": {"listId": "kix.list1"}
                        }}
                    ]},
                    "inlineObjects": {"kix.img1": {"inlineObjectProperties": {"embeddedObject": {
                        "imageProperties": {"contentUri": "https://lh3.example/img"}
                    }}}},
                    "lists": {"kix.list1": {"listProperties": {"nestingLevels": [
                        {"glyphType": "DECIMAL"}, {"glyphSymbol": "○"}
                    ]}}}
                },
                "childTabs": [{
                    "tabProperties": {"tabId": "t.1", "title": "Notes", "index": 0},
                    "documentTab": {"body": {"content": []}}
                }]
            }]
        })
    }

    #[test]
    fn test_converts_tabbed_document() {
        let api: ApiDocument = serde_json::from_value(tabbed_response()).unwrap();
        let document = api.into_document();

        assert_eq!(document.document_id, "doc1");
        assert_eq!(document.tabs.len(), 1);
        assert_eq!(document.tabs[0].child_tabs[0].title, "Notes");

        let body = &document.tabs[0].body;
        assert_eq!(body.end_index(), 12);
        assert_eq!(body.content[0].kind, ElementKind::SectionBreak);

        let ElementKind::Paragraph(heading) = &body.content[1].kind else {
            panic!("expected a paragraph");
        };
        assert_eq!(heading.style, NamedStyleType::Heading1);

        let ElementKind::Paragraph(item) = &body.content[2].kind else {
            panic!("expected a paragraph");
        };
        assert_eq!(
            item.bullet,
            Some(Bullet {
                list_id: "kix.list1".to_string(),
                nesting_level: 0,
                ordered: true,
            })
        );
        assert_eq!(
            item.elements[0],
            InlineElement::TextRun {
                content: "ship".to_string(),
                style: TextStyle::bold(),
            }
        );
        assert_eq!(
            item.elements[1],
            InlineElement::InlineImage {
                object_id: "kix.img1".to_string(),
                url: Some("https://lh3.example/img".to_string()),
            }
        );
    }

    #[test]
    fn test_symbol_levels_are_unordered() {
        let lists: HashMap<String, ApiList> = serde_json::from_value(json!({
            "l": {"listProperties": {"nestingLevels": [
                {"glyphType": "DECIMAL"}, {"glyphSymbol": "●"}, {"glyphType": "GLYPH_TYPE_UNSPECIFIED"}
            ]}}
        }))
        .unwrap();
        let objects = HashMap::new();
        let lookups = Lookups {
            inline_objects: &objects,
            lists: &lists,
        };

        assert!(lookups.is_ordered("l", 0));
        assert!(!lookups.is_ordered("l", 1));
        assert!(!lookups.is_ordered("l", 2));
        assert!(!lookups.is_ordered("missing", 0));
    }

    #[test]
    fn test_legacy_body_becomes_synthetic_tab() {
        let api: ApiDocument = serde_json::from_value(json!({
            "documentId": "old",
            "title": "Old doc",
            "body": {"content": [
                {"startIndex": 1, "endIndex": 4, "paragraph": {
                    "elements": [{"textRun": {"content": "hi\n"}}, {"pageBreak": {}}]
                }}
            ]}
        }))
        .unwrap();
        let document = api.into_document();

        assert_eq!(document.tabs.len(), 1);
        assert_eq!(document.tabs[0].tab_id, "");
        assert_eq!(document.tabs[0].title, "Old doc");
        let ElementKind::Paragraph(paragraph) = &document.tabs[0].body.content[0].kind else {
            panic!("expected a paragraph");
        };
        assert_eq!(paragraph.style, NamedStyleType::NormalText);
        assert_eq!(paragraph.elements[1], InlineElement::PageBreak);
    }

    #[test]
    fn test_batch_update_sums_replace_replies() {
        let response: ApiBatchUpdateResponse = serde_json::from_value(json!({
            "documentId": "doc1",
            "replies": [
                {"replaceAllText": {"occurrencesChanged": 3}},
                {},
                {"replaceAllText": {}}
            ],
            "writeControl": {"requiredRevisionId": "abc"}
        }))
        .unwrap();
        let outcome = response.into_outcome();

        assert_eq!(outcome.document_id, "doc1");
        assert_eq!(outcome.replies, 3);
        assert_eq!(outcome.occurrences_changed, 3);
    }

    #[test]
    fn test_comment_conversion() {
        let list: ApiCommentList = serde_json::from_value(json!({
            "comments": [{
                "id": "c1",
                "content": "Typo here",
                "author": {"displayName": "Ada"},
                "quotedFileContent": {"mimeType": "text/html", "value": "teh"},
                "createdTime": "2024-05-01T10:00:00.000Z",
                "replies": [{"content": "Fixed", "author": {"displayName": "Bob"}}]
            }]
        }))
        .unwrap();
        assert!(list.next_page_token.is_none());

        let comment = list.comments.into_iter().next().unwrap().into_comment();
        assert_eq!(comment.comment_id, "c1");
        assert_eq!(comment.author.as_deref(), Some("Ada"));
        assert_eq!(comment.quoted_text.as_deref(), Some("teh"));
        assert!(!comment.resolved);
        assert_eq!(comment.replies[0].author.as_deref(), Some("Bob"));
    }
}
