// This file provides an IN-MEMORY implementation of DocsApi.
//
// It backs dry runs (`DOCS_ACTIONS_DRY_RUN=true`) and the service tests:
// documents live in a DashMap, every batch is recorded as sent, and
// `ReplaceAllText` is applied to text runs so replacements can be observed.
// Other requests are recorded only; their effect on the body is not modelled.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use regex::{NoExpand, RegexBuilder};

use crate::core::documents::{
    BatchUpdateOutcome, Body, Comment, DocsApi, Document, DocumentError, ElementKind,
    InlineElement, Paragraph, StructuralElement, Tab,
};
use crate::core::markdown::{NamedStyleType, Request};

/// Cloning shares the underlying maps.
#[derive(Clone, Default)]
pub struct InMemoryDocsApi {
    documents: Arc<DashMap<String, Document>>,
    batches: Arc<DashMap<String, Vec<Vec<Request>>>>,
    comments: Arc<DashMap<String, Vec<Comment>>>,
    next_id: Arc<AtomicUsize>,
}

impl InMemoryDocsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or overwrites) a document.
    pub fn insert_document(&self, document: Document) {
        self.documents
            .insert(document.document_id.clone(), document);
    }

    /// Batches sent to a document, oldest first.
    pub fn batches(&self, document_id: &str) -> Vec<Vec<Request>> {
        self.batches
            .get(document_id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", prefix, n)
    }

    fn not_found(document_id: &str) -> DocumentError {
        DocumentError::Api(format!("404 Not Found: document {}", document_id))
    }
}

/// A new document's body: the leading section break plus one empty paragraph.
fn empty_body() -> Body {
    Body {
        content: vec![
            StructuralElement {
                start_index: 0,
                end_index: 1,
                kind: ElementKind::SectionBreak,
            },
            StructuralElement {
                start_index: 1,
                end_index: 2,
                kind: ElementKind::Paragraph(Paragraph {
                    style: NamedStyleType::NormalText,
                    bullet: None,
                    elements: vec![InlineElement::TextRun {
                        content: "\n".to_string(),
                        style: Default::default(),
                    }],
                }),
            },
        ],
    }
}

#[async_trait]
impl DocsApi for InMemoryDocsApi {
    async fn get_document(&self, document_id: &str) -> Result<Document, DocumentError> {
        self.documents
            .get(document_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| Self::not_found(document_id))
    }

    async fn create_document(&self, title: &str) -> Result<Document, DocumentError> {
        let document = Document {
            document_id: self.next_id("dry-run-doc"),
            title: title.to_string(),
            tabs: vec![Tab {
                tab_id: "t.0".to_string(),
                title: "Tab 1".to_string(),
                index: 0,
                body: empty_body(),
                child_tabs: Vec::new(),
            }],
        };
        self.insert_document(document.clone());
        tracing::debug!("Created in-memory document {}", document.document_id);
        Ok(document)
    }

    async fn batch_update(
        &self,
        document_id: &str,
        requests: &[Request],
    ) -> Result<BatchUpdateOutcome, DocumentError> {
        let mut document = self
            .documents
            .get_mut(document_id)
            .ok_or_else(|| Self::not_found(document_id))?;

        let mut occurrences_changed = 0;
        for request in requests {
            if let Request::ReplaceAllText {
                replace_text,
                contains_text,
                tabs_criteria,
            } = request
            {
                let tab_ids = tabs_criteria.as_ref().map(|c| c.tab_ids.as_slice());
                occurrences_changed += replace_in_tabs(
                    &mut document.tabs,
                    &contains_text.text,
                    replace_text,
                    contains_text.match_case,
                    tab_ids,
                )?;
            }
        }
        drop(document);

        self.batches
            .entry(document_id.to_string())
            .or_default()
            .push(requests.to_vec());

        Ok(BatchUpdateOutcome {
            document_id: document_id.to_string(),
            replies: requests.len(),
            occurrences_changed,
        })
    }

    async fn list_comments(&self, document_id: &str) -> Result<Vec<Comment>, DocumentError> {
        if !self.documents.contains_key(document_id) {
            return Err(Self::not_found(document_id));
        }
        Ok(self
            .comments
            .get(document_id)
            .map(|entry| entry.clone())
            .unwrap_or_default())
    }

    async fn create_comment(
        &self,
        document_id: &str,
        content: &str,
    ) -> Result<Comment, DocumentError> {
        if !self.documents.contains_key(document_id) {
            return Err(Self::not_found(document_id));
        }
        let comment = Comment {
            comment_id: self.next_id("comment"),
            author: Some("dry-run".to_string()),
            content: content.to_string(),
            quoted_text: None,
            resolved: false,
            created_time: None,
            replies: Vec::new(),
        };
        self.comments
            .entry(document_id.to_string())
            .or_default()
            .push(comment.clone());
        Ok(comment)
    }
}

// Run-local replacement: a match split across two styled runs is not found,
// which is close enough for a dry run.
fn replace_in_tabs(
    tabs: &mut [Tab],
    find: &str,
    replace: &str,
    match_case: bool,
    tab_ids: Option<&[String]>,
) -> Result<u64, DocumentError> {
    let pattern = RegexBuilder::new(&regex::escape(find))
        .case_insensitive(!match_case)
        .build()
        .map_err(|e| DocumentError::InvalidInput(e.to_string()))?;

    let mut changed = 0;
    for tab in tabs.iter_mut() {
        let selected = tab_ids.map_or(true, |ids| ids.contains(&tab.tab_id));
        if selected {
            for element in &mut tab.body.content {
                changed += replace_in_element(element, &pattern, replace);
            }
        }
        changed += replace_in_tabs(&mut tab.child_tabs, find, replace, match_case, tab_ids)?;
    }
    Ok(changed)
}

fn replace_in_element(element: &mut StructuralElement, pattern: &regex::Regex, replace: &str) -> u64 {
    let mut changed = 0;
    match &mut element.kind {
        ElementKind::Paragraph(paragraph) => {
            for inline in &mut paragraph.elements {
                if let InlineElement::TextRun { content, .. } = inline {
                    let count = pattern.find_iter(content).count() as u64;
                    if count > 0 {
                        *content = pattern.replace_all(content, NoExpand(replace)).into_owned();
                        changed += count;
                    }
                }
            }
        }
        ElementKind::Table(table) => {
            for cell in table.rows.iter_mut().flat_map(|row| row.cells.iter_mut()) {
                for element in &mut cell.content {
                    changed += replace_in_element(element, pattern, replace);
                }
            }
        }
        ElementKind::SectionBreak | ElementKind::TableOfContents(_) => {}
    }
    changed
}
