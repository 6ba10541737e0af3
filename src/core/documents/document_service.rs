// This is the documents module - the business logic behind every Google Docs
// action. It knows nothing about HTTP: it talks to Google through the
// `DocsApi` port, which the infra layer implements with reqwest (and with an
// in-memory map for dry runs and tests).

use async_trait::async_trait;
use thiserror::Error;

use crate::core::markdown::{
    compile, CompileError, CompiledBatch, InsertionPoint, MarkdownCompiler, Request,
};

use super::document_models::{
    BatchUpdateOutcome, Comment, Document, DocumentContent, DocumentSummary, Tab, TabSummary,
};
use super::markdown_writer::{all_tabs_to_markdown, body_to_markdown};

/// Tab selector that renders every tab instead of a single one.
pub const ALL_TABS: &str = "*";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Google API error: {0}")]
    Api(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Markdown could not be compiled: {0}")]
    Compile(#[from] CompileError),

    #[error("Tab not found: {0}")]
    TabNotFound(String),

    #[error("Could not extract a document ID from: {0}")]
    InvalidDocumentId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ============================================================================
// API PORT
// ============================================================================

/// The Google Docs / Drive calls the actions need.
#[async_trait]
pub trait DocsApi: Send + Sync {
    /// Fetches a document with the content of every tab.
    async fn get_document(&self, document_id: &str) -> Result<Document, DocumentError>;

    /// Creates an empty document.
    async fn create_document(&self, title: &str) -> Result<Document, DocumentError>;

    /// Applies `requests` atomically, in order.
    async fn batch_update(
        &self,
        document_id: &str,
        requests: &[Request],
    ) -> Result<BatchUpdateOutcome, DocumentError>;

    async fn list_comments(&self, document_id: &str) -> Result<Vec<Comment>, DocumentError>;

    async fn create_comment(
        &self,
        document_id: &str,
        content: &str,
    ) -> Result<Comment, DocumentError>;
}

// Lets the service hold either backend behind one type, chosen at startup.
#[async_trait]
impl DocsApi for Box<dyn DocsApi> {
    async fn get_document(&self, document_id: &str) -> Result<Document, DocumentError> {
        (**self).get_document(document_id).await
    }

    async fn create_document(&self, title: &str) -> Result<Document, DocumentError> {
        (**self).create_document(title).await
    }

    async fn batch_update(
        &self,
        document_id: &str,
        requests: &[Request],
    ) -> Result<BatchUpdateOutcome, DocumentError> {
        (**self).batch_update(document_id, requests).await
    }

    async fn list_comments(&self, document_id: &str) -> Result<Vec<Comment>, DocumentError> {
        (**self).list_comments(document_id).await
    }

    async fn create_comment(
        &self,
        document_id: &str,
        content: &str,
    ) -> Result<Comment, DocumentError> {
        (**self).create_comment(document_id, content).await
    }
}

/// Extracts the document ID from a Google Docs URL, or accepts a bare ID.
pub fn extract_document_id(url_or_id: &str) -> Option<String> {
    let url_or_id = url_or_id.trim();
    if url_or_id.contains("docs.google.com") {
        if let Some(start) = url_or_id.find("/document/d/") {
            let after_d = &url_or_id[start + "/document/d/".len()..];
            let end = after_d
                .find(|c| c == '/' || c == '?' || c == '#')
                .unwrap_or(after_d.len());
            let id = &after_d[..end];
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }
    } else if !url_or_id.is_empty() && !url_or_id.contains('/') && !url_or_id.contains(' ') {
        return Some(url_or_id.to_string());
    }
    None
}

fn require_document_id(url_or_id: &str) -> Result<String, DocumentError> {
    extract_document_id(url_or_id)
        .ok_or_else(|| DocumentError::InvalidDocumentId(url_or_id.to_string()))
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct DocumentService<A: DocsApi> {
    api: A,
}

impl<A: DocsApi> DocumentService<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Compiles Markdown for an empty document without touching the API.
    pub fn compile_markdown(&self, markdown: &str) -> Result<CompiledBatch, DocumentError> {
        Ok(compile(markdown)?)
    }

    /// Reads a document as Markdown.
    ///
    /// `tab` selects a tab by id or title; `None` reads the first tab and
    /// [`ALL_TABS`] reads every tab under title headings.
    pub async fn get_markdown(
        &self,
        url_or_id: &str,
        tab: Option<&str>,
    ) -> Result<DocumentContent, DocumentError> {
        let document_id = require_document_id(url_or_id)?;
        let document = self.api.get_document(&document_id).await?;

        let (tab_id, markdown) = match tab {
            Some(ALL_TABS) => (None, all_tabs_to_markdown(&document)),
            selector => {
                let tab = resolve_tab(&document, selector)?;
                (tab.request_tab_id(), body_to_markdown(&tab.body))
            }
        };

        tracing::info!(
            "Read Google Doc '{}' ({} chars of markdown)",
            document.title,
            markdown.len()
        );

        Ok(DocumentContent {
            url: document.url(),
            tabs: document.tab_summaries(),
            document_id: document.document_id,
            title: document.title,
            tab_id,
            markdown,
        })
    }

    pub async fn list_tabs(&self, url_or_id: &str) -> Result<Vec<TabSummary>, DocumentError> {
        let document_id = require_document_id(url_or_id)?;
        let document = self.api.get_document(&document_id).await?;

        Ok(document.tab_summaries())
    }

    /// Creates a document and fills it from Markdown.
    ///
    /// The Markdown is compiled before anything is created, so a compile
    /// error leaves no half-made document behind.
    pub async fn create_from_markdown(
        &self,
        title: &str,
        markdown: Option<&str>,
    ) -> Result<DocumentSummary, DocumentError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DocumentError::InvalidInput(
                "Document title must not be empty".to_string(),
            ));
        }

        let batch = match markdown {
            Some(markdown) => self.compile_markdown(markdown)?,
            None => CompiledBatch::default(),
        };

        let document = self.api.create_document(title).await?;
        if !batch.is_empty() {
            self.api
                .batch_update(&document.document_id, &batch.requests)
                .await?;
        }

        tracing::info!(
            document_id = %document.document_id,
            requests = batch.requests.len(),
            "Created Google Doc"
        );

        Ok(DocumentSummary {
            url: document.url(),
            document_id: document.document_id,
            title: document.title,
            requests_applied: batch.requests.len(),
        })
    }

    /// Appends Markdown to the end of a tab (the first tab by default).
    pub async fn append_markdown(
        &self,
        url_or_id: &str,
        markdown: &str,
        tab: Option<&str>,
    ) -> Result<DocumentSummary, DocumentError> {
        let document_id = require_document_id(url_or_id)?;
        let document = self.api.get_document(&document_id).await?;
        let tab = resolve_tab(&document, tab)?;

        let requests = append_requests(tab, markdown)?;
        if !requests.is_empty() {
            self.api.batch_update(&document_id, &requests).await?;
        }

        tracing::info!(
            document_id = %document_id,
            requests = requests.len(),
            "Appended markdown to Google Doc"
        );

        Ok(DocumentSummary {
            url: document.url(),
            document_id: document.document_id,
            title: document.title,
            requests_applied: requests.len(),
        })
    }

    /// Replaces every occurrence of `find`; returns the number of replacements.
    pub async fn replace_text(
        &self,
        url_or_id: &str,
        find: &str,
        replace: &str,
        match_case: bool,
        tab_id: Option<&str>,
    ) -> Result<u64, DocumentError> {
        if find.is_empty() {
            return Err(DocumentError::InvalidInput(
                "Text to find must not be empty".to_string(),
            ));
        }
        let document_id = require_document_id(url_or_id)?;
        let request = Request::replace_all_text(
            find,
            replace,
            match_case,
            tab_id.map(|id| vec![id.to_string()]),
        );

        let outcome = self.api.batch_update(&document_id, &[request]).await?;
        tracing::info!(
            document_id = %document_id,
            occurrences = outcome.occurrences_changed,
            "Replaced text in Google Doc"
        );
        Ok(outcome.occurrences_changed)
    }

    pub async fn list_comments(&self, url_or_id: &str) -> Result<Vec<Comment>, DocumentError> {
        let document_id = require_document_id(url_or_id)?;
        self.api.list_comments(&document_id).await
    }

    pub async fn add_comment(
        &self,
        url_or_id: &str,
        content: &str,
    ) -> Result<Comment, DocumentError> {
        if content.trim().is_empty() {
            return Err(DocumentError::InvalidInput(
                "Comment must not be empty".to_string(),
            ));
        }
        let document_id = require_document_id(url_or_id)?;
        self.api.create_comment(&document_id, content).await
    }
}

fn resolve_tab<'a>(document: &'a Document, selector: Option<&str>) -> Result<&'a Tab, DocumentError> {
    match selector {
        Some(selector) => document
            .find_tab(selector)
            .ok_or_else(|| DocumentError::TabNotFound(selector.to_string())),
        None => document
            .first_tab()
            .ok_or_else(|| DocumentError::TabNotFound("(document has no tabs)".to_string())),
    }
}

/// Requests that append `markdown` after a tab's existing content.
fn append_requests(tab: &Tab, markdown: &str) -> Result<Vec<Request>, DocumentError> {
    let target = InsertionPoint::at(tab.body.append_index()).with_tab(tab.request_tab_id());

    // Non-empty bodies need a paragraph break first, or the first appended
    // line would join the last existing paragraph.
    let (prefix, start) = if tab.body.has_text() {
        (
            Some(Request::insert_text("\n", target.location(target.index))),
            target.index + 1,
        )
    } else {
        (None, target.index)
    };

    let batch = MarkdownCompiler::new(InsertionPoint {
        index: start,
        ..target
    })
    .compile(markdown)?;
    if batch.is_empty() {
        return Ok(Vec::new());
    }

    Ok(prefix.into_iter().chain(batch.requests).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::documents::document_models::{
        Body, ElementKind, InlineElement, Paragraph, StructuralElement,
    };
    use crate::core::markdown::{NamedStyleType, TextStyle};
    use crate::infra::google_docs::InMemoryDocsApi;

    fn paragraph(start: usize, text: &str) -> StructuralElement {
        StructuralElement {
            start_index: start,
            end_index: start + text.len(),
            kind: ElementKind::Paragraph(Paragraph {
                style: NamedStyleType::NormalText,
                bullet: None,
                elements: vec![InlineElement::TextRun {
                    content: text.to_string(),
                    style: TextStyle::default(),
                }],
            }),
        }
    }

    fn seeded_document(id: &str, text: &str) -> Document {
        Document {
            document_id: id.to_string(),
            title: "Seeded".to_string(),
            tabs: vec![Tab {
                tab_id: "t.0".to_string(),
                title: "Main".to_string(),
                index: 0,
                body: Body {
                    content: vec![
                        StructuralElement {
                            start_index: 0,
                            end_index: 1,
                            kind: ElementKind::SectionBreak,
                        },
                        paragraph(1, text),
                    ],
                },
                child_tabs: vec![],
            }],
        }
    }

    fn service() -> (DocumentService<InMemoryDocsApi>, InMemoryDocsApi) {
        let api = InMemoryDocsApi::new();
        (DocumentService::new(api.clone()), api)
    }

    #[test]
    fn test_extract_document_id_from_url() {
        assert_eq!(
            extract_document_id("https://docs.google.com/document/d/1abc123xyz/edit#heading=h.1"),
            Some("1abc123xyz".to_string())
        );
        assert_eq!(
            extract_document_id("https://docs.google.com/document/d/1abc?tab=t.0"),
            Some("1abc".to_string())
        );
    }

    #[test]
    fn test_extract_document_id_from_id() {
        assert_eq!(extract_document_id(" 1abc123xyz "), Some("1abc123xyz".to_string()));
        assert_eq!(extract_document_id("not an id"), None);
        assert_eq!(extract_document_id("https://example.com/doc"), None);
        assert_eq!(extract_document_id(""), None);
    }

    #[test]
    fn test_document_error_messages_are_descriptive() {
        let err = DocumentError::from(CompileError::EmptyTable);
        assert!(err.to_string().contains("Table has no content rows"));
        assert!(DocumentError::TabNotFound("Notes".into())
            .to_string()
            .contains("Notes"));
    }

    #[tokio::test]
    async fn test_create_from_markdown_applies_compiled_batch() {
        let (service, api) = service();

        let summary = service
            .create_from_markdown("Plan", Some("# Goals\n- ship"))
            .await
            .unwrap();

        assert_eq!(summary.title, "Plan");
        assert!(summary.url.ends_with(&format!("/d/{}/edit", summary.document_id)));
        let batches = api.batches(&summary.document_id);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), summary.requests_applied);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_table_before_creating() {
        let (service, api) = service();

        let err = service
            .create_from_markdown("Broken", Some("| a | b |\n| c |"))
            .await
            .unwrap_err();

        assert!(matches!(err, DocumentError::Compile(_)));
        assert_eq!(api.document_count(), 0);
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let (service, _) = service();
        let err = service.create_from_markdown("  ", None).await.unwrap_err();
        assert!(matches!(err, DocumentError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_append_adds_paragraph_break_after_existing_text() {
        let (service, api) = service();
        api.insert_document(seeded_document("doc1", "hello\n"));

        service
            .append_markdown("doc1", "**more**", None)
            .await
            .unwrap();

        let batch = &api.batches("doc1")[0];
        let target = InsertionPoint::at(6).with_tab(Some("t.0".to_string()));
        assert_eq!(batch[0], Request::insert_text("\n", target.location(6)));
        assert_eq!(batch[1], Request::insert_text("more", target.location(7)));
        assert_eq!(
            batch[2],
            Request::text_style(TextStyle::bold(), target.range(7, 11))
        );
    }

    #[tokio::test]
    async fn test_append_to_empty_body_starts_at_one() {
        let (service, api) = service();
        api.insert_document(seeded_document("doc2", "\n"));

        service.append_markdown("doc2", "hi", None).await.unwrap();

        match &api.batches("doc2")[0][0] {
            Request::InsertText { text, location } => {
                assert_eq!(text, "hi");
                assert_eq!(location.index, 1);
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_append_to_unknown_tab_fails() {
        let (service, api) = service();
        api.insert_document(seeded_document("doc3", "x\n"));

        let err = service
            .append_markdown("doc3", "text", Some("Missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::TabNotFound(name) if name == "Missing"));
    }

    #[tokio::test]
    async fn test_empty_append_sends_nothing() {
        let (service, api) = service();
        api.insert_document(seeded_document("doc4", "x\n"));

        let summary = service.append_markdown("doc4", "\n\n", None).await.unwrap();
        assert_eq!(summary.requests_applied, 0);
        assert!(api.batches("doc4").is_empty());
    }

    #[tokio::test]
    async fn test_get_markdown_reads_first_tab() {
        let (service, api) = service();
        api.insert_document(seeded_document("doc5", "Body text\n"));

        let content = service
            .get_markdown("https://docs.google.com/document/d/doc5/edit", None)
            .await
            .unwrap();

        assert_eq!(content.document_id, "doc5");
        assert_eq!(content.tab_id.as_deref(), Some("t.0"));
        assert_eq!(content.markdown, "Body text");
    }

    #[tokio::test]
    async fn test_get_markdown_all_tabs() {
        let (service, api) = service();
        api.insert_document(seeded_document("doc6", "Body\n"));

        let content = service.get_markdown("doc6", Some(ALL_TABS)).await.unwrap();
        assert_eq!(content.tab_id, None);
        assert_eq!(content.markdown, "# Main\n\nBody");
    }

    #[tokio::test]
    async fn test_replace_text_reports_occurrences() {
        let (service, api) = service();
        api.insert_document(seeded_document("doc7", "a {{x}} b {{x}}\n"));

        let changed = service
            .replace_text("doc7", "{{x}}", "y", true, None)
            .await
            .unwrap();

        assert_eq!(changed, 2);
        let content = service.get_markdown("doc7", None).await.unwrap();
        assert_eq!(content.markdown, "a y b y");
    }

    #[tokio::test]
    async fn test_replace_text_requires_search_text() {
        let (service, _) = service();
        let err = service
            .replace_text("doc", "", "y", false, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_invalid_document_id_is_rejected() {
        let (service, _) = service();
        let err = service.list_tabs("https://example.com/x").await.unwrap_err();
        assert!(matches!(err, DocumentError::InvalidDocumentId(_)));
    }

    #[tokio::test]
    async fn test_comments_round_trip() {
        let (service, api) = service();
        api.insert_document(seeded_document("doc8", "x\n"));

        let created = service.add_comment("doc8", "Looks good").await.unwrap();
        let comments = service.list_comments("doc8").await.unwrap();

        assert_eq!(comments, vec![created]);
        assert!(service.add_comment("doc8", " ").await.is_err());
    }
}
