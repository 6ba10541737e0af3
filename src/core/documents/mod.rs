// =============================================================================
// GOOGLE DOCS DOCUMENTS
// =============================================================================
//
// Domain model of a fetched document (tabs, body, comments), the reverse
// Document → Markdown writer, and `DocumentService`, which ties the compiler
// to the `DocsApi` port for the read / create / append / replace actions.

pub mod document_models;
pub mod document_service;
pub mod markdown_writer;

pub use document_models::*;
pub use document_service::{DocsApi, DocumentError, DocumentService};
