// =============================================================================
// MARKDOWN → GOOGLE DOCS COMPILER
// =============================================================================
//
// Translates a constrained Markdown dialect into the ordered list of
// `batchUpdate` requests that reproduce it in a Google Doc.
//
// **Supported syntax:**
// - Headings: `#` … `######` followed by a space
// - Emphasis: `**bold**`, `*italic*`, `~~strikethrough~~`
// - Links `[text](url)` and images `![alt](url)`
// - Lists: `- item` and `1. item`, nested with 2-space indentation
// - Pipe tables with a `|---|---|` divider row
// - Page breaks: a line starting with `---`
//
// **Index bookkeeping:**
// Every insertion shifts every later index, so the compiler threads a running
// index through the whole document and computes each request's offsets
// against the content inserted before it. Nothing here does I/O: the same
// input always yields the same batch.

pub mod compiler;
pub mod inline;
pub mod lines;
pub mod lists;
pub mod requests;
pub mod tables;

pub use compiler::{compile, CompileError, CompiledBatch, MarkdownCompiler};
pub use lists::ListOrdinals;
pub use requests::{InsertionPoint, NamedStyleType, Request, TextStyle};
