// =============================================================================
// GOOGLE DOCS FUNCTION HANDLER
// =============================================================================
//
// Exposes `DocumentService` to agents as callable functions.
//
// Every function answers with a JSON object carrying `"success"`. Failures of
// the operation itself (bad Markdown table, unknown tab, Google API error)
// come back as `{"success": false, "error": ...}`; only calls that cannot be
// dispatched (unknown function, missing argument) are `Err`.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::documents::{DocsApi, DocumentError, DocumentService};
use crate::core::tools::{FunctionCallHandler, FunctionDef, FunctionParameters, PropertyDef};

const DOCUMENT_ID_HELP: &str = "The Google Doc document ID or full URL.";

// =============================================================================
// FUNCTION DECLARATIONS
// =============================================================================

fn function(name: &str, description: &str, parameters: FunctionParameters) -> FunctionDef {
    FunctionDef {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

fn document_id_param() -> FunctionParameters {
    FunctionParameters::object().property("document_id", PropertyDef::string(DOCUMENT_ID_HELP), true)
}

pub fn google_docs_functions() -> Vec<FunctionDef> {
    vec![
        function(
            "get_document",
            "Reads a Google Doc as Markdown. Reads the first tab unless a tab is given.",
            document_id_param().property(
                "tab",
                PropertyDef::string("Tab ID or title to read, or \"*\" to read every tab."),
                false,
            ),
        ),
        function(
            "list_tabs",
            "Lists the tabs of a Google Doc with their IDs and nesting depth.",
            document_id_param(),
        ),
        function(
            "create_document",
            "Creates a Google Doc, optionally filled from Markdown, and returns its URL.",
            FunctionParameters::object()
                .property("title", PropertyDef::string("Title of the new document."), true)
                .property(
                    "body",
                    PropertyDef::string(
                        "Markdown content: headings, **bold**, *italic*, ~~strike~~, links, \
                         images, - and 1. lists, pipe tables and --- page breaks.",
                    ),
                    false,
                ),
        ),
        function(
            "append_markdown",
            "Appends Markdown to the end of a Google Doc tab (the first tab by default).",
            document_id_param()
                .property("body", PropertyDef::string("Markdown content to append."), true)
                .property("tab_id", PropertyDef::string("Tab ID or title to append to."), false),
        ),
        function(
            "replace_text",
            "Replaces every occurrence of a text in a Google Doc.",
            document_id_param()
                .property("find", PropertyDef::string("Text to search for."), true)
                .property("replace", PropertyDef::string("Replacement text."), true)
                .property(
                    "match_case",
                    PropertyDef::boolean("Whether the search is case sensitive. Defaults to false."),
                    false,
                )
                .property(
                    "tab_id",
                    PropertyDef::string("Only replace within this tab ID."),
                    false,
                ),
        ),
        function(
            "compile_markdown",
            "Shows the Google Docs batchUpdate requests a Markdown text compiles to, \
             without touching any document.",
            FunctionParameters::object().property(
                "body",
                PropertyDef::string("Markdown content to compile."),
                true,
            ),
        ),
        function(
            "list_comments",
            "Lists the comments on a Google Doc, with their replies.",
            document_id_param(),
        ),
        function(
            "add_comment",
            "Adds an unanchored comment to a Google Doc.",
            document_id_param().property("content", PropertyDef::string("Comment text."), true),
        ),
    ]
}

// =============================================================================
// ARGUMENT HELPERS
// =============================================================================

fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str, String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("Missing '{}' argument", name))
}

fn optional_str<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
}

fn to_response(function: &str, result: Result<Value, DocumentError>) -> Value {
    match result {
        Ok(mut value) => {
            value["success"] = json!(true);
            value
        }
        Err(e) => {
            tracing::warn!("{} failed: {}", function, e);
            json!({
                "success": false,
                "error": e.to_string(),
            })
        }
    }
}

// =============================================================================
// HANDLER
// =============================================================================

pub struct GoogleDocsFunctionHandler<A: DocsApi> {
    service: DocumentService<A>,
}

impl<A: DocsApi> GoogleDocsFunctionHandler<A> {
    pub fn new(service: DocumentService<A>) -> Self {
        Self { service }
    }

    async fn dispatch(&self, name: &str, args: &Value) -> Result<Result<Value, DocumentError>, String> {
        let result = match name {
            "get_document" => {
                let document_id = required_str(args, "document_id")?;
                self.service
                    .get_markdown(document_id, optional_str(args, "tab"))
                    .await
                    .map(|content| json!(content))
            }

            "list_tabs" => {
                let document_id = required_str(args, "document_id")?;
                self.service
                    .list_tabs(document_id)
                    .await
                    .map(|tabs| json!({ "tabs": tabs }))
            }

            "create_document" => {
                let title = required_str(args, "title")?;
                self.service
                    .create_from_markdown(title, optional_str(args, "body"))
                    .await
                    .map(|summary| json!(summary))
            }

            "append_markdown" => {
                let document_id = required_str(args, "document_id")?;
                let body = required_str(args, "body")?;
                self.service
                    .append_markdown(document_id, body, optional_str(args, "tab_id"))
                    .await
                    .map(|summary| json!(summary))
            }

            "replace_text" => {
                let document_id = required_str(args, "document_id")?;
                let find = required_str(args, "find")?;
                let replace = required_str(args, "replace")?;
                let match_case = args
                    .get("match_case")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                self.service
                    .replace_text(
                        document_id,
                        find,
                        replace,
                        match_case,
                        optional_str(args, "tab_id"),
                    )
                    .await
                    .map(|occurrences| json!({ "occurrences_changed": occurrences }))
            }

            "compile_markdown" => {
                let body = required_str(args, "body")?;
                self.service.compile_markdown(body).map(|batch| {
                    json!({
                        "requests": batch.requests,
                        "end_index": batch.end_index,
                    })
                })
            }

            "list_comments" => {
                let document_id = required_str(args, "document_id")?;
                self.service
                    .list_comments(document_id)
                    .await
                    .map(|comments| json!({ "comments": comments }))
            }

            "add_comment" => {
                let document_id = required_str(args, "document_id")?;
                let content = required_str(args, "content")?;
                self.service
                    .add_comment(document_id, content)
                    .await
                    .map(|comment| json!({ "comment": comment }))
            }

            _ => return Err(format!("Unknown function: {}", name)),
        };
        Ok(result)
    }
}

#[async_trait]
impl<A: DocsApi> FunctionCallHandler for GoogleDocsFunctionHandler<A> {
    async fn handle_function_call(&self, name: &str, args: &Value) -> Result<Value, String> {
        tracing::debug!("Handling function call {}", name);
        let result = self.dispatch(name, args).await?;
        Ok(to_response(name, result))
    }

    fn supported_functions(&self) -> Vec<String> {
        google_docs_functions()
            .into_iter()
            .map(|function| function.name)
            .collect()
    }

    fn function_defs(&self) -> Vec<FunctionDef> {
        google_docs_functions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::google_docs::InMemoryDocsApi;

    fn handler() -> GoogleDocsFunctionHandler<InMemoryDocsApi> {
        GoogleDocsFunctionHandler::new(DocumentService::new(InMemoryDocsApi::new()))
    }

    #[test]
    fn test_every_function_is_declared_once() {
        let names = handler().supported_functions();

        assert_eq!(
            names,
            vec![
                "get_document",
                "list_tabs",
                "create_document",
                "append_markdown",
                "replace_text",
                "compile_markdown",
                "list_comments",
                "add_comment",
            ]
        );
        for def in google_docs_functions() {
            assert_eq!(def.parameters.param_type, "object");
            for required in &def.parameters.required {
                assert!(def.parameters.properties.contains_key(required));
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_function_is_an_error() {
        let err = handler()
            .handle_function_call("delete_everything", &json!({}))
            .await
            .unwrap_err();
        assert!(err.contains("Unknown function"));
    }

    #[tokio::test]
    async fn test_missing_argument_is_an_error() {
        let err = handler()
            .handle_function_call("append_markdown", &json!({"document_id": "d"}))
            .await
            .unwrap_err();
        assert_eq!(err, "Missing 'body' argument");
    }

    #[tokio::test]
    async fn test_compile_markdown_returns_requests() {
        let result = handler()
            .handle_function_call("compile_markdown", &json!({"body": "# Title"}))
            .await
            .unwrap();

        assert_eq!(result["success"], true);
        assert_eq!(result["end_index"], 6);
        assert_eq!(result["requests"][0]["insertText"]["text"], "Title");
        assert_eq!(
            result["requests"][1]["updateParagraphStyle"]["paragraphStyle"]["namedStyleType"],
            "HEADING_1"
        );
    }

    #[tokio::test]
    async fn test_compile_error_is_reported_not_raised() {
        let result = handler()
            .handle_function_call("compile_markdown", &json!({"body": "| a | b |\n| c |"}))
            .await
            .unwrap();

        assert_eq!(result["success"], false);
        assert!(result["error"].as_str().unwrap().contains("3 cells"));
    }

    #[tokio::test]
    async fn test_create_then_read_and_comment() {
        let handler = handler();

        let created = handler
            .handle_function_call(
                "create_document",
                &json!({"title": "Notes", "body": "- one\n- two"}),
            )
            .await
            .unwrap();
        assert_eq!(created["success"], true);
        let id = created["document_id"].as_str().unwrap().to_string();
        assert!(created["url"].as_str().unwrap().contains(&id));

        let tabs = handler
            .handle_function_call("list_tabs", &json!({"document_id": id}))
            .await
            .unwrap();
        assert_eq!(tabs["tabs"][0]["tab_id"], "t.0");

        let comment = handler
            .handle_function_call("add_comment", &json!({"document_id": id, "content": "LGTM"}))
            .await
            .unwrap();
        assert_eq!(comment["comment"]["content"], "LGTM");

        let comments = handler
            .handle_function_call("list_comments", &json!({"document_id": id}))
            .await
            .unwrap();
        assert_eq!(comments["comments"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_document_reports_failure() {
        let result = handler()
            .handle_function_call(
                "replace_text",
                &json!({"document_id": "missing", "find": "a", "replace": "b"}),
            )
            .await
            .unwrap();

        assert_eq!(result["success"], false);
        assert!(result["error"].as_str().unwrap().contains("missing"));
    }
}
