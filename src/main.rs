// This is the entry point of the Google Docs actions runner.
//
// **Architecture Overview:**
// - `core/` = Business logic (the Markdown compiler, document service)
// - `infra/` = Implementations of core traits (Google APIs, in-memory store)
// - `actions/` = Agent-facing function declarations and dispatch
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Print the function declarations (`docs-actions tools`), or
// 4. Serve function calls: one JSON object per stdin line, one result per
//    stdout line

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "actions/actions_layer.rs"]
mod actions;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::actions::GoogleDocsFunctionHandler;
use crate::core::documents::{DocsApi, DocumentService};
use crate::core::tools::FunctionCallHandler;
use crate::infra::google_docs::{DocsConfig, GoogleDocsClient, InMemoryDocsApi};

/// One line of input.
#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

async fn build_api(config: &DocsConfig) -> anyhow::Result<Box<dyn DocsApi>> {
    if config.dry_run {
        tracing::warn!("DOCS_ACTIONS_DRY_RUN is set: using the in-memory document store");
        return Ok(Box::new(InMemoryDocsApi::new()));
    }
    Ok(Box::new(GoogleDocsClient::from_config(config).await?))
}

fn tools_json(handler: &impl FunctionCallHandler) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&handler.function_defs())
}

async fn run_call(handler: &impl FunctionCallHandler, line: &str) -> Value {
    let call: FunctionCall = match serde_json::from_str(line) {
        Ok(call) => call,
        Err(e) => {
            return json!({
                "success": false,
                "error": format!("Invalid function call: {}", e),
            })
        }
    };

    match handler.handle_function_call(&call.name, &call.args).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("Rejected call to {}: {}", call.name, e);
            json!({ "success": false, "error": e })
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenv::dotenv().ok();

    // Logs go to stderr; stdout carries only results.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let mut stdout = tokio::io::stdout();

    if std::env::args().nth(1).as_deref() == Some("tools") {
        // Declarations don't depend on the backend, so no credentials are needed.
        let handler = GoogleDocsFunctionHandler::new(DocumentService::new(InMemoryDocsApi::new()));
        let tools = tools_json(&handler)?;
        stdout.write_all(tools.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        return Ok(());
    }

    let config = DocsConfig::from_env();
    let api = build_api(&config).await?;
    let handler = GoogleDocsFunctionHandler::new(DocumentService::new(api));
    tracing::info!(
        "Serving {} Google Docs functions on stdin",
        handler.supported_functions().len()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let result = run_call(&handler, &line).await;
        stdout.write_all(result.to_string().as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}
