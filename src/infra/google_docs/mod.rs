// =============================================================================
// GOOGLE DOCS MODULE
// =============================================================================
//
// Implementations of the `DocsApi` port.
//
// **Architecture:**
// This module lives in the infra layer because it handles external I/O
// (HTTP requests to Google APIs). The core layer only knows about
// `Document`s and `Request`s; it doesn't care where they come from or go.
//
// **Backends:**
// 1. `GoogleDocsClient`: Docs v1 + Drive v3 over reqwest
// 2. `InMemoryDocsApi`: a DashMap store for dry runs and tests
//
// **Authentication Options:**
// 1. **Access token** (`GOOGLE_ACCESS_TOKEN`): used as-is
// 2. **Service Account** (`GOOGLE_SERVICE_ACCOUNT_KEY` / `_JSON`): can access
//    private docs if they are shared with the service account email

pub mod api_models;
pub mod config;
pub mod google_docs_client;
pub mod in_memory;
pub mod service_account;

pub use config::DocsConfig;
pub use google_docs_client::GoogleDocsClient;
pub use in_memory::InMemoryDocsApi;
