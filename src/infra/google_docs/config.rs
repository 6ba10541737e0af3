use crate::core::documents::DocumentError;

pub const DEFAULT_DOCS_API_BASE: &str = "https://docs.googleapis.com/v1";
pub const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// How the client gets its bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A pre-issued OAuth access token (`GOOGLE_ACCESS_TOKEN`).
    AccessToken(String),
    /// Path to a service account key file (`GOOGLE_SERVICE_ACCOUNT_KEY`).
    ServiceAccountKeyFile(String),
    /// Service account key JSON (`GOOGLE_SERVICE_ACCOUNT_JSON`).
    ServiceAccountJson(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsConfig {
    pub credentials: Option<Credentials>,
    pub docs_api_base: String,
    pub drive_api_base: String,
    /// Use the in-memory store instead of Google (`DOCS_ACTIONS_DRY_RUN`).
    pub dry_run: bool,
}

impl DocsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any variable source; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let credentials = var("GOOGLE_ACCESS_TOKEN")
            .map(Credentials::AccessToken)
            .or_else(|| var("GOOGLE_SERVICE_ACCOUNT_KEY").map(Credentials::ServiceAccountKeyFile))
            .or_else(|| var("GOOGLE_SERVICE_ACCOUNT_JSON").map(Credentials::ServiceAccountJson));

        let dry_run = var("DOCS_ACTIONS_DRY_RUN")
            .map(|value| matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            credentials,
            docs_api_base: var("GOOGLE_DOCS_API_BASE")
                .unwrap_or_else(|| DEFAULT_DOCS_API_BASE.to_string()),
            drive_api_base: var("GOOGLE_DRIVE_API_BASE")
                .unwrap_or_else(|| DEFAULT_DRIVE_API_BASE.to_string()),
            dry_run,
        }
    }

    /// Credentials for a live client; missing credentials are a config error.
    pub fn require_credentials(&self) -> Result<&Credentials, DocumentError> {
        self.credentials.as_ref().ok_or_else(|| {
            DocumentError::Config(
                "Set GOOGLE_ACCESS_TOKEN, GOOGLE_SERVICE_ACCOUNT_KEY or \
                 GOOGLE_SERVICE_ACCOUNT_JSON (or DOCS_ACTIONS_DRY_RUN=true)."
                    .to_string(),
            )
        })
    }
}
