// =============================================================================
// SERVICE ACCOUNT AUTHENTICATION
// =============================================================================
//
// Exchanges service-account credentials for an OAuth2 access token using the
// JWT bearer grant:
//
// 1. Sign a short-lived JWT (RS256) with the account's private key
// 2. POST it to the account's `token_uri`
// 3. Use the returned `access_token` as a Bearer token
//
// The document (or its folder) must be shared with the service account's
// email address (name@project.iam.gserviceaccount.com).
//
// Tokens are not cached: every action call fetches a fresh one.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::documents::DocumentError;

/// Read/write access to Docs plus Drive (for comments).
pub const SCOPES: &str =
    "https://www.googleapis.com/auth/documents https://www.googleapis.com/auth/drive";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Service account credentials from the JSON key file.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    /// The service account email (used as issuer in JWT).
    client_email: String,

    /// The private key in PEM format.
    private_key: String,

    /// Where to exchange the JWT for an access token.
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

/// JWT claims for Google OAuth2.
#[derive(Debug, PartialEq, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    /// At most one hour after `iat`.
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Authenticator that handles OAuth2 with service account credentials.
pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    client: Client,
}

impl ServiceAccountAuth {
    /// Loads credentials from a JSON key file.
    pub async fn from_file(path: &str) -> Result<Self, DocumentError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            DocumentError::Config(format!("Cannot read service account key {}: {}", path, e))
        })?;
        Self::from_json(&content)
    }

    /// Loads credentials from the key file's JSON content.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(json)
            .map_err(|e| DocumentError::Config(format!("Invalid service account JSON: {}", e)))?;
        Ok(Self {
            credentials,
            client: Client::new(),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    fn claims(&self, now: u64) -> JwtClaims {
        JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: SCOPES.to_string(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        }
    }

    /// Fetches a new access token from Google.
    pub async fn fetch_access_token(&self) -> Result<String, DocumentError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| DocumentError::Auth(e.to_string()))?
            .as_secs();

        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| DocumentError::Auth(format!("Invalid private key: {}", e)))?;
        let jwt = encode(&Header::new(Algorithm::RS256), &self.claims(now), &key)
            .map_err(|e| DocumentError::Auth(e.to_string()))?;

        tracing::debug!("Exchanging service account JWT for {}", self.client_email());

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", jwt.as_str()),
            ])
            .send()
            .await
            .map_err(|e| DocumentError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DocumentError::Auth(format!(
                "Token exchange failed ({}): {}",
                status, text
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DocumentError::Auth(e.to_string()))?;
        Ok(token.access_token)
    }
}
