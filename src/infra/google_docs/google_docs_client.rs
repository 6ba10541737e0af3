// =============================================================================
// GOOGLE DOCS CLIENT
// =============================================================================
//
// reqwest implementation of the `DocsApi` port.
//
// **Endpoints:**
// - Docs v1: `GET documents/{id}?includeTabsContent=true`, `POST documents`,
//   `POST documents/{id}:batchUpdate`
// - Drive v3: `GET/POST files/{id}/comments` (comments live in Drive, not Docs)
//
// **Authentication:**
// Either a pre-issued access token or a service account whose key is
// exchanged for a token on every call (see `service_account.rs`).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::core::documents::{BatchUpdateOutcome, Comment, DocsApi, Document, DocumentError};
use crate::core::markdown::Request;

use super::api_models::{
    ApiBatchUpdateResponse, ApiComment, ApiCommentList, ApiDocument, COMMENT_FIELDS,
};
use super::config::{Credentials, DocsConfig};
use super::service_account::ServiceAccountAuth;

/// Where bearer tokens come from.
pub enum TokenSource {
    Static(String),
    ServiceAccount(ServiceAccountAuth),
}

impl TokenSource {
    pub async fn from_credentials(credentials: &Credentials) -> Result<Self, DocumentError> {
        Ok(match credentials {
            Credentials::AccessToken(token) => Self::Static(token.clone()),
            Credentials::ServiceAccountKeyFile(path) => {
                Self::ServiceAccount(ServiceAccountAuth::from_file(path).await?)
            }
            Credentials::ServiceAccountJson(json) => {
                Self::ServiceAccount(ServiceAccountAuth::from_json(json)?)
            }
        })
    }

    async fn access_token(&self) -> Result<String, DocumentError> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::ServiceAccount(auth) => auth.fetch_access_token().await,
        }
    }
}

pub struct GoogleDocsClient {
    client: Client,
    tokens: TokenSource,
    docs_api_base: String,
    drive_api_base: String,
}

impl GoogleDocsClient {
    pub fn new(tokens: TokenSource, docs_api_base: &str, drive_api_base: &str) -> Self {
        Self {
            client: Client::new(),
            tokens,
            docs_api_base: docs_api_base.trim_end_matches('/').to_string(),
            drive_api_base: drive_api_base.trim_end_matches('/').to_string(),
        }
    }

    pub async fn from_config(config: &DocsConfig) -> Result<Self, DocumentError> {
        let tokens = TokenSource::from_credentials(config.require_credentials()?).await?;
        Ok(Self::new(
            tokens,
            &config.docs_api_base,
            &config.drive_api_base,
        ))
    }

    fn document_url(&self, document_id: &str) -> String {
        format!(
            "{}/documents/{}?includeTabsContent=true",
            self.docs_api_base, document_id
        )
    }

    fn batch_update_url(&self, document_id: &str) -> String {
        format!("{}/documents/{}:batchUpdate", self.docs_api_base, document_id)
    }

    fn comments_url(&self, document_id: &str) -> String {
        format!("{}/files/{}/comments", self.drive_api_base, document_id)
    }

    /// Authorizes, sends and decodes one call, mapping failures to `DocumentError`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, DocumentError> {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| DocumentError::Api(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("Google API call failed ({}): {}", status, text);
            return Err(DocumentError::Api(format!("{} {}", status, text)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DocumentError::Api(e.to_string()))
    }
}

#[async_trait]
impl DocsApi for GoogleDocsClient {
    async fn get_document(&self, document_id: &str) -> Result<Document, DocumentError> {
        let url = self.document_url(document_id);
        tracing::debug!("Fetching Google Doc: {}", url);

        let document: ApiDocument = self.send(self.client.get(&url)).await?;
        Ok(document.into_document())
    }

    async fn create_document(&self, title: &str) -> Result<Document, DocumentError> {
        let url = format!("{}/documents", self.docs_api_base);
        let document: ApiDocument = self
            .send(self.client.post(&url).json(&json!({ "title": title })))
            .await?;
        Ok(document.into_document())
    }

    async fn batch_update(
        &self,
        document_id: &str,
        requests: &[Request],
    ) -> Result<BatchUpdateOutcome, DocumentError> {
        let url = self.batch_update_url(document_id);
        tracing::debug!("Sending {} request(s) to {}", requests.len(), url);

        let response: ApiBatchUpdateResponse = self
            .send(self.client.post(&url).json(&json!({ "requests": requests })))
            .await?;
        Ok(response.into_outcome())
    }

    async fn list_comments(&self, document_id: &str) -> Result<Vec<Comment>, DocumentError> {
        let url = self.comments_url(document_id);
        let fields = format!("nextPageToken,comments({})", COMMENT_FIELDS);
        let mut comments = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("fields", fields.clone()), ("pageSize", "100".to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let page: ApiCommentList = self.send(self.client.get(&url).query(&query)).await?;
            comments.extend(page.comments.into_iter().map(ApiComment::into_comment));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(comments)
    }

    async fn create_comment(
        &self,
        document_id: &str,
        content: &str,
    ) -> Result<Comment, DocumentError> {
        let url = self.comments_url(document_id);
        let comment: ApiComment = self
            .send(
                self.client
                    .post(&url)
                    .query(&[("fields", COMMENT_FIELDS)])
                    .json(&json!({ "content": content })),
            )
            .await?;
        Ok(comment.into_comment())
    }
}
