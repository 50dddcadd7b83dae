//! Thin typed wrapper around the REST surface.

use atelier_core::types::DbId;
use atelier_db::models::generation::{
    GenerateRequest, GenerateResponse, RetryResponse, StatusResponse,
};

/// Errors from the API client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (connection refused, timeout, ...).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Definitive authentication failure (401/403). The poller treats
    /// this as terminal rather than retrying indefinitely.
    #[error("Authentication rejected ({0})")]
    Auth(u16),

    /// Any other non-success HTTP status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Authenticated client for one API server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://localhost:3000`;
    /// `/api/v1` is appended here.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    /// Convert a non-success response into the right error variant.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let code = status.as_u16();
        if code == 401 || code == 403 {
            return Err(ClientError::Auth(code));
        }
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or_else(|| status.to_string());
        Err(ClientError::Api {
            status: code,
            message,
        })
    }

    /// `POST /paintings/generate` -- start a batch, returns placeholders.
    pub async fn generate(
        &self,
        title_id: DbId,
        quantity: u32,
    ) -> Result<GenerateResponse, ClientError> {
        let response = self
            .http
            .post(self.url("/paintings/generate"))
            .bearer_auth(&self.token)
            .json(&GenerateRequest {
                title_id,
                quantity: Some(quantity),
            })
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `GET /paintings/{titleId}` -- current status of every painting.
    pub async fn status(&self, title_id: DbId) -> Result<StatusResponse, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/paintings/{title_id}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `POST /paintings/{id}/regenerate` -- full retry.
    pub async fn regenerate(&self, painting_id: DbId) -> Result<RetryResponse, ClientError> {
        let response = self
            .http
            .post(self.url(&format!("/paintings/{painting_id}/regenerate")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `POST /paintings/{id}/rerender` -- render-only retry.
    pub async fn rerender(&self, painting_id: DbId) -> Result<RetryResponse, ClientError> {
        let response = self
            .http
            .post(self.url(&format!("/paintings/{painting_id}/rerender")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}
