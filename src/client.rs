use crate::models::{AutogenRequest, GenerationResult};
use reqwest::Client;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generation endpoint returned {0}")]
    Status(reqwest::StatusCode),
    #[error("response missing {0}")]
    Missing(&'static str),
}

/// HTTP client for the `/autogen` endpoint.
pub struct AutogenClient {
    client: Client,
    base_url: String,
}

impl AutogenClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_env() -> Self {
        let base_url =
            std::env::var("AUTOGEN_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
        Self::new(base_url)
    }

    /// One POST, validated once at the boundary. A non-2xx status logs the
    /// body and returns an error; a 2xx body without marketing copy is also
    /// an error, since the rest of the record is useless without it.
    pub async fn generate(
        &self,
        request: &AutogenRequest,
    ) -> Result<GenerationResult, ClientError> {
        let url = format!("{}/autogen", self.base_url);
        info!(%url, title = %request.title, features = request.features.len(), "submitting generation request");

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "generation endpoint returned an error");
            return Err(ClientError::Status(status));
        }

        let body: serde_json::Value = response.json().await?;
        let result = GenerationResult::from_value(&body);
        if result.marketing_copy.is_empty() {
            return Err(ClientError::Missing("marketing_copy"));
        }
        Ok(result)
    }
}
