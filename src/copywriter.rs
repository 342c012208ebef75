use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

/// Sentinel key: without a real key the copywriter runs in demo mode and
/// returns deterministic copy instead of calling out.
pub const DEMO_KEY: &str = "DEMO_KEY";

const SYSTEM_PROMPT: &str = "You are a product marketing expert for QVC. \
    Ensure to use the most up to date social media marketing practices and strategies. \
    This is for social media use primarily youtube, instagram and tiktok.";

#[derive(Debug, Error)]
pub enum CopyError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Other: {0}")]
    Other(String),
}

/// Chat-completions client that turns a product title and feature list into
/// short-form marketing copy.
pub struct Copywriter {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl Copywriter {
    pub fn new(api_key: String) -> Self {
        let base_url = std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4-1106-preview".to_string());
        Self::with_base(api_key, base_url, model)
    }

    pub fn with_base(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| DEMO_KEY.to_string()))
    }

    pub async fn marketing_copy(
        &self,
        title: &str,
        features: &[String],
    ) -> Result<String, CopyError> {
        if self.api_key == DEMO_KEY {
            info!("no API key configured - using demo marketing copy");
            return Ok(demo_copy(title));
        }

        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_prompt(title, features)}
            ],
            "temperature": 0.75,
            "max_tokens": 300
        });

        let url = format!("{}/chat/completions", self.base_url);
        info!(model = %self.model, "requesting marketing copy");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CopyError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CopyError::Http(e.to_string()))?;
        if !status.is_success() {
            error!(%status, %body, "chat completion failed");
            return Err(CopyError::Http(format!("HTTP {status}: {body}")));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| CopyError::Other(format!("parse error: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| CopyError::Other("no completion content in response".to_string()))
    }
}

fn build_prompt(title: &str, features: &[String]) -> String {
    format!(
        "Write a compelling 100-word marketing copy for the following product for QVC UK social media.\n\
        Write in a friendly, persuasive tone and highlight unique selling points of the product.\n\
        Based on the type of product given take that into consideration when generating the marketing copy.\n\n\
        Product: {title}\n\
        Features: {}",
        features.join(", ")
    )
}

fn demo_copy(title: &str) -> String {
    format!(
        "Say hello to {title} - the upgrade your day has been waiting for! \
        Thoughtfully designed and built to last, it slots straight into your routine \
        and makes the everyday feel effortless. Once you try it, you'll wonder how \
        you managed without. Treat yourself today!"
    )
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
