/// Anthropic messages API backend for the advisory gateway
///
/// The model is treated as an untrusted oracle: anything other than a
/// well-formed response is surfaced as an `AdvisorError` for the gateway's
/// retry/fallback chain to classify.
use super::{AdvisorError, AdvisoryBackend, AdvisoryRequest};
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: String,
}

pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicClient {
    /// Build a client with a per-attempt request timeout
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            model,
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (for tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_body(&self, request: &AdvisoryRequest) -> MessagesRequest {
        let mut content = vec![ContentBlock::Text {
            text: format!("Processed market data: {}", request.market_json),
        }];

        if let Some(image) = &request.chart_image {
            content.push(ContentBlock::Image {
                source: ImageSource {
                    kind: "base64",
                    media_type: "image/png",
                    data: image.clone(),
                },
            });
        }

        MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: request.system.clone(),
            messages: vec![Message {
                role: "user",
                content,
            }],
        }
    }
}

impl AdvisoryBackend for AnthropicClient {
    async fn complete(&self, request: &AdvisoryRequest) -> Result<String, AdvisorError> {
        let body = self.build_body(request);

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AdvisorError::Transient(format!("network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            // Rate limits and server-side failures are worth retrying
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(AdvisorError::Transient(format!(
                    "advisory API error {}: {}",
                    status, body
                )));
            }

            return Err(AdvisorError::Validation(format!(
                "advisory API rejected request {}: {}",
                status, body
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AdvisorError::Validation(format!("undecodable response: {}", e)))?;

        let text: String = parsed
            .content
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(AdvisorError::Validation("empty response content".to_string()));
        }

        Ok(text)
    }
}
