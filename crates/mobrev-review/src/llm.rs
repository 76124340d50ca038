use std::time::Duration;

use mobrev_core::{LlmConfig, MobrevError};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// A message in a chat conversation with the model.
///
/// # Examples
///
/// ```
/// use mobrev_review::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage::user("Review this diff");
/// assert_eq!(msg.role, Role::User);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

impl ChatMessage {
    /// A system-role message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use mobrev_review::llm::Role;
///
/// assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Framing instructions.
    System,
    /// The prompt.
    User,
}

/// OpenAI-compatible chat completions client.
///
/// Built once per run from [`LlmConfig`]. Any provider exposing
/// `/v1/chat/completions` works; point `base_url` at it.
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MobrevError::Llm`] if the HTTP client cannot be built.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobrev_core::LlmConfig;
    /// use mobrev_review::llm::LlmClient;
    ///
    /// let client = LlmClient::new(&LlmConfig::default()).unwrap();
    /// assert_eq!(client.model(), "gpt-4o-mini");
    /// ```
    pub fn new(config: &LlmConfig) -> Result<Self, MobrevError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| MobrevError::Llm(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!("{base_url}/v1/chat/completions")
    }

    /// Send a chat completion request and return the first choice's text,
    /// trimmed of surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`MobrevError::Llm`] on network errors, non-2xx responses, or a
    /// response without `choices[0].message.content`.
    #[instrument(skip(self, messages), fields(model = %self.config.model, messages = messages.len()))]
    pub async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f64,
    ) -> Result<String, MobrevError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": temperature,
        });

        let mut request = self.client.post(self.endpoint());
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| MobrevError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(MobrevError::Llm(format!(
                "LLM API error {status}: {body_text}"
            )));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MobrevError::Llm(format!("failed to parse response: {e}")))?;

        let content = response_body
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                MobrevError::Llm(format!("unexpected response structure: {response_body}"))
            })?;

        debug!(chars = content.len(), "model replied");
        Ok(content.trim().to_string())
    }
}
