//! Chat-completion backends.
//!
//! Two interchangeable upstreams sit behind [`CompletionBackend`]: the Yutori
//! proxy (primary) and OpenAI (secondary). Both take a system + user message
//! pair and return the first choice's content; they differ only in endpoint
//! and auth headers.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use super::COMPLETION_MODEL;

const SAMPLING_TEMPERATURE: f64 = 0.7;
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("upstream returned status {status}: {detail}")]
    Upstream { status: u16, detail: String },

    #[error("request failed: {0}")]
    Network(String),

    #[error("completion call timed out")]
    Timeout,

    #[error("could not parse model output: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e.to_string())
        }
    }
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this backend has the credentials it needs to be called.
    fn is_configured(&self) -> bool;

    /// Send one prompt and return the raw completion text.
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

/// Completion response envelope shared by both OpenAI-style backends.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn request_body(prompt: &str, system: &str) -> serde_json::Value {
    json!({
        "model": COMPLETION_MODEL,
        "messages": [
            {"role": "system", "content": system},
            {"role": "user", "content": prompt},
        ],
        "temperature": SAMPLING_TEMPERATURE,
    })
}

/// Extract `choices[0].message.content` or fail with an upstream error.
async fn read_completion(response: reqwest::Response) -> Result<String, LlmError> {
    let status = response.status().as_u16();
    let body_text = response.text().await?;

    if !(200..300).contains(&status) {
        return Err(LlmError::Upstream {
            status,
            detail: body_text,
        });
    }

    let parsed: ChatResponse = serde_json::from_str(&body_text).map_err(|e| LlmError::Upstream {
        status,
        detail: format!("non-JSON completion body: {e}"),
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| LlmError::Upstream {
            status,
            detail: "completion response missing choices[0].message.content".into(),
        })
}

/// Primary backend: the Yutori chat-completions proxy.
///
/// Sends the key both ways the upstream accepts it, as `X-API-KEY` and as a
/// bearer token.
pub struct YutoriBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl YutoriBackend {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl CompletionBackend for YutoriBackend {
    fn name(&self) -> &'static str {
        "yutori"
    }

    fn is_configured(&self) -> bool {
        // The proxy is callable without a key; it answers 401 itself.
        true
    }

    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let mut request = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request_body(prompt, system));
        if let Some(key) = &self.api_key {
            request = request
                .header("X-API-KEY", key)
                .bearer_auth(key);
        }
        read_completion(request.send().await?).await
    }
}

/// Secondary backend: OpenAI chat completions, bearer auth only.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl OpenAiBackend {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let key = self
            .api_key
            .as_ref()
            .ok_or_else(|| LlmError::Network("OPENAI_API_KEY is not configured".into()))?;
        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(key)
            .json(&request_body(prompt, system))
            .send()
            .await?;
        read_completion(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_both_messages() {
        let body = request_body("the prompt", "the system");
        assert_eq!(body["model"], COMPLETION_MODEL);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "the system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "the prompt");
        assert_eq!(body["temperature"], 0.7);
    }

    #[test]
    fn openai_without_key_is_unconfigured() {
        let backend = OpenAiBackend::new(reqwest::Client::new(), None);
        assert!(!backend.is_configured());
        let yutori = YutoriBackend::new(reqwest::Client::new(), "http://localhost", None);
        assert!(yutori.is_configured());
    }
}
