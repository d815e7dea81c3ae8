//! Yutori research and scouting task passthrough.
//!
//! Asynchronous task pattern: submit a query, get a task handle back, poll
//! for status and result by handle. Upstream errors relay verbatim.

use serde_json::{json, Value};

use crate::api::error::ApiError;
use crate::speech::relay_json;

#[derive(Clone)]
pub struct ResearchClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Clone, Copy, Debug)]
pub enum TaskKind {
    Research,
    Scouting,
}

impl TaskKind {
    fn path(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Scouting => "scouting",
        }
    }
}

impl ResearchClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("X-API-KEY", key).bearer_auth(key),
            None => request,
        }
    }

    /// Upstream health probe, `{status_code, body}` regardless of outcome.
    pub async fn health(&self) -> Result<Value, ApiError> {
        let response = self
            .authed(self.client.get(format!("{}/health", self.base_url)))
            .send()
            .await
            .map_err(|e| ApiError::Upstream {
                status: 502,
                detail: Value::String(e.to_string()),
            })?;
        let status = response.status().as_u16();
        let body_text = response.text().await.unwrap_or_default();
        let body: Value = serde_json::from_str(&body_text)
            .unwrap_or_else(|_| json!({ "detail": body_text }));
        Ok(json!({ "status_code": status, "body": body }))
    }

    /// Create a task; the payload already carries a normalized `query`.
    pub async fn create_task(
        &self,
        kind: TaskKind,
        query: String,
        start_url: Option<String>,
    ) -> Result<Value, ApiError> {
        let mut payload = json!({ "query": query });
        if let Some(url) = start_url {
            payload["start_url"] = Value::String(url);
        }
        let response = self
            .authed(
                self.client
                    .post(format!("{}/v1/{}/tasks", self.base_url, kind.path()))
                    .json(&payload),
            )
            .send()
            .await
            .map_err(|e| ApiError::Upstream {
                status: 502,
                detail: Value::String(e.to_string()),
            })?;
        relay_json(response).await
    }

    /// Fetch task status/result by handle.
    pub async fn get_task(&self, kind: TaskKind, task_id: &str) -> Result<Value, ApiError> {
        let response = self
            .authed(
                self.client
                    .get(format!("{}/v1/{}/tasks/{}", self.base_url, kind.path(), task_id)),
            )
            .send()
            .await
            .map_err(|e| ApiError::Upstream {
                status: 502,
                detail: Value::String(e.to_string()),
            })?;
        relay_json(response).await
    }
}

/// Query text for the product research convenience endpoint.
pub fn product_research_query(product: &str, focus: Option<&str>) -> String {
    let focus = focus.unwrap_or("market size, competitors, pricing, and target users");
    format!(
        "Research the product described and summarize key findings.\nProduct: {product}\nFocus: {focus}"
    )
}
