use std::env;
use std::time::Duration;

pub const DEFAULT_YUTORI_BASE_URL: &str = "https://api.yutori.com";

/// Upstream credentials and endpoints, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub yutori_api_key: Option<String>,
    pub yutori_base_url: String,
    pub openai_api_key: Option<String>,
    pub deepgram_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            // legacy deployments used the lowercase name
            yutori_api_key: env::var("YUTORI_API_KEY")
                .or_else(|_| env::var("yutori"))
                .ok()
                .filter(|v| !v.is_empty()),
            yutori_base_url: env::var("YUTORI_BASE_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_YUTORI_BASE_URL.to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|v| !v.is_empty()),
            deepgram_api_key: env::var("DEEPGRAM_API_KEY").ok().filter(|v| !v.is_empty()),
        }
    }
}

/// Shared HTTP client for completion and passthrough upstreams.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .unwrap_or_default()
}

/// Client with the longer budget audio transcription needs.
pub fn transcription_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .unwrap_or_default()
}
