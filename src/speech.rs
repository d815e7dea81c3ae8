//! Speech-to-text passthrough clients.
//!
//! Audio bytes in, the provider's transcript JSON out. No fallback
//! semantics: upstream errors are relayed to the caller verbatim.

use serde_json::Value;

use crate::api::error::{json_detail, ApiError};

const OPENAI_TRANSCRIPTION_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
const DEEPGRAM_LISTEN_URL: &str = "https://api.deepgram.com/v1/listen";

#[derive(Clone)]
pub struct SpeechClient {
    client: reqwest::Client,
    openai_api_key: Option<String>,
    deepgram_api_key: Option<String>,
}

pub struct AudioUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SpeechClient {
    pub fn new(
        client: reqwest::Client,
        openai_api_key: Option<String>,
        deepgram_api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            openai_api_key,
            deepgram_api_key,
        }
    }

    pub fn deepgram_api_key(&self) -> Option<&str> {
        self.deepgram_api_key.as_deref()
    }

    /// Whisper transcription with segment-level timestamps.
    pub async fn transcribe_openai(&self, upload: AudioUpload) -> Result<Value, ApiError> {
        let key = self
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Config("OPENAI_API_KEY is not configured".into()))?;

        let part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(upload.filename)
            .mime_str(&upload.content_type)
            .map_err(|e| ApiError::BadRequest(format!("invalid content type: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("model", "whisper-1")
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment")
            .part("file", part);

        let response = self
            .client
            .post(OPENAI_TRANSCRIPTION_URL)
            .bearer_auth(key)
            .multipart(form)
            .send()
            .await
            .map_err(upstream_send_error)?;

        relay_json(response).await
    }

    /// Deepgram prerecorded transcription (timestamps and utterances on).
    pub async fn transcribe_deepgram(&self, upload: AudioUpload) -> Result<Value, ApiError> {
        let key = self
            .deepgram_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Config("DEEPGRAM_API_KEY is not configured".into()))?;

        let response = self
            .client
            .post(DEEPGRAM_LISTEN_URL)
            .query(&[
                ("model", "nova-2"),
                ("smart_format", "true"),
                ("punctuate", "true"),
                ("timestamps", "true"),
                ("utterances", "true"),
            ])
            .header("Authorization", format!("Token {key}"))
            .header("Content-Type", upload.content_type)
            .body(upload.bytes)
            .send()
            .await
            .map_err(upstream_send_error)?;

        relay_json(response).await
    }
}

fn upstream_send_error(e: reqwest::Error) -> ApiError {
    ApiError::Upstream {
        status: 502,
        detail: Value::String(e.to_string()),
    }
}

/// Forward the upstream body; non-2xx keeps the upstream status code.
pub(crate) async fn relay_json(response: reqwest::Response) -> Result<Value, ApiError> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(upstream_send_error)?;
    if !(200..300).contains(&status) {
        return Err(json_detail(status, &body));
    }
    serde_json::from_str(&body).map_err(|_| json_detail(502, &body))
}
