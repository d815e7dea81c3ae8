//! Structured output parsing for model responses.
//!
//! Models routinely wrap JSON in markdown fences or explanatory text, so the
//! raw completion is cleaned before decoding, and the decoded value is
//! validated against the shape the caller expects. Every mismatch becomes a
//! typed [`LlmError::Parse`] instead of a panic.

use serde::de::DeserializeOwned;

use pmf_core::models::{AnalysisRow, Report};

use super::backend::LlmError;

/// Strip surrounding whitespace and an optional markdown code fence (with an
/// optional `json` language tag) from a raw completion.
pub fn extract_json(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let inner = match rest.find("```") {
        Some(end) => &rest[..end],
        None => rest,
    };
    inner.strip_prefix("json").unwrap_or(inner).trim()
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
    serde_json::from_str(extract_json(raw)).map_err(|e| LlmError::Parse(e.to_string()))
}

/// A non-empty JSON array of strings.
pub fn string_list(raw: &str) -> Result<Vec<String>, LlmError> {
    let list: Vec<String> = decode(raw)?;
    if list.is_empty() {
        return Err(LlmError::Parse("expected a non-empty array".into()));
    }
    Ok(list)
}

/// A non-empty JSON array of `{question, answer, category}` objects.
pub fn analysis_rows(raw: &str) -> Result<Vec<AnalysisRow>, LlmError> {
    let rows: Vec<AnalysisRow> = decode(raw)?;
    if rows.is_empty() {
        return Err(LlmError::Parse("expected a non-empty array".into()));
    }
    Ok(rows)
}

/// A `{summary, key_pains, opportunities}` object.
pub fn report(raw: &str) -> Result<Report, LlmError> {
    decode(raw)
}
