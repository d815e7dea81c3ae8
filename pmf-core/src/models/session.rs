use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::{AnalysisRow, Report};

/// One interview's full state, from creation to report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub product: String,
    pub status: SessionStatus,
    /// Initial questions, fixed at creation.
    pub questions: Vec<String>,
    /// Append-only; cleared when the session goes live.
    pub transcript: Vec<TranscriptEntry>,
    /// Analysis cache, overwritten on each analysis call.
    pub rows: Vec<AnalysisRow>,
    /// Report cache, overwritten on each report call.
    pub report: Option<Report>,
    pub created_at: DateTime<Utc>,
    pub live_started_at: Option<DateTime<Utc>>,
    pub live_ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Short opaque identifier: the first 8 hex characters of a UUIDv4.
    pub fn generate_id() -> String {
        Uuid::new_v4().simple().to_string()[..8].to_string()
    }

    pub fn new(product: impl Into<String>, questions: Vec<String>) -> Self {
        Self {
            id: Self::generate_id(),
            product: product.into(),
            status: SessionStatus::Created,
            questions,
            transcript: Vec::new(),
            rows: Vec::new(),
            report: None,
            created_at: Utc::now(),
            live_started_at: None,
            live_ended_at: None,
        }
    }

    /// All transcript lines joined into one document for prompting.
    pub fn transcript_text(&self) -> String {
        self.transcript
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Live,
    PostInterview,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Live => "live",
            Self::PostInterview => "post_interview",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "live" => Some(Self::Live),
            "post_interview" => Some(Self::PostInterview),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_short_and_unique() {
        let a = Session::generate_id();
        let b = Session::generate_id();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
    }

    #[test]
    fn status_ordering_is_monotonic() {
        assert!(SessionStatus::Created < SessionStatus::Live);
        assert!(SessionStatus::Live < SessionStatus::PostInterview);
    }

    #[test]
    fn transcript_text_joins_lines() {
        let mut session = Session::new("a CRM", vec![]);
        session.transcript.push(TranscriptEntry {
            text: "first".into(),
            timestamp: Utc::now(),
        });
        session.transcript.push(TranscriptEntry {
            text: "second".into(),
            timestamp: Utc::now(),
        });
        assert_eq!(session.transcript_text(), "first\nsecond");
    }
}
