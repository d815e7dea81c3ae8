use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked, individually addressable question, distinct from the raw
/// question text stored on the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionItem {
    pub id: Uuid,
    pub text: String,
    pub status: QuestionStatus,
    pub created_at: DateTime<Utc>,
    /// Insertion sequence number, strictly increasing per session.
    pub order: usize,
}

impl QuestionItem {
    pub fn new(text: impl Into<String>, order: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            status: QuestionStatus::Pending,
            created_at: Utc::now(),
            order,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    Pending,
    Active,
    Done,
    Skipped,
}

impl QuestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Done => "done",
            Self::Skipped => "skipped",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "done" => Some(Self::Done),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    /// Done and skipped items are dropped from the tracker entirely.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Skipped)
    }
}
