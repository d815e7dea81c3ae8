use thiserror::Error;

/// Domain errors surfaced to callers as client errors.
///
/// Upstream LLM failures never appear here: the resolver layer absorbs them
/// and degrades to canned output instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Session {0} not found")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    PreconditionFailed(String),
}

impl CoreError {
    pub fn not_live() -> Self {
        Self::InvalidState("Session is not live".into())
    }

    pub fn empty_transcript() -> Self {
        Self::PreconditionFailed("No transcript available".into())
    }
}
