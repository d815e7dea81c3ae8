//! Interview orchestrator: the session state machine tying the store, the
//! question tracker, and the LLM fallback pipeline together.
//!
//! Every LLM-backed operation degrades to a canned result instead of
//! erroring; only unknown sessions, invalid states, and empty-transcript
//! preconditions surface as errors.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use pmf_core::error::CoreError;
use pmf_core::models::{
    AnalysisRow, QuestionItem, QuestionStatus, Report, Session, SessionStatus, TranscriptEntry,
};
use pmf_core::store::AppState;

use crate::llm::{parse, prompts, resolver::SHORT_TIMEOUT, FallbackResolver};

/// Product label given to the persistent convenience session.
const PERSISTENT_SESSION_PRODUCT: &str = "Interview Session";

pub struct Orchestrator {
    state: Arc<AppState>,
    resolver: FallbackResolver,
}

impl Orchestrator {
    pub fn new(state: Arc<AppState>, resolver: FallbackResolver) -> Self {
        Self { state, resolver }
    }

    /// Start a new interview session, generating initial questions.
    ///
    /// Single-session mode: when the persistent session exists it is reused
    /// with the new product description and its stored questions.
    pub async fn start(&self, product: &str, count: usize) -> (String, Vec<String>) {
        if let Some(existing) = self.state.persistent_session() {
            let questions = existing.questions.clone();
            let _ = self
                .state
                .with_session(&existing.id, |s| s.product = product.to_string());
            tracing::info!(session_id = %existing.id, "reusing persistent session");
            return (existing.id, questions);
        }

        let prompt = prompts::questions(product, count);
        let questions = self
            .resolver
            .resolve(
                &prompt,
                Some(SHORT_TIMEOUT),
                parse::string_list,
                fallback_initial_questions(product),
            )
            .await;

        let session = self.state.create_session(product, questions.clone());
        self.state.set_persistent_session(&session.id);
        tracing::info!(
            session_id = %session.id,
            total_sessions = self.state.session_count(),
            "started session"
        );
        (session.id, questions)
    }

    /// Generate interview questions without creating a session.
    pub async fn generate_questions(&self, product: &str, count: usize) -> Vec<String> {
        let count = count.clamp(1, 10);
        let prompt = prompts::questions(product, count);
        self.resolver
            .resolve(
                &prompt,
                Some(SHORT_TIMEOUT),
                parse::string_list,
                fallback_question_bank(product, count),
            )
            .await
    }

    /// Get or create the single persistent session.
    ///
    /// Convenience wrapper for frontends that never juggle session ids; the
    /// core stays multi-session-capable underneath.
    pub fn get_or_create_session(&self) -> (String, Vec<String>) {
        if let Some(existing) = self.state.persistent_session() {
            return (existing.id, existing.questions);
        }

        let questions = vec![
            "How do you currently approach this?".to_string(),
            "What's the biggest challenge you face?".to_string(),
            "What tools or solutions have you considered?".to_string(),
        ];
        let session = self
            .state
            .create_session(PERSISTENT_SESSION_PRODUCT, questions.clone());
        self.state.set_persistent_session(&session.id);
        tracing::info!(session_id = %session.id, "created persistent session");
        (session.id, questions)
    }

    /// Mark the session live, reset its transcript, and seed the question
    /// tracker with the initial questions.
    ///
    /// Re-entrant from `Created`/`Live` (re-seeds, appending). A session that
    /// already ended cannot go live again: status is monotonic.
    pub fn go_live(&self, id: &str) -> Result<(), CoreError> {
        let initial = self.state.with_session(id, |s| {
            if s.status == SessionStatus::PostInterview {
                return Err(CoreError::InvalidState("Session has already ended".into()));
            }
            s.status = SessionStatus::Live;
            s.transcript.clear();
            s.live_started_at = Some(Utc::now());
            Ok(s.questions.clone())
        })??;

        let seeded = self.state.append_questions(id, &initial);
        tracing::info!(session_id = %id, count = seeded.len(), "session live, seeded questions");
        Ok(())
    }

    /// Append one transcript chunk and return LLM-suggested follow-ups,
    /// which are also added to the question tracker.
    pub async fn submit_transcript(&self, id: &str, text: &str) -> Result<Vec<String>, CoreError> {
        let (product, transcript_text) = self.state.with_session(id, |s| {
            if s.status != SessionStatus::Live {
                return Err(CoreError::not_live());
            }
            s.transcript.push(TranscriptEntry {
                text: text.to_string(),
                timestamp: Utc::now(),
            });
            Ok((s.product.clone(), s.transcript_text()))
        })??;

        // The LLM await sits between the transcript append above and the
        // tracker append below; concurrent submits may interleave here.
        let prompt = prompts::followups(&product, &transcript_text);
        let followups = self
            .resolver
            .resolve(
                &prompt,
                Some(SHORT_TIMEOUT),
                parse::string_list,
                fallback_followups(),
            )
            .await;

        self.state.append_questions(id, &followups);
        tracing::info!(session_id = %id, count = followups.len(), "appended follow-ups");
        Ok(followups)
    }

    /// End the live interview. Permissive: also callable straight from
    /// `Created`, without ever having been live.
    pub fn stop(&self, id: &str) -> Result<(), CoreError> {
        self.state.with_session(id, |s| {
            s.status = SessionStatus::PostInterview;
            s.live_ended_at = Some(Utc::now());
        })
    }

    /// Transform the transcript into structured rows, caching them on the
    /// session. Callable in any state once the transcript is non-empty.
    pub async fn analyze(&self, id: &str) -> Result<Vec<AnalysisRow>, CoreError> {
        let (product, transcript_text) = self.state.with_session(id, |s| {
            if s.transcript.is_empty() {
                return Err(CoreError::empty_transcript());
            }
            Ok((s.product.clone(), s.transcript_text()))
        })??;

        let prompt = prompts::analysis(&product, &transcript_text);
        let rows = self
            .resolver
            .resolve(&prompt, None, parse::analysis_rows, fallback_analysis_rows())
            .await;

        self.state.with_session(id, |s| s.rows = rows.clone())?;
        Ok(rows)
    }

    /// Generate the PMF report from product + transcript + cached analysis,
    /// caching it on the session.
    pub async fn report(&self, id: &str) -> Result<Report, CoreError> {
        let (product, transcript_text, rows) = self.state.with_session(id, |s| {
            if s.transcript.is_empty() {
                return Err(CoreError::empty_transcript());
            }
            Ok((s.product.clone(), s.transcript_text(), s.rows.clone()))
        })??;

        let analysis_text = if rows.is_empty() {
            "No structured analysis available".to_string()
        } else {
            serde_json::to_string_pretty(&rows)
                .unwrap_or_else(|_| "No structured analysis available".to_string())
        };

        let prompt = prompts::report(&product, &transcript_text, &analysis_text);
        let report = self
            .resolver
            .resolve(&prompt, None, parse::report, fallback_report())
            .await;

        self.state.with_session(id, |s| s.report = Some(report.clone()))?;
        Ok(report)
    }

    /// Tracked questions plus the current one, for frontend polling.
    pub fn live_questions(
        &self,
        id: &str,
    ) -> Result<(Vec<QuestionItem>, Option<QuestionItem>), CoreError> {
        if self.state.get_session(id).is_none() {
            return Err(CoreError::NotFound(id.to_string()));
        }
        Ok((
            self.state.list_questions(id),
            self.state.current_question(id),
        ))
    }

    pub fn update_question_status(
        &self,
        id: &str,
        question_id: Uuid,
        status: QuestionStatus,
    ) -> Result<(), CoreError> {
        if self.state.get_session(id).is_none() {
            return Err(CoreError::NotFound(id.to_string()));
        }
        self.state.set_question_status(id, question_id, status);
        Ok(())
    }

    pub fn get_session(&self, id: &str) -> Result<Session, CoreError> {
        self.state
            .get_session(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    pub fn list_sessions(&self) -> Vec<Session> {
        self.state.list_sessions()
    }
}

/// Three template questions derived from the product text, used when both
/// backends are unavailable at session start.
fn fallback_initial_questions(product: &str) -> Vec<String> {
    let first_word = product
        .split_whitespace()
        .next()
        .map(|w| w.to_lowercase())
        .unwrap_or_else(|| "your".to_string());
    vec![
        format!("How do you currently handle {first_word} tasks?"),
        "What's the biggest challenge you face in this area?".to_string(),
        "What tools or solutions have you tried?".to_string(),
    ]
}

/// Five-question generic bank for the sessionless endpoint, padded up to the
/// requested count.
fn fallback_question_bank(product: &str, count: usize) -> Vec<String> {
    let first_word = product
        .split_whitespace()
        .next()
        .map(|w| w.to_lowercase())
        .unwrap_or_else(|| "your".to_string());
    let mut base = vec![
        format!("How do you currently handle {first_word} tasks?"),
        "What's the biggest challenge you face in this area?".to_string(),
        "What tools or solutions have you tried?".to_string(),
        "What would an ideal solution look like for you?".to_string(),
        "How do you measure success in this part of your workflow?".to_string(),
    ];
    while base.len() < count {
        base.push("Any other pain points or needs?".to_string());
    }
    base
}

fn fallback_followups() -> Vec<String> {
    vec![
        "Can you tell me more about that?".to_string(),
        "How does that affect your day-to-day work?".to_string(),
    ]
}

fn fallback_analysis_rows() -> Vec<AnalysisRow> {
    vec![AnalysisRow {
        question: "Interview conducted".to_string(),
        answer: "See transcript for details".to_string(),
        category: "Other".to_string(),
    }]
}

fn fallback_report() -> Report {
    Report {
        summary: "Interview completed. Review transcript for insights.".to_string(),
        key_pains: vec!["See transcript for details".to_string()],
        opportunities: vec!["Further analysis recommended".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::resolver::testing::StaticBackend;

    /// Orchestrator whose backends always fail, exercising the canned paths.
    fn degraded() -> Orchestrator {
        Orchestrator::new(
            Arc::new(AppState::new()),
            FallbackResolver::new(StaticBackend::failing(), None),
        )
    }

    fn with_primary(response: &str) -> Orchestrator {
        Orchestrator::new(
            Arc::new(AppState::new()),
            FallbackResolver::new(StaticBackend::ok(response), None),
        )
    }

    #[tokio::test]
    async fn start_returns_three_fallback_questions() {
        let orch = degraded();
        let (id, questions) = orch.start("A CRM for freelancers", 3).await;
        assert_eq!(id.len(), 8);
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0], "How do you currently handle a tasks?");
        assert!(questions.iter().all(|q| !q.is_empty()));
    }

    #[tokio::test]
    async fn start_reuses_persistent_session_and_updates_product() {
        let orch = degraded();
        let (first_id, questions) = orch.start("A CRM for freelancers", 3).await;
        let (second_id, again) = orch.start("An invoicing tool", 3).await;
        assert_eq!(first_id, second_id);
        assert_eq!(questions, again);
        assert_eq!(orch.get_session(&first_id).unwrap().product, "An invoicing tool");
    }

    #[tokio::test]
    async fn start_uses_llm_questions_when_parseable() {
        let orch = with_primary("```json\n[\"Q1?\", \"Q2?\", \"Q3?\"]\n```");
        let (_, questions) = orch.start("a CRM", 3).await;
        assert_eq!(questions, vec!["Q1?", "Q2?", "Q3?"]);
    }

    #[tokio::test]
    async fn status_never_moves_backward() {
        let orch = degraded();
        let (id, _) = orch.start("a CRM", 3).await;
        orch.go_live(&id).unwrap();
        orch.stop(&id).unwrap();
        let err = orch.go_live(&id).unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
        assert_eq!(
            orch.get_session(&id).unwrap().status,
            SessionStatus::PostInterview
        );
    }

    #[tokio::test]
    async fn stop_is_callable_without_go_live() {
        let orch = degraded();
        let (id, _) = orch.start("a CRM", 3).await;
        orch.stop(&id).unwrap();
        let session = orch.get_session(&id).unwrap();
        assert_eq!(session.status, SessionStatus::PostInterview);
        assert!(session.live_ended_at.is_some());
    }

    #[tokio::test]
    async fn transcript_has_one_entry_per_submission_in_order() {
        let orch = degraded();
        let (id, _) = orch.start("a CRM", 3).await;
        orch.go_live(&id).unwrap();
        for text in ["one", "two", "three"] {
            orch.submit_transcript(&id, text).await.unwrap();
        }
        let session = orch.get_session(&id).unwrap();
        assert_eq!(session.transcript.len(), 3);
        let texts: Vec<_> = session.transcript.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn submit_transcript_requires_live_session() {
        let orch = degraded();
        let (id, _) = orch.start("a CRM", 3).await;
        let err = orch.submit_transcript(&id, "hello").await.unwrap_err();
        assert_eq!(err, CoreError::not_live());

        let missing = orch.submit_transcript("nope", "hello").await.unwrap_err();
        assert!(matches!(missing, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn submit_appends_two_followups_to_tracker() {
        let orch = degraded();
        let (id, _) = orch.start("a CRM", 3).await;
        orch.go_live(&id).unwrap();
        let followups = orch
            .submit_transcript(&id, "I currently use spreadsheets")
            .await
            .unwrap();
        assert_eq!(
            followups,
            vec![
                "Can you tell me more about that?",
                "How does that affect your day-to-day work?"
            ]
        );

        // 3 initial + 2 follow-ups, all pending
        let (items, current) = orch.live_questions(&id).unwrap();
        assert_eq!(items.len(), 5);
        assert!(items.iter().all(|q| q.status == QuestionStatus::Pending));
        assert_eq!(current.unwrap().order, 0);
    }

    #[tokio::test]
    async fn analyze_requires_non_empty_transcript() {
        let orch = degraded();
        let (id, _) = orch.start("a CRM", 3).await;
        let err = orch.analyze(&id).await.unwrap_err();
        assert_eq!(err, CoreError::empty_transcript());
    }

    #[tokio::test]
    async fn analyze_caches_fallback_row() {
        let orch = degraded();
        let (id, _) = orch.start("a CRM", 3).await;
        orch.go_live(&id).unwrap();
        orch.submit_transcript(&id, "spreadsheets").await.unwrap();

        let rows = orch.analyze(&id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].question, "Interview conducted");
        assert_eq!(orch.get_session(&id).unwrap().rows, rows);
    }

    #[tokio::test]
    async fn report_fallback_matches_fixed_triple() {
        let orch = degraded();
        let (id, _) = orch.start("a CRM", 3).await;
        orch.go_live(&id).unwrap();
        orch.submit_transcript(&id, "spreadsheets").await.unwrap();
        orch.analyze(&id).await.unwrap();

        let report = orch.report(&id).await.unwrap();
        assert_eq!(
            report,
            Report {
                summary: "Interview completed. Review transcript for insights.".into(),
                key_pains: vec!["See transcript for details".into()],
                opportunities: vec!["Further analysis recommended".into()],
            }
        );
        assert_eq!(orch.get_session(&id).unwrap().report, Some(report));
    }

    #[tokio::test]
    async fn generate_questions_clamps_and_pads() {
        let orch = degraded();
        let questions = orch.generate_questions("a CRM", 7).await;
        assert_eq!(questions.len(), 7);
        assert_eq!(questions[5], "Any other pain points or needs?");

        let few = orch.generate_questions("a CRM", 0).await;
        // clamped to 1, but the bank never shrinks below its base five
        assert_eq!(few.len(), 5);
    }

    #[tokio::test]
    async fn persistent_session_is_stable() {
        let orch = degraded();
        let (id, questions) = orch.get_or_create_session();
        assert_eq!(questions.len(), 3);
        let (again, _) = orch.get_or_create_session();
        assert_eq!(id, again);
        assert_eq!(
            orch.get_session(&id).unwrap().product,
            "Interview Session"
        );
    }

    #[tokio::test]
    async fn done_question_disappears_from_listing() {
        let orch = degraded();
        let (id, _) = orch.start("a CRM", 3).await;
        orch.go_live(&id).unwrap();
        let (items, _) = orch.live_questions(&id).unwrap();
        orch.update_question_status(&id, items[0].id, QuestionStatus::Done)
            .unwrap();
        let (after, _) = orch.live_questions(&id).unwrap();
        assert_eq!(after.len(), 2);
        assert!(after.iter().all(|q| q.id != items[0].id));
    }
}
