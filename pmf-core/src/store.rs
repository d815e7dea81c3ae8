//! In-memory state container for sessions and tracked questions.
//!
//! One `AppState` lives for the whole process; there is no persistence and no
//! session deletion. Locks are only held across synchronous sections, never
//! across awaits, so concurrent handlers may interleave between a read and a
//! later write (accepted for single-interviewer usage).

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{QuestionItem, QuestionStatus, Session};

#[derive(Debug, Default)]
struct QuestionLog {
    items: Vec<QuestionItem>,
    /// Strictly increasing per session; not reset by removals.
    next_order: usize,
}

#[derive(Debug, Default)]
pub struct AppState {
    sessions: Mutex<HashMap<String, Session>>,
    questions: Mutex<HashMap<String, QuestionLog>>,
    /// Single persistent session slot used by the convenience flow.
    current_session: Mutex<Option<String>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    // -- sessions ----------------------------------------------------------

    pub fn create_session(&self, product: impl Into<String>, questions: Vec<String>) -> Session {
        let session = Session::new(product, questions);
        lock(&self.sessions).insert(session.id.clone(), session.clone());
        tracing::debug!(session_id = %session.id, "created session");
        session
    }

    pub fn get_session(&self, id: &str) -> Option<Session> {
        lock(&self.sessions).get(id).cloned()
    }

    pub fn session_count(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn list_sessions(&self) -> Vec<Session> {
        lock(&self.sessions).values().cloned().collect()
    }

    /// Run a closure against a session under the lock.
    pub fn with_session<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<R, CoreError> {
        let mut sessions = lock(&self.sessions);
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        Ok(f(session))
    }

    // -- persistent session slot -------------------------------------------

    /// Returns the persistent session if the slot points at a live entry.
    pub fn persistent_session(&self) -> Option<Session> {
        let current = lock(&self.current_session);
        current.as_deref().and_then(|id| self.get_session(id))
    }

    pub fn set_persistent_session(&self, id: &str) {
        *lock(&self.current_session) = Some(id.to_string());
    }

    // -- question tracker --------------------------------------------------

    /// Append question texts as pending items with increasing order.
    pub fn append_questions(&self, session_id: &str, texts: &[String]) -> Vec<QuestionItem> {
        let mut questions = lock(&self.questions);
        let log = questions.entry(session_id.to_string()).or_default();
        let mut added = Vec::with_capacity(texts.len());
        for text in texts {
            let item = QuestionItem::new(text.clone(), log.next_order);
            log.next_order += 1;
            log.items.push(item.clone());
            added.push(item);
        }
        added
    }

    /// All tracked items for a session, ordered by insertion.
    pub fn list_questions(&self, session_id: &str) -> Vec<QuestionItem> {
        let mut items = lock(&self.questions)
            .get(session_id)
            .map(|log| log.items.clone())
            .unwrap_or_default();
        items.sort_by_key(|q| q.order);
        items
    }

    /// The active item, else the lowest-order pending item, else none.
    pub fn current_question(&self, session_id: &str) -> Option<QuestionItem> {
        let items = self.list_questions(session_id);
        items
            .iter()
            .find(|q| q.status == QuestionStatus::Active)
            .or_else(|| items.iter().find(|q| q.status == QuestionStatus::Pending))
            .cloned()
    }

    /// Apply a status update to one tracked question.
    ///
    /// Done and skipped remove the item; activating one item reverts any
    /// other active item to pending, so at most one is active at a time.
    pub fn set_question_status(&self, session_id: &str, question_id: Uuid, status: QuestionStatus) {
        let mut questions = lock(&self.questions);
        let log = questions.entry(session_id.to_string()).or_default();

        if status.is_terminal() {
            let before = log.items.len();
            log.items.retain(|q| q.id != question_id);
            tracing::debug!(
                %question_id,
                status = status.as_str(),
                removed = before - log.items.len(),
                remaining = log.items.len(),
                "removed question"
            );
            return;
        }

        for item in &mut log.items {
            if item.id == question_id {
                item.status = status;
            } else if status == QuestionStatus::Active && item.status == QuestionStatus::Active {
                item.status = QuestionStatus::Pending;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionStatus;

    #[test]
    fn create_and_get_session() {
        let state = AppState::new();
        let session = state.create_session("a CRM", vec!["Q1?".into()]);
        let fetched = state.get_session(&session.id).unwrap();
        assert_eq!(fetched.product, "a CRM");
        assert_eq!(fetched.status, SessionStatus::Created);
        assert!(state.get_session("nope").is_none());
    }

    #[test]
    fn with_session_unknown_id_is_not_found() {
        let state = AppState::new();
        let err = state.with_session("missing", |_| ()).unwrap_err();
        assert_eq!(err, CoreError::NotFound("missing".into()));
    }

    #[test]
    fn persistent_slot_round_trips() {
        let state = AppState::new();
        assert!(state.persistent_session().is_none());
        let session = state.create_session("p", vec![]);
        state.set_persistent_session(&session.id);
        assert_eq!(state.persistent_session().unwrap().id, session.id);
    }

    #[test]
    fn append_assigns_increasing_order() {
        let state = AppState::new();
        state.append_questions("s1", &["a?".into(), "b?".into()]);
        state.append_questions("s1", &["c?".into()]);
        let items = state.list_questions("s1");
        assert_eq!(items.len(), 3);
        assert_eq!(
            items.iter().map(|q| q.order).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(items.iter().all(|q| q.status == QuestionStatus::Pending));
    }

    #[test]
    fn at_most_one_active_item() {
        let state = AppState::new();
        let added = state.append_questions("s1", &["a?".into(), "b?".into()]);
        state.set_question_status("s1", added[0].id, QuestionStatus::Active);
        state.set_question_status("s1", added[1].id, QuestionStatus::Active);
        let items = state.list_questions("s1");
        let active: Vec<_> = items
            .iter()
            .filter(|q| q.status == QuestionStatus::Active)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, added[1].id);
    }

    #[test]
    fn done_removes_item_and_keeps_order_of_survivors() {
        let state = AppState::new();
        let added = state.append_questions("s1", &["a?".into(), "b?".into(), "c?".into()]);
        state.set_question_status("s1", added[1].id, QuestionStatus::Done);
        let items = state.list_questions("s1");
        assert_eq!(items.len(), 2);
        assert_eq!(
            items.iter().map(|q| q.order).collect::<Vec<_>>(),
            vec![0, 2]
        );
        // orders keep increasing after a removal
        let later = state.append_questions("s1", &["d?".into()]);
        assert_eq!(later[0].order, 3);
    }

    #[test]
    fn current_prefers_active_then_lowest_pending() {
        let state = AppState::new();
        assert!(state.current_question("s1").is_none());
        let added = state.append_questions("s1", &["a?".into(), "b?".into()]);
        assert_eq!(state.current_question("s1").unwrap().id, added[0].id);
        state.set_question_status("s1", added[1].id, QuestionStatus::Active);
        assert_eq!(state.current_question("s1").unwrap().id, added[1].id);
        state.set_question_status("s1", added[1].id, QuestionStatus::Done);
        assert_eq!(state.current_question("s1").unwrap().id, added[0].id);
    }
}
