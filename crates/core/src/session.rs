//! Session-scoped chat history.
//!
//! A [`ChatSession`] owns two parallel append-only sequences: the questions
//! the user asked and the answers the assistant gave. A question is recorded
//! before its answer exists, so there are never more than one more question
//! than answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SessionError, WindowError};
use crate::window::{MemoryLength, render_prompt};

/// Unique identifier for a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One completed exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub user: String,
    pub assistant: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct History {
    questions: Vec<String>,
    answers: Vec<String>,
}

/// The history of one chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: SessionId,
    history: History,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Create a new empty session.
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    /// Create a new empty session with a caller-chosen id.
    pub fn with_id(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            history: History::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Record the user's next question.
    pub fn record_question(&mut self, question: impl Into<String>) -> Result<(), SessionError> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(SessionError::EmptyQuestion);
        }
        if self.pending_question().is_some() {
            return Err(SessionError::QuestionPending);
        }
        self.history.questions.push(question);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record the answer to the pending question.
    pub fn record_answer(&mut self, answer: impl Into<String>) -> Result<(), SessionError> {
        if self.pending_question().is_none() {
            return Err(SessionError::NoPendingQuestion);
        }
        self.history.answers.push(answer.into());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Drop the pending question after a failed completion.
    pub fn withdraw_question(&mut self) -> Option<String> {
        self.pending_question()?;
        self.updated_at = Utc::now();
        self.history.questions.pop()
    }

    /// The question still waiting for an answer, if any.
    pub fn pending_question(&self) -> Option<&str> {
        if self.history.questions.len() > self.history.answers.len() {
            self.history.questions.last().map(String::as_str)
        } else {
            None
        }
    }

    /// Clear the history. Both sequences are replaced in one assignment.
    pub fn reset(&mut self) {
        self.history = History::default();
        self.updated_at = Utc::now();
    }

    /// Render the prompt for the pending (or latest) question.
    pub fn render_prompt(&self, memory_length: MemoryLength) -> Result<String, WindowError> {
        render_prompt(
            &self.history.questions,
            &self.history.answers,
            memory_length,
        )
    }

    /// All completed exchanges, oldest first.
    pub fn turns(&self) -> Vec<Turn> {
        self.history
            .questions
            .iter()
            .zip(&self.history.answers)
            .map(|(q, a)| Turn {
                user: q.clone(),
                assistant: a.clone(),
            })
            .collect()
    }

    pub fn questions(&self) -> &[String] {
        &self.history.questions
    }

    pub fn answers(&self) -> &[String] {
        &self.history.answers
    }

    /// Number of completed exchanges.
    pub fn len(&self) -> usize {
        self.history.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.questions.is_empty()
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_then_answer_makes_a_turn() {
        let mut session = ChatSession::new();
        session.record_question("Who are you?").unwrap();
        assert_eq!(session.pending_question(), Some("Who are you?"));
        assert_eq!(session.len(), 0);

        session.record_answer("A pirate named Raul.").unwrap();
        assert!(session.pending_question().is_none());
        assert_eq!(
            session.turns(),
            vec![Turn {
                user: "Who are you?".into(),
                assistant: "A pirate named Raul.".into(),
            }]
        );
    }

    #[test]
    fn second_question_while_pending_is_rejected() {
        let mut session = ChatSession::new();
        session.record_question("one").unwrap();
        assert_eq!(
            session.record_question("two"),
            Err(SessionError::QuestionPending)
        );
        assert_eq!(session.questions().len(), 1);
    }

    #[test]
    fn answer_without_question_is_rejected() {
        let mut session = ChatSession::new();
        assert_eq!(
            session.record_answer("orphan"),
            Err(SessionError::NoPendingQuestion)
        );
    }

    #[test]
    fn blank_question_is_rejected() {
        let mut session = ChatSession::new();
        assert_eq!(
            session.record_question("   "),
            Err(SessionError::EmptyQuestion)
        );
        assert!(session.is_empty());
    }

    #[test]
    fn withdraw_restores_invariant() {
        let mut session = ChatSession::new();
        session.record_question("q1").unwrap();
        session.record_answer("a1").unwrap();
        session.record_question("q2").unwrap();

        assert_eq!(session.withdraw_question().as_deref(), Some("q2"));
        assert_eq!(session.questions().len(), session.answers().len());
        // Nothing pending: completed turns are never withdrawn.
        assert!(session.withdraw_question().is_none());
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn reset_clears_both_sequences() {
        let mut session = ChatSession::new();
        session.record_question("q1").unwrap();
        session.record_answer("a1").unwrap();
        session.record_question("q2").unwrap();
        session.reset();
        assert!(session.is_empty());
        assert!(session.answers().is_empty());
        assert!(session.pending_question().is_none());
        assert_eq!(
            session.render_prompt(MemoryLength::DEFAULT),
            Err(WindowError::EmptyHistory)
        );
    }

    #[test]
    fn render_uses_session_history() {
        let mut session = ChatSession::new();
        session.record_question("A").unwrap();
        session.record_answer("a1").unwrap();
        session.record_question("B").unwrap();
        let prompt = session.render_prompt(MemoryLength::DEFAULT).unwrap();
        assert!(prompt.contains("Human: A\nAI: a1"));
        assert!(prompt.ends_with("Human: B\n    AI:\n"));
    }

    #[test]
    fn session_serialization_roundtrip() {
        let mut session = ChatSession::with_id(SessionId::from("abc"));
        session.record_question("hello").unwrap();
        let json = serde_json::to_string(&session).unwrap();
        let back: ChatSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, SessionId::from("abc"));
        assert_eq!(back.pending_question(), Some("hello"));
    }
}
