//! One chat turn: record the question, render the context window, call the
//! provider and record the answer.
//!
//! The persona always travels as the `system` message and the rendered
//! window as the single `user` message.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard, mpsc};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::message::Message;
use crate::provider::{ChunkReceiver, Provider, ProviderRequest, Usage};
use crate::session::ChatSession;
use crate::window::MemoryLength;

/// Per-turn knobs chosen in the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    pub model: String,
    /// Persona instruction text, sent verbatim as the system message.
    pub persona: String,
    #[serde(default)]
    pub memory_length: MemoryLength,
    pub temperature: f32,
    pub top_p: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatSettings {
    /// Build the provider request for a rendered prompt.
    pub fn request(&self, prompt: String, stream: bool) -> ProviderRequest {
        ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::system(&self.persona), Message::user(prompt)],
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            stream,
            stop: self.stop.clone(),
        }
    }
}

/// Events emitted while a streamed answer is produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// Partial text from the model.
    Chunk { content: String },

    /// The answer is complete and recorded in the session.
    Done {
        session_id: String,
        answer: String,
        usage: Option<Usage>,
    },

    /// The turn failed; the question was withdrawn.
    Error { message: String },
}

impl ChatEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

/// Runs chat turns against a provider.
#[derive(Clone)]
pub struct ChatService {
    provider: Arc<dyn Provider>,
}

impl ChatService {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }

    /// Record the question and build the request for it.
    ///
    /// If rendering fails the question is withdrawn again.
    pub fn prepare(
        &self,
        session: &mut ChatSession,
        settings: &ChatSettings,
        question: &str,
        stream: bool,
    ) -> Result<ProviderRequest> {
        session.record_question(question)?;
        match session.render_prompt(settings.memory_length) {
            Ok(prompt) => {
                debug!(
                    session = %session.id,
                    prompt_chars = prompt.len(),
                    memory_length = %settings.memory_length,
                    "Rendered context window"
                );
                Ok(settings.request(prompt, stream))
            }
            Err(e) => {
                session.withdraw_question();
                Err(e.into())
            }
        }
    }

    /// Ask a question and wait for the full answer.
    ///
    /// Dropping the returned future before it resolves withdraws the question.
    pub async fn ask(
        &self,
        session: &mut ChatSession,
        settings: &ChatSettings,
        question: &str,
    ) -> Result<String> {
        let request = self.prepare(session, settings, question, false)?;
        let mut turn = PendingTurn::new(session);
        info!(session = %turn.id, model = %settings.model, "Chat turn started");

        match self.provider.complete(request).await {
            Ok(response) => {
                let answer = response.message.content;
                turn.finish(answer.clone())?;
                info!(
                    session = %turn.id,
                    turns = turn.len(),
                    tokens = response.usage.map(|u| u.total_tokens).unwrap_or(0),
                    "Chat turn completed"
                );
                Ok(answer)
            }
            Err(e) => {
                warn!(session = %turn.id, error = %e, "Completion failed");
                turn.withdraw();
                Err(e.into())
            }
        }
    }

    /// Ask a question and stream the answer.
    ///
    /// The session stays locked until the stream finishes, so a session never
    /// runs two turns at once. The assembled answer is recorded before the
    /// final `Done` event is sent.
    pub async fn ask_stream(
        &self,
        session: Arc<Mutex<ChatSession>>,
        settings: &ChatSettings,
        question: &str,
    ) -> Result<mpsc::Receiver<ChatEvent>> {
        let mut guard = session.lock_owned().await;
        let request = self.prepare(&mut guard, settings, question, true)?;
        let mut turn = PendingTurn::new(guard);
        info!(session = %turn.id, model = %settings.model, "Streaming chat turn started");

        let chunks = match self.provider.stream(request).await {
            Ok(rx) => rx,
            Err(e) => {
                warn!(session = %turn.id, error = %e, "Streaming completion failed");
                turn.withdraw();
                return Err(e.into());
            }
        };

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(forward_stream(turn, chunks, tx));
        Ok(rx)
    }
}

/// A session holding a recorded question that still waits for its answer.
///
/// Dropped without `finish` or `withdraw` (a cancelled request, a client
/// that went away), it withdraws the question so the session can take the
/// next one.
struct PendingTurn<S: DerefMut<Target = ChatSession>> {
    session: S,
    open: bool,
}

impl<S: DerefMut<Target = ChatSession>> PendingTurn<S> {
    fn new(session: S) -> Self {
        Self {
            session,
            open: true,
        }
    }

    fn finish(&mut self, answer: String) -> std::result::Result<(), SessionError> {
        self.session.record_answer(answer)?;
        self.open = false;
        Ok(())
    }

    fn withdraw(&mut self) {
        self.session.withdraw_question();
        self.open = false;
    }
}

impl<S: DerefMut<Target = ChatSession>> Deref for PendingTurn<S> {
    type Target = ChatSession;

    fn deref(&self) -> &ChatSession {
        &self.session
    }
}

impl<S: DerefMut<Target = ChatSession>> Drop for PendingTurn<S> {
    fn drop(&mut self) {
        if self.open {
            if let Some(question) = self.session.withdraw_question() {
                debug!(
                    session = %self.session.id,
                    chars = question.len(),
                    "Turn abandoned, question withdrawn"
                );
            }
        }
    }
}

async fn forward_stream(
    mut turn: PendingTurn<OwnedMutexGuard<ChatSession>>,
    mut chunks: ChunkReceiver,
    tx: mpsc::Sender<ChatEvent>,
) {
    let mut answer = String::new();
    let mut usage = None;

    while let Some(next) = chunks.recv().await {
        match next {
            Ok(chunk) => {
                if let Some(content) = chunk.content.filter(|c| !c.is_empty()) {
                    answer.push_str(&content);
                    // A dropped receiver does not abort the turn; keep collecting.
                    let _ = tx.send(ChatEvent::Chunk { content }).await;
                }
                if chunk.usage.is_some() {
                    usage = chunk.usage;
                }
                if chunk.done {
                    break;
                }
            }
            Err(e) => {
                warn!(session = %turn.id, error = %e, "Stream failed mid-answer");
                turn.withdraw();
                let _ = tx.send(ChatEvent::Error { message: e.to_string() }).await;
                return;
            }
        }
    }

    if let Err(e) = turn.finish(answer.clone()) {
        let _ = tx.send(ChatEvent::Error { message: e.to_string() }).await;
        return;
    }
    info!(session = %turn.id, turns = turn.len(), "Streaming chat turn completed");

    let _ = tx
        .send(ChatEvent::Done {
            session_id: turn.id.to_string(),
            answer,
            usage,
        })
        .await;
}
