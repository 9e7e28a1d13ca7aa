//! HTTP API v1 — the chat surface behind the browser UI.
//!
//! Endpoints:
//!
//! - `GET  /v1/options`              — Models, personas, slider ranges
//! - `POST /v1/sessions`             — Create a session
//! - `GET  /v1/sessions/{id}`        — Completed turns of a session
//! - `POST /v1/sessions/{id}/reset`  — Clear a session's history
//! - `POST /v1/chat`                 — Ask a question, get the answer
//! - `POST /v1/chat/stream`          — Ask a question, get an SSE stream
//! - `GET  /v1/suggest`              — A random starter question

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    response::sse::{Event as SseEvent, Sse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use personachat_config::{AppConfig, Catalog};
use personachat_core::error::{Error, SessionError};
use personachat_core::session::{ChatSession, SessionId, Turn};
use personachat_core::window::{INTRODUCTION, MemoryLength};
use personachat_core::{ChatService, ChatSettings, StarterQuestions};

// ── State ─────────────────────────────────────────────────────────────────

/// Maximum number of in-memory sessions before the oldest are evicted.
const MAX_SESSIONS: usize = 1_000;

/// A stored session. Each one has its own lock so a turn on one session
/// never blocks another.
pub struct SessionSlot {
    /// Creation order, used to pick the eviction victim.
    seq: u64,
    pub session: Arc<Mutex<ChatSession>>,
}

/// Shared state for the v1 API.
pub struct ApiV1State {
    pub chat: ChatService,
    pub catalog: Catalog,
    pub config: AppConfig,
    pub starter: Option<StarterQuestions>,
    pub sessions: RwLock<HashMap<String, SessionSlot>>,
    next_seq: AtomicU64,
}

impl ApiV1State {
    pub fn new(chat: ChatService, config: AppConfig, starter: Option<StarterQuestions>) -> Self {
        Self {
            chat,
            catalog: config.catalog(),
            config,
            starter,
            sessions: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Look up a session, creating it under `id` if it does not exist.
    async fn session(&self, id: Option<String>) -> (String, Arc<Mutex<ChatSession>>) {
        if let Some(id) = &id {
            if let Some(slot) = self.sessions.read().await.get(id) {
                return (id.clone(), slot.session.clone());
            }
        }

        let session = match id {
            Some(id) => ChatSession::with_id(SessionId::from(&id)),
            None => ChatSession::new(),
        };
        let id = session.id.to_string();

        let mut sessions = self.sessions.write().await;
        // Another request may have created it since the read lock was dropped
        if let Some(slot) = sessions.get(&id) {
            return (id, slot.session.clone());
        }
        evict_oldest(&mut sessions);
        let handle = Arc::new(Mutex::new(session));
        sessions.insert(
            id.clone(),
            SessionSlot {
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                session: handle.clone(),
            },
        );
        (id, handle)
    }

    async fn existing_session(&self, id: &str) -> Option<Arc<Mutex<ChatSession>>> {
        self.sessions
            .read()
            .await
            .get(id)
            .map(|slot| slot.session.clone())
    }

    /// Resolve the per-turn settings from a request, falling back to the
    /// configured defaults.
    fn settings(&self, payload: &ChatRequest) -> Result<ChatSettings, ApiError> {
        let model = payload
            .model
            .clone()
            .unwrap_or_else(|| self.config.default_model.clone());
        if !self.catalog.has_model(&model) {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("Unknown model '{model}'"),
            ));
        }

        let persona = match &payload.persona {
            Some(name) => self.catalog.persona(name),
            None => self.catalog.default_persona(),
        }
        .ok_or_else(|| {
            api_error(
                StatusCode::BAD_REQUEST,
                format!(
                    "Unknown persona '{}'",
                    payload.persona.as_deref().unwrap_or_default()
                ),
            )
        })?;

        let memory_length = match payload.memory_length {
            Some(n) => MemoryLength::new(n)
                .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?,
            None => self.config.memory_length(),
        };

        let temperature = payload
            .temperature
            .unwrap_or(self.config.default_temperature);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "temperature must be between 0.0 and 2.0",
            ));
        }

        Ok(ChatSettings {
            model,
            persona: persona.prompt.clone(),
            memory_length,
            temperature,
            top_p: self.config.default_top_p,
            stop: self.config.stop.clone(),
            max_tokens: self.config.default_max_tokens,
        })
    }
}

fn evict_oldest(sessions: &mut HashMap<String, SessionSlot>) {
    if sessions.len() < MAX_SESSIONS {
        return;
    }
    if let Some(oldest_key) = sessions
        .iter()
        .min_by_key(|(_, slot)| slot.seq)
        .map(|(k, _)| k.clone())
    {
        sessions.remove(&oldest_key);
    }
}

pub type SharedApiState = Arc<ApiV1State>;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/options", get(options_handler))
        .route("/sessions", post(create_session_handler))
        .route("/sessions/{id}", get(get_session_handler))
        .route("/sessions/{id}/reset", post(reset_session_handler))
        .route("/chat", post(chat_handler))
        .route("/chat/stream", post(chat_stream_handler))
        .route("/suggest", get(suggest_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ChatRequest {
    /// Existing session ID (omit to create new).
    #[serde(default)]
    session_id: Option<String>,
    /// The user's question.
    message: String,
    #[serde(default)]
    model: Option<String>,
    /// Persona display name.
    #[serde(default)]
    persona: Option<String>,
    #[serde(default)]
    memory_length: Option<usize>,
    #[serde(default)]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatResponse {
    session_id: String,
    answer: String,
    model: String,
    turns: usize,
}

#[derive(Serialize)]
struct OptionsResponse {
    introduction: &'static str,
    models: Vec<String>,
    default_model: String,
    personas: Vec<PersonaDto>,
    default_persona: Option<String>,
    memory_length: RangeDto,
    temperature: f32,
    suggestions: bool,
}

#[derive(Serialize)]
struct PersonaDto {
    name: String,
    prompt: String,
}

#[derive(Serialize)]
struct RangeDto {
    min: usize,
    max: usize,
    default: usize,
}

#[derive(Serialize)]
struct SessionResponse {
    id: String,
    turns: Vec<Turn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pending_question: Option<String>,
    created_at: String,
    updated_at: String,
}

#[derive(Serialize)]
struct SuggestResponse {
    question: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a failed turn onto an HTTP status. Provider failures are surfaced as
/// a bad gateway with the provider's message.
fn turn_error(e: Error) -> ApiError {
    let status = match &e {
        Error::Provider(_) => StatusCode::BAD_GATEWAY,
        Error::Session(SessionError::QuestionPending) => StatusCode::CONFLICT,
        Error::Session(_) | Error::Window(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!(error = %e, "Chat turn failed");
    }
    api_error(status, e.to_string())
}

fn session_response(session: &ChatSession) -> SessionResponse {
    SessionResponse {
        id: session.id.to_string(),
        turns: session.turns(),
        pending_question: session.pending_question().map(String::from),
        created_at: session.created_at.to_rfc3339(),
        updated_at: session.updated_at.to_rfc3339(),
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn options_handler(State(state): State<SharedApiState>) -> Json<OptionsResponse> {
    Json(OptionsResponse {
        introduction: INTRODUCTION,
        models: state.catalog.models().to_vec(),
        default_model: state.config.default_model.clone(),
        personas: state
            .catalog
            .personas()
            .iter()
            .map(|p| PersonaDto {
                name: p.name.clone(),
                prompt: p.prompt.clone(),
            })
            .collect(),
        default_persona: state.catalog.default_persona().map(|p| p.name.clone()),
        memory_length: RangeDto {
            min: MemoryLength::MIN,
            max: MemoryLength::MAX,
            default: state.config.memory_length().get(),
        },
        temperature: state.config.default_temperature,
        suggestions: state.starter.is_some(),
    })
}

async fn create_session_handler(
    State(state): State<SharedApiState>,
) -> (StatusCode, Json<SessionResponse>) {
    let (_, session) = state.session(None).await;
    let session = session.lock().await;
    info!(session = %session.id, "Session created");
    (StatusCode::CREATED, Json(session_response(&session)))
}

async fn get_session_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, StatusCode> {
    let session = state
        .existing_session(&id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    let session = session.lock().await;
    Ok(Json(session_response(&session)))
}

async fn reset_session_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, StatusCode> {
    let session = state
        .existing_session(&id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    let mut session = session.lock().await;
    session.reset();
    info!(session = %session.id, "Session reset");
    Ok(Json(session_response(&session)))
}

async fn chat_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let settings = state.settings(&payload)?;
    let (session_id, session) = state.session(payload.session_id.clone()).await;
    info!(session = %session_id, model = %settings.model, "v1/chat request");

    let mut session = session.lock().await;
    let answer = state
        .chat
        .ask(&mut session, &settings, &payload.message)
        .await
        .map_err(turn_error)?;

    Ok(Json(ChatResponse {
        session_id,
        answer,
        model: settings.model,
        turns: session.len(),
    }))
}

async fn chat_stream_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let settings = state.settings(&payload)?;
    let (session_id, session) = state.session(payload.session_id.clone()).await;
    info!(session = %session_id, model = %settings.model, "v1/chat/stream SSE request");

    let rx = state
        .chat
        .ask_stream(session, &settings, &payload.message)
        .await
        .map_err(turn_error)?;

    let stream = ReceiverStream::new(rx).map(|event| {
        let event_type = event.event_type();
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(SseEvent::default().event(event_type).data(data))
    });

    Ok(Sse::new(stream))
}

async fn suggest_handler(
    State(state): State<SharedApiState>,
) -> Result<Json<SuggestResponse>, ApiError> {
    let question = state
        .starter
        .as_ref()
        .and_then(StarterQuestions::random)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "No starter questions configured"))?;

    Ok(Json(SuggestResponse {
        question: question.to_string(),
    }))
}
