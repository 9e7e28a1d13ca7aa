//! Error types for the PersonaChat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all PersonaChat operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Session / history errors ---
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    // --- Context window errors ---
    #[error("Context window error: {0}")]
    Window(#[from] WindowError),

    // --- Starter question errors ---
    #[error("Starter questions error: {0}")]
    Starter(#[from] StarterError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("A question is already waiting for its answer")]
    QuestionPending,

    #[error("There is no pending question to answer")]
    NoPendingQuestion,

    #[error("Question is empty")]
    EmptyQuestion,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("Cannot render a prompt without at least one user turn")]
    EmptyHistory,

    #[error("Memory length must be between {min} and {max}, got {got}")]
    MemoryLengthOutOfRange { got: usize, min: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum StarterError {
    #[error("Failed to read starter questions from {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Starter questions file {0} has no questions")]
    Empty(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn memory_length_error_names_bounds() {
        let err = Error::Window(WindowError::MemoryLengthOutOfRange {
            got: 11,
            min: 1,
            max: 10,
        });
        let text = err.to_string();
        assert!(text.contains("11"));
        assert!(text.contains("between 1 and 10"));
    }

    #[test]
    fn session_error_converts_into_top_level() {
        let err: Error = SessionError::QuestionPending.into();
        assert!(matches!(err, Error::Session(SessionError::QuestionPending)));
    }
}
