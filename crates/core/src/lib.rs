//! # PersonaChat Core
//!
//! Domain types, traits, and error definitions for PersonaChat.
//! This crate has **no HTTP or UI dependencies**: it defines the chat
//! history, the context window builder, and the provider abstraction that
//! the other crates implement against.

pub mod chat;
pub mod error;
pub mod message;
pub mod provider;
pub mod session;
pub mod starter;
pub mod window;

// Re-export key types at crate root for ergonomics
pub use chat::{ChatEvent, ChatService, ChatSettings};
pub use error::{Error, Result};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage};
pub use session::{ChatSession, SessionId, Turn};
pub use starter::StarterQuestions;
pub use window::{MemoryLength, render_prompt};
