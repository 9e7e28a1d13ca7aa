//! Context window builder.
//!
//! Renders the bounded conversational history into the single text prompt
//! that is sent as the `user` message of the next completion request. The
//! whole recap is re-rendered on every turn; the provider never sees a
//! native multi-message history.

use crate::error::WindowError;
use serde::{Deserialize, Serialize};

/// Static introduction that opens every rendered prompt.
///
/// On the first turn of a session it is also the only header.
pub const INTRODUCTION: &str = "\n    Hello! I'm your friendly chatbot. I have multiple personalities with expert knowledge to answer any of your questions, provide information, or just chat. I'm also super fast! Let's start our conversation!\n";

/// Header placed in front of the rendered prior exchanges.
pub const RECAP_HEADER: &str = "\n    As a recap, here is the current conversation:\n\n";

/// Number of trailing turns included in a rendered prompt (1–10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct MemoryLength(usize);

impl MemoryLength {
    pub const MIN: usize = 1;
    pub const MAX: usize = 10;
    pub const DEFAULT: MemoryLength = MemoryLength(5);

    pub fn new(turns: usize) -> Result<Self, WindowError> {
        if (Self::MIN..=Self::MAX).contains(&turns) {
            Ok(Self(turns))
        } else {
            Err(WindowError::MemoryLengthOutOfRange {
                got: turns,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for MemoryLength {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<usize> for MemoryLength {
    type Error = WindowError;

    fn try_from(turns: usize) -> Result<Self, Self::Error> {
        Self::new(turns)
    }
}

impl From<MemoryLength> for usize {
    fn from(length: MemoryLength) -> Self {
        length.0
    }
}

impl std::fmt::Display for MemoryLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keep the last `n` elements of a slice.
fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

/// Render the prompt for the next turn.
///
/// Both sequences are cut to their last `memory_length` entries independently
/// and then paired by position, so pairing stops at the shorter one. The last
/// user turn is always repeated in the trailing `Human:`/`AI:` stub.
///
/// Fails only when `user_turns` is empty.
pub fn render_prompt<S: AsRef<str>>(
    user_turns: &[S],
    assistant_turns: &[S],
    memory_length: MemoryLength,
) -> Result<String, WindowError> {
    let users = tail(user_turns, memory_length.get());
    let answers = tail(assistant_turns, memory_length.get());
    let last_question = users.last().ok_or(WindowError::EmptyHistory)?;

    let mut prompt = String::from(INTRODUCTION);

    if !answers.is_empty() {
        let recap = users
            .iter()
            .zip(answers)
            .map(|(q, a)| format!("Human: {}\nAI: {}", q.as_ref(), a.as_ref()))
            .collect::<Vec<_>>()
            .join("\n");
        prompt.push_str(RECAP_HEADER);
        prompt.push_str(&recap);
    }

    prompt.push_str(&format!(
        "\n    Human: {}\n    AI:\n",
        last_question.as_ref()
    ));

    Ok(prompt)
}
