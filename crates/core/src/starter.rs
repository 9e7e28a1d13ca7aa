//! Starter questions for the "suggest a question" action.
//!
//! Questions come from a plain text file, one per line.

use std::path::Path;

use rand::seq::IndexedRandom;

use crate::error::StarterError;

/// A pool of starter questions loaded from a line-delimited file.
#[derive(Debug, Clone)]
pub struct StarterQuestions {
    questions: Vec<String>,
}

impl StarterQuestions {
    /// Load questions from `path`. Lines are trimmed and blank lines skipped.
    pub fn load(path: &Path) -> Result<Self, StarterError> {
        let content = std::fs::read_to_string(path).map_err(|e| StarterError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let questions = Self::parse(&content);
        if questions.is_empty() {
            return Err(StarterError::Empty(path.display().to_string()));
        }

        tracing::debug!(path = %path.display(), count = questions.len(), "Loaded starter questions");
        Ok(Self { questions })
    }

    /// Build a pool from in-memory text.
    pub fn from_text(content: &str) -> Self {
        Self {
            questions: Self::parse(content),
        }
    }

    fn parse(content: &str) -> Vec<String> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()
    }

    /// Pick one question uniformly at random.
    pub fn random(&self) -> Option<&str> {
        self.questions
            .choose(&mut rand::rng())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(String::as_str)
    }
}
