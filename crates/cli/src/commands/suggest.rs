//! `personachat suggest` — Print a random starter question.

use std::path::{Path, PathBuf};

use personachat_config::AppConfig;
use personachat_core::StarterQuestions;

/// Load the starter pool from an explicit file or the configured one.
pub fn load(config: &AppConfig, file: Option<&Path>) -> Result<StarterQuestions, String> {
    let path = match file {
        Some(path) => path.to_path_buf(),
        None => config
            .starter_questions
            .as_deref()
            .map(PathBuf::from)
            .ok_or("No starter questions configured: set starter_questions in config.toml")?,
    };

    StarterQuestions::load(&path).map_err(|e| e.to_string())
}

pub async fn run(file: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let pool = load(&config, file.as_deref())?;

    if let Some(question) = pool.random() {
        println!("{question}");
    }

    Ok(())
}
