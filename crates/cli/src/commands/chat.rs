//! `personachat chat` — Interactive or single-question terminal chat.

use std::io::Write;
use std::sync::Arc;

use clap::Args;
use personachat_config::{AppConfig, Persona};
use personachat_core::window::{INTRODUCTION, MemoryLength};
use personachat_core::{ChatEvent, ChatService, ChatSession, ChatSettings, StarterQuestions};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

#[derive(Args, Debug, Default)]
pub struct ChatArgs {
    /// Model identifier (defaults to the configured default_model)
    #[arg(long)]
    pub model: Option<String>,

    /// Persona display name (defaults to the first configured persona)
    #[arg(long)]
    pub persona: Option<String>,

    /// Conversational memory length, 1 to 10 turns
    #[arg(long)]
    pub memory: Option<usize>,

    /// Sampling temperature, 0.0 to 2.0
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Send a single question instead of entering interactive mode
    #[arg(short, long)]
    pub message: Option<String>,
}

/// The persona chosen by `--persona`, or the catalog default.
fn persona(config: &AppConfig, args: &ChatArgs) -> Result<Persona, String> {
    let catalog = config.catalog();
    let persona = match &args.persona {
        Some(name) => catalog
            .persona(name)
            .ok_or_else(|| format!("Unknown persona '{name}' (see `personachat personas`)"))?,
        None => catalog
            .default_persona()
            .ok_or("No personas configured")?,
    };
    Ok(persona.clone())
}

/// Resolve the per-turn settings from flags and configuration.
pub fn settings(config: &AppConfig, args: &ChatArgs) -> Result<ChatSettings, String> {
    let catalog = config.catalog();

    let model = args
        .model
        .clone()
        .unwrap_or_else(|| config.default_model.clone());
    if !catalog.has_model(&model) {
        return Err(format!(
            "Unknown model '{model}' (see `personachat models`)"
        ));
    }

    let persona = persona(config, args)?;

    let memory_length = match args.memory {
        Some(n) => MemoryLength::new(n).map_err(|e| e.to_string())?,
        None => config.memory_length(),
    };

    let temperature = args.temperature.unwrap_or(config.default_temperature);
    if !(0.0..=2.0).contains(&temperature) {
        return Err("temperature must be between 0.0 and 2.0".into());
    }

    Ok(ChatSettings {
        model,
        persona: persona.prompt,
        memory_length,
        temperature,
        top_p: config.default_top_p,
        stop: config.stop.clone(),
        max_tokens: config.default_max_tokens,
    })
}

pub async fn run(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let settings = settings(&config, &args)?;
    let persona_name = persona(&config, &args)?.name;
    tracing::debug!(
        model = %settings.model,
        memory_length = %settings.memory_length,
        temperature = settings.temperature,
        "Chat settings resolved"
    );

    let router = match personachat_providers::build_from_config(&config) {
        Ok(router) => router,
        Err(e) => {
            eprintln!();
            eprintln!("  ERROR: {e}");
            eprintln!();
            eprintln!("  Set PERSONACHAT_API_KEY or GROQ_API_KEY, or edit your config file:");
            eprintln!("    {}", AppConfig::config_path().display());
            eprintln!();
            eprintln!("  Get a Groq key at: https://console.groq.com/keys");
            eprintln!();
            return Err(e.into());
        }
    };
    let provider = router.default().ok_or("No default provider configured")?;
    let service = ChatService::new(provider);
    let session = Arc::new(Mutex::new(ChatSession::new()));

    if let Some(question) = args.message {
        // Single question mode
        turn(&service, session, &settings, &question).await?;
        return Ok(());
    }

    let starter = config
        .starter_questions
        .as_deref()
        .and_then(|path| StarterQuestions::load(std::path::Path::new(path)).ok());

    println!("{}", INTRODUCTION.trim_end());
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", settings.model);
    println!("  Persona:   {persona_name}");
    println!("  Memory:    {} turns", settings.memory_length);
    println!();
    println!("  Type your question and press Enter.");
    println!("  /reset clears the conversation, /suggest asks a starter question.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => {}
            "exit" | "quit" | "/exit" | "/quit" => break,
            "/reset" => {
                session.lock().await.reset();
                println!("  (conversation cleared)");
                println!();
            }
            "/suggest" => match starter.as_ref().and_then(StarterQuestions::random) {
                Some(question) => {
                    println!("  You > {question}");
                    report(turn(&service, session.clone(), &settings, question).await);
                }
                None => {
                    eprintln!("  [No starter questions configured]");
                    println!();
                }
            },
            question => report(turn(&service, session.clone(), &settings, question).await),
        }
        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

fn report(result: Result<(), Box<dyn std::error::Error>>) {
    if let Err(e) = result {
        eprintln!("  [Error] {e}");
        println!();
    }
}

/// Run one turn, printing the answer as it streams in.
async fn turn(
    service: &ChatService,
    session: Arc<Mutex<ChatSession>>,
    settings: &ChatSettings,
    question: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut events = service.ask_stream(session, settings, question).await?;

    print!("  Chatbot > ");
    std::io::stdout().flush()?;

    while let Some(event) = events.recv().await {
        match event {
            ChatEvent::Chunk { content } => {
                print!("{content}");
                std::io::stdout().flush()?;
            }
            ChatEvent::Done { .. } => {
                println!();
                println!();
            }
            ChatEvent::Error { message } => {
                println!();
                return Err(message.into());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_come_from_config() {
        let config = AppConfig::default();
        let settings = settings(&config, &ChatArgs::default()).unwrap();
        assert_eq!(settings.model, config.default_model);
        assert_eq!(settings.persona, config.personas[0].prompt);
        assert_eq!(settings.memory_length.get(), 5);
    }

    #[test]
    fn persona_selected_by_name() {
        let args = ChatArgs {
            persona: Some("French Tutor".into()),
            memory: Some(2),
            ..ChatArgs::default()
        };
        let settings = settings(&AppConfig::default(), &args).unwrap();
        assert!(settings.persona.contains("French tutor"));
        assert_eq!(settings.memory_length.get(), 2);
    }

    #[test]
    fn banner_persona_matches_settings() {
        let mut config = AppConfig::default();
        config.personas.rotate_left(3);
        let args = ChatArgs::default();

        let shown = persona(&config, &args).unwrap();
        let resolved = settings(&config, &args).unwrap();
        assert_eq!(shown.name, config.catalog().default_persona().unwrap().name);
        assert_eq!(resolved.persona, shown.prompt);

        let args = ChatArgs {
            persona: Some("DJ".into()),
            ..ChatArgs::default()
        };
        assert_eq!(persona(&config, &args).unwrap().name, "DJ");
        assert_eq!(settings(&config, &args).unwrap().persona, persona(&config, &args).unwrap().prompt);
    }

    #[test]
    fn rejects_unknown_persona_and_model() {
        let config = AppConfig::default();
        let bad_persona = ChatArgs {
            persona: Some("Nobody".into()),
            ..ChatArgs::default()
        };
        assert!(settings(&config, &bad_persona).is_err());

        let bad_model = ChatArgs {
            model: Some("gpt-2".into()),
            ..ChatArgs::default()
        };
        assert!(settings(&config, &bad_model).is_err());
    }

    #[test]
    fn rejects_out_of_range_memory_and_temperature() {
        let config = AppConfig::default();
        let memory = ChatArgs {
            memory: Some(11),
            ..ChatArgs::default()
        };
        assert!(settings(&config, &memory).is_err());

        let temperature = ChatArgs {
            temperature: Some(2.5),
            ..ChatArgs::default()
        };
        assert!(settings(&config, &temperature).is_err());
    }
}
