//! `personachat config` — Configuration management commands.

use personachat_config::AppConfig;

/// Non-fatal findings on an otherwise valid configuration.
fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.has_api_key() && config.default_provider != "ollama" {
        warnings.push(
            "No API key set (set PERSONACHAT_API_KEY or GROQ_API_KEY, or api_key_file)".into(),
        );
    }

    if let Some(path) = &config.starter_questions {
        if !std::path::Path::new(path).is_file() {
            warnings.push(format!("Starter questions file not found: {path}"));
        }
    }

    if config.gateway.host == "0.0.0.0" && !config.gateway.allow_public_bind {
        warnings.push("Gateway bound to 0.0.0.0 without allow_public_bind = true".into());
    }

    warnings
}

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   OK  Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   OK  All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   WARN  {w}");
                }
            }

            println!();
            println!("   Provider:  {}", config.default_provider);
            println!("   Model:     {}", config.default_model);
            println!("   Models:    {}", config.models.len());
            println!("   Personas:  {}", config.personas.len());
            println!("   Memory:    {} turns", config.default_memory_length);
            println!(
                "   Gateway:   {}:{}",
                config.gateway.host, config.gateway.port
            );
        }
        Err(e) => {
            println!("   ERROR  Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    config.api_key = None;
    for provider in config.providers.values_mut() {
        provider.api_key = None;
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_valid() {
        let path = AppConfig::config_path();
        assert!(path.to_str().unwrap().contains(".personachat"));
        assert!(path.to_str().unwrap().ends_with("config.toml"));
    }

    #[test]
    fn missing_key_is_a_warning() {
        let warnings = warnings(&AppConfig::default());
        assert!(warnings.iter().any(|w| w.contains("No API key")));
    }

    #[test]
    fn local_provider_needs_no_key() {
        let config = AppConfig {
            default_provider: "ollama".into(),
            ..AppConfig::default()
        };
        assert!(warnings(&config).is_empty());
    }

    #[test]
    fn missing_starter_file_is_a_warning() {
        let config = AppConfig {
            api_key: Some("gsk-test".into()),
            starter_questions: Some("/nonexistent/starter_prompt.txt".into()),
            ..AppConfig::default()
        };
        let warnings = warnings(&config);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("starter_prompt.txt"));
    }
}
