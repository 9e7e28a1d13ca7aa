//! `personachat personas` / `personachat models` — List the catalog.

use personachat_config::AppConfig;

pub async fn personas() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let catalog = config.catalog();
    let default = catalog.default_persona().map(|p| p.name.as_str());

    println!("Personas");
    println!("========");
    for persona in catalog.personas() {
        let marker = if Some(persona.name.as_str()) == default { "*" } else { " " };
        println!(" {marker} {:<22} {}", persona.name, preview(&persona.prompt, 70));
    }

    Ok(())
}

pub async fn models() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Models ({})", config.default_provider);
    println!("======");
    for model in &config.models {
        let marker = if *model == config.default_model { "*" } else { " " };
        println!(" {marker} {model}");
    }

    Ok(())
}

/// First `max` characters of `text`, with an ellipsis when cut.
fn preview(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
