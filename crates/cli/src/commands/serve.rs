//! `personachat serve` — Start the web UI and HTTP API.

use personachat_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("PersonaChat");
    println!("   Open:      http://{}:{}/", config.gateway.host, config.gateway.port);
    println!("   Provider:  {}", config.default_provider);
    println!("   Model:     {}", config.default_model);

    personachat_gateway::start(config).await?;

    Ok(())
}
