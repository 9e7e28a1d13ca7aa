//! HTTP gateway for PersonaChat.
//!
//! Serves the embedded browser UI, a health check, and the v1 chat API.
//!
//! Built on Axum for async HTTP.

pub mod api_v1;
pub mod frontend;

use axum::extract::DefaultBodyLimit;
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use personachat_config::AppConfig;
use personachat_core::{ChatService, StarterQuestions};

/// Build the full router: health, v1 API, and the embedded frontend.
///
/// Layers applied:
/// - CORS limited to the gateway's own origin
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: api_v1::SharedApiState) -> Router {
    let origin = format!(
        "http://{}:{}",
        state.config.gateway.host, state.config.gateway.port
    );
    let cors = match origin.parse::<axum::http::HeaderValue>() {
        Ok(origin) => CorsLayer::new().allow_origin(origin),
        Err(_) => CorsLayer::new(),
    }
    .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
    .allow_headers([axum::http::header::CONTENT_TYPE])
    .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router(state))
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Build the shared API state from configuration and a ready provider.
pub fn build_state(config: AppConfig, chat: ChatService) -> api_v1::SharedApiState {
    let starter = config
        .starter_questions
        .as_deref()
        .and_then(|path| match StarterQuestions::load(Path::new(path)) {
            Ok(questions) => Some(questions),
            Err(e) => {
                warn!(error = %e, "Starter questions unavailable");
                None
            }
        });

    Arc::new(api_v1::ApiV1State::new(chat, config, starter))
}

/// Start the gateway HTTP server.
///
/// Fails before binding if no provider can be built, which includes a
/// missing API key.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let host = config.gateway.host.clone();
    let port = config.gateway.port;
    let addr = format!("{host}:{port}");

    if !config.gateway.allow_public_bind && !is_loopback(&host) {
        return Err(format!(
            "Refusing to bind to {host}: set gateway.allow_public_bind = true to expose the UI"
        )
        .into());
    }

    let router = personachat_providers::build_from_config(&config)?;
    let provider = router
        .default()
        .ok_or_else(|| format!("Provider '{}' is not configured", router.default_name()))?;

    let state = build_state(config, ChatService::new(provider));
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn is_loopback(host: &str) -> bool {
    host == "localhost"
        || host
            .parse::<std::net::IpAddr>()
            .is_ok_and(|ip| ip.is_loopback())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use personachat_core::error::ProviderError;
    use personachat_core::message::Message;
    use personachat_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use std::io::Write;
    use tower::ServiceExt;

    struct SilentProvider;

    #[async_trait::async_trait]
    impl Provider for SilentProvider {
        fn name(&self) -> &str {
            "silent"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                message: Message::assistant("..."),
                usage: None,
                model: "silent".into(),
            })
        }
    }

    fn test_state(config: AppConfig) -> api_v1::SharedApiState {
        build_state(config, ChatService::new(Arc::new(SilentProvider)))
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state(AppConfig::default()));

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn v1_routes_are_nested() {
        let app = build_router(test_state(AppConfig::default()));

        let req = Request::builder()
            .uri("/v1/options")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn frontend_is_served_at_root() {
        let app = build_router(test_state(AppConfig::default()));

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn starter_questions_loaded_from_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Tell me a pirate joke").unwrap();
        let config = AppConfig {
            starter_questions: Some(file.path().display().to_string()),
            ..AppConfig::default()
        };
        let state = test_state(config);
        assert_eq!(state.starter.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn missing_starter_file_disables_suggestions() {
        let config = AppConfig {
            starter_questions: Some("/nonexistent/starter_prompt.txt".into()),
            ..AppConfig::default()
        };
        assert!(test_state(config).starter.is_none());
    }

    #[test]
    fn loopback_hosts() {
        assert!(is_loopback("127.0.0.1"));
        assert!(is_loopback("localhost"));
        assert!(is_loopback("::1"));
        assert!(!is_loopback("0.0.0.0"));
    }

    #[tokio::test]
    async fn start_without_api_key_fails() {
        let err = start(AppConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("No API key"));
    }
}
