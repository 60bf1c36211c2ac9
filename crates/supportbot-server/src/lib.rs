//! Support chat relay endpoint
//!
//! `POST /api/chat` takes the conversation so far as a JSON array of
//! `{role, content}` objects and answers with the assistant reply as a plain
//! UTF-8 text stream, forwarded fragment by fragment as the completion API
//! produces it.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use supportbot_core::{
    relay, AiError, ChatMessage, CompletionBackend, Config, OllamaClient, OpenAIClient, Provider,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared, immutable per-process state
#[derive(Clone)]
pub struct AppState {
    backend: Arc<dyn CompletionBackend>,
    model: Arc<str>,
}

impl AppState {
    pub fn new(backend: Arc<dyn CompletionBackend>, model: impl Into<Arc<str>>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    /// Pick the completion backend named by the config
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_openai_key(config, config.resolved_openai_key())
    }

    /// Like `from_config`, with the OpenAI key already resolved by the caller
    pub fn with_openai_key(config: &Config, openai_key: Option<String>) -> Result<Self> {
        let provider = config.provider_kind()?;
        let model = config.model_for(provider);

        let backend: Arc<dyn CompletionBackend> = match provider {
            Provider::OpenAI => {
                let api_key = openai_key
                    .ok_or(AiError::MissingApiKey("OpenAI"))
                    .context("Set OPENAI_API_KEY or openai_api_key in the config file")?;
                Arc::new(OpenAIClient::with_base_url(&api_key, &config.openai_base_url))
            }
            Provider::Ollama => Arc::new(OllamaClient::new(&config.ollama_url)),
        };

        Ok(Self::new(backend, model))
    }

    pub fn provider_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

// POST /api/chat
async fn chat(State(state): State<AppState>, body: Bytes) -> Response {
    // Parsed by hand so any content type is accepted, as long as it is JSON
    let history: Vec<ChatMessage> = match serde_json::from_slice(&body) {
        Ok(history) => history,
        Err(e) => {
            warn!(error = %e, "rejecting malformed chat request");
            return (
                StatusCode::BAD_REQUEST,
                format!("Expected a JSON array of {{role, content}} messages: {}", e),
            )
                .into_response();
        }
    };

    info!(messages = history.len(), model = %state.model, "chat request");

    let reply = relay(state.backend.as_ref(), &state.model, history);
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(reply),
    )
        .into_response()
}
