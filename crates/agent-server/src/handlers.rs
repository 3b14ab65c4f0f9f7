//! HTTP Handlers

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_stream::wrappers::ReceiverStream;

use agent_core::{Message, MessageContent, Role};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub provider: String,
    pub provider_connected: bool,
}

/// Full conversation so far; the last message is the question to answer
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub input_schema: Value,
}

#[derive(Serialize, Deserialize)]
pub struct ToolListResponse {
    pub count: usize,
    pub tools: Vec<ToolInfo>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.into(),
            code: "INVALID_REQUEST".into(),
        }),
    )
}

impl ChatRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let Some(last) = self.messages.last() else {
            return Err(bad_request("messages must not be empty"));
        };
        if last.role != Role::User {
            return Err(bad_request("the last message must come from the user"));
        }
        if self
            .messages
            .iter()
            .any(|m| !matches!(m.content, MessageContent::Text(_)))
        {
            return Err(bad_request("message content must be plain text"));
        }
        if last.text().trim().is_empty() {
            return Err(bad_request("the question must not be empty"));
        }
        Ok(())
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        provider: state.provider.name().into(),
        provider_connected,
    })
}

/// Tool catalog as sent to the model
pub async fn list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools: Vec<ToolInfo> = state
        .tools
        .schemas()
        .into_iter()
        .map(|schema| ToolInfo {
            input_schema: schema.input_schema(),
            name: schema.name,
            description: schema.description,
            category: schema.category,
        })
        .collect();

    Json(ToolListResponse {
        count: tools.len(),
        tools,
    })
}

/// `POST /api/chat`: run the agent and stream its events as SSE
pub async fn chat_stream(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    payload.validate()?;

    let request_id = uuid::Uuid::new_v4();
    tracing::info!(
        %request_id,
        messages = payload.messages.len(),
        model = payload.model.as_deref().unwrap_or("default"),
        "Chat request"
    );

    let rx = Arc::clone(&state.agent).spawn_stream(payload.messages, payload.model);

    let stream = ReceiverStream::new(rx).map(move |event| {
        if event.is_terminal() {
            tracing::debug!(%request_id, event = event.event_type(), "Chat stream finished");
        }
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(Event::default().event(event.event_type()).data(data))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
