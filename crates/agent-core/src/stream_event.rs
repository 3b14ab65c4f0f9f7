//! Agent-level streaming events.
//!
//! Every request produces a sequence of these, serialized one JSON object per
//! server-sent event. Exactly one `Done` is emitted per request and it is
//! always the last event, including after an `Error`.

use serde::{Deserialize, Serialize};

/// Events emitted by the agent while it answers a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Partial text from the model, forwarded unbuffered.
    Text { content: String },

    /// The model started a tool call.
    ToolCall { name: String },

    /// A tool call finished.
    ToolResult {
        name: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// The provider rate limited us; the loop waits this long before retrying.
    Retrying {
        #[serde(rename = "waitSeconds")]
        wait_seconds: u64,
    },

    /// Terminal event.
    Done,

    /// The request failed; `Done` follows.
    Error { message: String },
}

impl StreamEvent {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text { content: content.into() }
    }

    /// Event name, used for logging and SSE `event:` fields.
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Retrying { .. } => "retrying",
            Self::Done => "done",
            Self::Error { .. } => "error",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}
