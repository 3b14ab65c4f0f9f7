//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for streaming tool-calling LLM backends so the
//! agent loop never depends on a particular vendor's wire format.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{ChatRequest, LlmProvider};
//!
//! let mut stream = provider.stream(&request).await?;
//! while let Some(fragment) = stream.next().await {
//!     // StreamFragment::TextDelta, ToolCallStart, ...
//! }
//! ```

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::tool::ToolSchema;

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate per turn
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

const fn default_temperature() -> f32 {
    0.3
}

const fn default_max_tokens() -> u32 {
    4096
}

/// Model used when neither the request nor the configuration names one
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Reason a model turn ended
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolUse,
    ContentFilter,
    Other,
}

/// One streaming request: everything the provider needs for a turn
#[derive(Clone, Debug)]
pub struct ChatRequest<'a> {
    pub system: &'a str,
    pub messages: &'a [Message],
    pub tools: &'a [ToolSchema],
    pub options: &'a GenerationOptions,
}

/// Incremental output of a streaming turn
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamFragment {
    /// Visible text
    TextDelta(String),
    /// A tool call block opened
    ToolCallStart { id: String, name: String },
    /// A piece of the open tool call's JSON arguments
    ToolCallDelta(String),
    /// The open tool call block closed
    ToolCallEnd,
    /// Turn metadata carrying the stop reason
    TurnEnd { stop_reason: FinishReason },
}

/// Stream type for completion streaming
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<StreamFragment>> + Send>>;

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
/// The agent works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Check if the provider is configured and reachable
    async fn health_check(&self) -> Result<bool>;

    /// Start a streaming turn.
    ///
    /// Rate limiting must surface as `AgentError::RateLimited`, either from
    /// this call or as a stream item, so the agent can retry the turn.
    async fn stream(&self, request: &ChatRequest<'_>) -> Result<CompletionStream>;
}
