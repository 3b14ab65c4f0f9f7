//! # agent-core
//!
//! Core agent logic: a provider-agnostic streaming loop that interleaves
//! model output with tool execution.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                           Agent                               │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────┐ │
//! │  │  Agent Loop  │  │    Tools     │  │    LlmProvider       │ │
//! │  │ (TurnState)  │──│   Registry   │──│  (streaming, retry)  │ │
//! │  └──────────────┘  └──────────────┘  └──────────────────────┘ │
//! │          │                                                    │
//! │          └──▶ StreamEvent: text · tool_call · tool_result ·   │
//! │                            retrying · error · done            │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait keeps the loop independent of any vendor's wire
//! format; the provider only has to yield `StreamFragment`s.

pub mod error;
pub mod history;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod retry;
pub mod stream_event;
pub mod tool;

pub use error::{AgentError, Result};
pub use history::trim_history;
pub use message::{ContentBlock, Message, MessageContent, Role};
pub use provider::{ChatRequest, LlmProvider, StreamFragment};
pub use reasoning::{Agent, AgentBuilder, AgentConfig};
pub use retry::RetryPolicy;
pub use stream_event::StreamEvent;
pub use tool::{ParameterSchema, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
