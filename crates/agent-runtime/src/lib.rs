//! # agent-runtime
//!
//! Runtime providers for the contest agent.
//!
//! ## Providers
//!
//! - **Anthropic**: Messages API with streamed tool use
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::anthropic::AnthropicProvider;
//!
//! let provider = AnthropicProvider::from_env()?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

pub mod anthropic;
mod sse;

pub use anthropic::{AnthropicConfig, AnthropicProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, LlmProvider, Message, Result, Role, StreamEvent, Tool, ToolRegistry,
};
