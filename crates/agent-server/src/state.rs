//! Application State

use std::sync::Arc;

use agent_core::{Agent, LlmProvider, ToolRegistry};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Agent loop shared by every request; each request drives its own run
    pub agent: Arc<Agent>,

    /// LLM provider (Anthropic)
    pub provider: Arc<dyn LlmProvider>,

    /// Tool registry with all available tools
    pub tools: Arc<ToolRegistry>,
}
