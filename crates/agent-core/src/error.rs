//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider asked us to slow down (HTTP 429, overloaded)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool arguments did not match the declared schema
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Maximum model turns reached in the agent loop
    #[error("Maximum iterations ({0}) reached")]
    MaxIterations(usize),

    /// The caller stopped listening for events
    #[error("Request cancelled by caller")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Only rate-limit conditions are retried by the agent loop.
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => "The AI service is currently unavailable. Please try again.".into(),
            Self::RateLimited(_) => "The AI service is busy right now. Please wait a moment and try again.".into(),
            Self::ToolNotFound(name) => format!("The tool '{name}' is not available."),
            Self::ToolValidation(msg) => format!("Invalid tool input: {msg}"),
            Self::ToolExecution(msg) => format!("Tool error: {msg}"),
            Self::MaxIterations(_) => "The request took too many steps to answer. Please try a simpler question.".into(),
            Self::Auth(_) => "Authentication with the AI service failed. Check the server's API key.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rate_limit_is_retryable() {
        assert!(AgentError::RateLimited("429".into()).is_rate_limited());
        assert!(!AgentError::Provider("500".into()).is_rate_limited());
        assert!(!AgentError::ProviderUnavailable("down".into()).is_rate_limited());
    }

    #[test]
    fn test_user_message_names_missing_tool() {
        let err = AgentError::ToolNotFound("get_weather".into());
        assert_eq!(err.user_message(), "The tool 'get_weather' is not available.");
    }

    #[test]
    fn test_internal_errors_get_a_generic_message() {
        let err = AgentError::Config("missing key".into());
        assert_eq!(err.user_message(), "An unexpected error occurred.");
    }
}
