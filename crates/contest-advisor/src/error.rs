//! Error Types for Contest Advisor

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {
    /// The API answered with `status: FAILED`
    #[error("Codeforces {method} failed: {comment}")]
    Api { method: String, comment: String },

    /// Non-success HTTP status without a readable envelope
    #[error("Codeforces {method} returned HTTP {status}")]
    Http { method: String, status: u16 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<AdvisorError> for agent_core::AgentError {
    fn from(err: AdvisorError) -> Self {
        match err {
            AdvisorError::InvalidArgument(msg) => Self::ToolValidation(msg),
            other => Self::ToolExecution(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::AgentError;

    #[test]
    fn test_api_error_keeps_remote_comment() {
        let err = AdvisorError::Api {
            method: "user.info".into(),
            comment: "handles: User with handle nobody not found".into(),
        };
        let agent: AgentError = err.into();
        assert!(matches!(agent, AgentError::ToolExecution(ref m) if m.contains("not found")));
    }
}
