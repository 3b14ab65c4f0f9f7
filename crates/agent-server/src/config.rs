//! Server Configuration

use std::str::FromStr;

use agent_core::provider::{DEFAULT_MODEL, GenerationOptions};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Settings read from the environment (and `.env`)
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub static_dir: String,
    pub generation: GenerationOptions,
    /// Serve seeded sample data instead of calling Codeforces
    pub offline: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = GenerationOptions::default();

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            static_dir: std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".into()),
            generation: GenerationOptions {
                model: std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
                max_tokens: parse_var("ANTHROPIC_MAX_TOKENS", defaults.max_tokens)?,
                ..defaults
            },
            offline: parse_var("CODEFORCES_OFFLINE", false)?,
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
