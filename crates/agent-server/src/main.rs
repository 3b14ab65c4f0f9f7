//! contest-agent HTTP Server
//!
//! Axum-based server streaming agent answers over Server-Sent Events.
//!
//! The agent uses the contest-advisor tools to answer questions about
//! Codeforces users, contests, problems and gym simulations.

mod config;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{Agent, AgentConfig, LlmProvider, ToolRegistry};
use agent_runtime::AnthropicProvider;
use contest_advisor::{ADVISOR_PROMPT, CodeforcesClient, ContestApi, MockContestApi, register_tools};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Initialize LLM provider
    let provider: Arc<dyn LlmProvider> = Arc::new(AnthropicProvider::from_env()?);

    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Connected to {}", provider.name()),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ {} not reachable - chat requests will fail", provider.name());
            tracing::warn!("  Check ANTHROPIC_API_KEY and ANTHROPIC_BASE_URL");
        }
    }

    // Initialize the data API backend
    let api: Arc<dyn ContestApi> = if config.offline {
        tracing::warn!("⚠ CODEFORCES_OFFLINE=true - serving sample data");
        Arc::new(MockContestApi::sample())
    } else {
        Arc::new(CodeforcesClient::from_env()?)
    };

    // Initialize tools
    let mut tools = ToolRegistry::new();
    register_tools(&mut tools, &api);

    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }
    let tools = Arc::new(tools);

    let agent = Agent::new(
        Arc::clone(&provider),
        Arc::clone(&tools),
        AgentConfig {
            system_prompt: ADVISOR_PROMPT.into(),
            generation: config.generation.clone(),
            ..Default::default()
        },
    );

    // Build application state
    let state = AppState {
        agent: Arc::new(agent),
        provider,
        tools,
    };

    let app = routes::router(state, &config.static_dir);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 contest-agent server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Model: {}", config.generation.model);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health     - Health check");
    tracing::info!("  GET  /api/tools  - Tool catalog");
    tracing::info!("  POST /api/chat   - Chat (Server-Sent Events)");
    tracing::info!("  GET  /*          - Static files from {}", config.static_dir);

    axum::serve(listener, app).await?;

    Ok(())
}
