//! Gym Simulations Tool
//!
//! Exposes the gym resolver to the agent.

use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::codeforces::ContestApi;
use crate::gym::GymResolver;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 30;

pub struct GetGymSimulationsTool {
    resolver: GymResolver,
}

impl GetGymSimulationsTool {
    pub fn new(api: Arc<dyn ContestApi>) -> Self {
        Self {
            resolver: GymResolver::new(api),
        }
    }
}

#[derive(Deserialize)]
struct GymArgs {
    handle: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

const fn default_limit() -> usize {
    DEFAULT_LIMIT
}

#[async_trait]
impl Tool for GetGymSimulationsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_gym_simulations".into(),
            description: "Get a user's most recent gym virtual contests (full simulations, not upsolving), newest first: contest name, link, difficulty, duration, start time, team, members, rank and solved count. The `standings` field says whether the rank was matched, matched_by_members, unresolved or fetch_failed.".into(),
            parameters: vec![
                ParameterSchema::required("handle", "string", "Codeforces handle"),
                ParameterSchema::optional("limit", "integer", "Number of simulations, at most 30").with_default(json!(DEFAULT_LIMIT)),
            ],
            category: Some("gym".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let args: GymArgs = call.parse_args()?;
        let limit = args.limit.min(MAX_LIMIT);

        tracing::debug!(handle = %args.handle, limit, "Resolving gym simulations");
        let report = self.resolver.resolve(&args.handle, limit).await?;

        Ok(ToolResult::json("get_gym_simulations", serde_json::to_value(report)?))
    }
}
