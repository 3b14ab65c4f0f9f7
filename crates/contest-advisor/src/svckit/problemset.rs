//! Problemset Tool

use std::collections::HashMap;
use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::capped_list;
use crate::codeforces::ContestApi;

const MAX_PROBLEMS: usize = 300;

/// `problemset.problems` with solve counts merged in, capped at 300
pub struct GetProblemsetTool {
    api: Arc<dyn ContestApi>,
}

impl GetProblemsetTool {
    pub fn new(api: Arc<dyn ContestApi>) -> Self {
        Self { api }
    }
}

#[derive(Deserialize)]
struct ProblemsetArgs {
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    min_rating: Option<u32>,
    #[serde(default)]
    max_rating: Option<u32>,
}

#[async_trait]
impl Tool for GetProblemsetTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_problemset".into(),
            description: "Search the Codeforces problemset by tags and rating range. Returns at most 300 problems with rating, tags and number of solvers.".into(),
            parameters: vec![
                ParameterSchema::optional("tags", "array", "Problems must have all of these tags, e.g. [\"dp\", \"greedy\"]").with_items("string"),
                ParameterSchema::optional("min_rating", "integer", "Minimum problem rating"),
                ParameterSchema::optional("max_rating", "integer", "Maximum problem rating"),
            ],
            category: Some("problems".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let args: ProblemsetArgs = call.parse_args()?;
        let set = self.api.problemset(&args.tags).await?;

        let solved: HashMap<(Option<u64>, &str), u64> = set
            .problem_statistics
            .iter()
            .map(|s| ((s.contest_id, s.index.as_str()), s.solved_count))
            .collect();

        let problems: Vec<_> = set
            .problems
            .iter()
            .filter(|p| match (args.min_rating, args.max_rating, p.rating) {
                (None, None, _) => true,
                (_, _, None) => false,
                (min, max, Some(rating)) => {
                    min.is_none_or(|m| rating >= m) && max.is_none_or(|m| rating <= m)
                }
            })
            .collect();

        let data = capped_list("problems", problems, MAX_PROBLEMS, |p| {
            json!({
                "contestId": p.contest_id,
                "index": p.index,
                "name": p.name,
                "rating": p.rating,
                "tags": p.tags,
                "solvedCount": solved.get(&(p.contest_id, p.index.as_str())),
            })
        });
        Ok(ToolResult::json("get_problemset", data))
    }
}
