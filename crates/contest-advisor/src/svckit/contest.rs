//! Contest Tools
//!
//! Contest catalog and standings.

use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::capped_list;
use crate::codeforces::{ContestApi, StandingsQuery};
use crate::error::AdvisorError;
use crate::gym::{duration_hours, utc_timestamp};
use crate::model::{Contest, RanklistRow};

const MAX_CONTESTS: usize = 300;
const MAX_STANDINGS_ROWS: u32 = 100;

/// `contest.list`, capped at 300 contests
pub struct GetContestListTool {
    api: Arc<dyn ContestApi>,
}

impl GetContestListTool {
    pub fn new(api: Arc<dyn ContestApi>) -> Self {
        Self { api }
    }
}

#[derive(Deserialize)]
struct ContestListArgs {
    #[serde(default)]
    gym: bool,
    #[serde(default)]
    phase: Option<String>,
}

fn project_contest(contest: Contest) -> Value {
    json!({
        "id": contest.id,
        "name": contest.name,
        "type": contest.scoring,
        "phase": contest.phase,
        "durationHours": contest.duration_seconds.map(duration_hours),
        "start": contest.start_time_seconds.map(utc_timestamp),
        "difficulty": contest.difficulty,
    })
}

#[async_trait]
impl Tool for GetContestListTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_contest_list".into(),
            description: "List Codeforces contests (or gym contests), newest first, at most 300: id, name, type, phase, duration, start time.".into(),
            parameters: vec![
                ParameterSchema::optional("gym", "boolean", "List gym contests instead of regular rounds").with_default(json!(false)),
                ParameterSchema::optional("phase", "string", "Only contests in this phase")
                    .with_enum(&["BEFORE", "CODING", "FINISHED"]),
            ],
            category: Some("contests".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let args: ContestListArgs = call.parse_args()?;
        let mut contests = self.api.contest_list(args.gym).await?;

        if let Some(phase) = &args.phase {
            contests.retain(|c| c.phase.eq_ignore_ascii_case(phase));
        }

        Ok(ToolResult::json(
            "get_contest_list",
            capped_list("contests", contests, MAX_CONTESTS, project_contest),
        ))
    }
}

/// `contest.standings`, at most 100 rows per call
pub struct GetContestStandingsTool {
    api: Arc<dyn ContestApi>,
}

impl GetContestStandingsTool {
    pub fn new(api: Arc<dyn ContestApi>) -> Self {
        Self { api }
    }
}

#[derive(Deserialize)]
struct StandingsArgs {
    contest_id: u64,
    #[serde(default = "default_from")]
    from: u32,
    #[serde(default = "default_count")]
    count: u32,
    #[serde(default)]
    handles: Vec<String>,
    #[serde(default)]
    show_unofficial: bool,
}

const fn default_from() -> u32 {
    1
}

const fn default_count() -> u32 {
    20
}

fn project_row(row: RanklistRow) -> Value {
    let solved = row.solved();
    json!({
        "rank": row.rank,
        "members": row.party.handles().collect::<Vec<_>>(),
        "team": row.party.team_name,
        "participantType": row.party.participant_type,
        "points": row.points,
        "penalty": row.penalty,
        "solved": solved,
    })
}

#[async_trait]
impl Tool for GetContestStandingsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_contest_standings".into(),
            description: "Get the standings of a contest: problems and ranklist rows (rank, members, points, penalty, solved). At most 100 rows per call.".into(),
            parameters: vec![
                ParameterSchema::required("contest_id", "integer", "Contest id, e.g. 1951"),
                ParameterSchema::optional("from", "integer", "1-based rank index of the first row").with_default(json!(1)),
                ParameterSchema::optional("count", "integer", "Number of rows, at most 100").with_default(json!(20)),
                ParameterSchema::optional("handles", "array", "Only rows of these handles").with_items("string"),
                ParameterSchema::optional("show_unofficial", "boolean", "Include virtual and out-of-competition participants").with_default(json!(false)),
            ],
            category: Some("contests".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let args: StandingsArgs = call.parse_args()?;
        if args.contest_id == 0 {
            return Err(AdvisorError::InvalidArgument("contest_id must be positive".into()).into());
        }

        let query = StandingsQuery {
            contest_id: args.contest_id,
            from: args.from.max(1),
            count: args.count.clamp(1, MAX_STANDINGS_ROWS),
            handles: args.handles,
            show_unofficial: args.show_unofficial,
        };
        let standings = self.api.contest_standings(&query).await?;

        let problems: Vec<Value> = standings
            .problems
            .iter()
            .map(|p| json!({ "index": p.index, "name": p.name, "rating": p.rating }))
            .collect();
        let rows: Vec<Value> = standings.rows.into_iter().map(project_row).collect();

        Ok(ToolResult::json(
            "get_contest_standings",
            json!({
                "contest": {
                    "id": standings.contest.id,
                    "name": standings.contest.name,
                    "phase": standings.contest.phase,
                },
                "problems": problems,
                "rows": rows,
            }),
        ))
    }
}
