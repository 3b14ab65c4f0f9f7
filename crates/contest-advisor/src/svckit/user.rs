//! User Tools
//!
//! Profiles, rating history, submissions and the rated-user list.

use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::capped_list;
use crate::codeforces::ContestApi;
use crate::gym::utc_timestamp;
use crate::model::{Submission, User};

const MAX_SUBMISSIONS: u32 = 200;
const MAX_RATED_USERS: usize = 100;

fn project_user(user: User) -> Value {
    let name = match (user.first_name, user.last_name) {
        (Some(first), Some(last)) => Some(format!("{first} {last}")),
        (first, last) => first.or(last),
    };
    json!({
        "handle": user.handle,
        "name": name,
        "rank": user.rank,
        "rating": user.rating,
        "maxRank": user.max_rank,
        "maxRating": user.max_rating,
        "country": user.country,
        "organization": user.organization,
        "contribution": user.contribution,
        "friendOfCount": user.friend_of_count,
        "registered": user.registration_time_seconds.map(utc_timestamp),
        "lastOnline": user.last_online_time_seconds.map(utc_timestamp),
    })
}

fn project_submission(sub: Submission) -> Value {
    let problem = format!(
        "{}{}",
        sub.problem.contest_id.map(|id| id.to_string()).unwrap_or_default(),
        sub.problem.index
    );
    json!({
        "id": sub.id,
        "contestId": sub.contest_id,
        "problem": problem,
        "name": sub.problem.name,
        "rating": sub.problem.rating,
        "tags": sub.problem.tags,
        "verdict": sub.verdict,
        "language": sub.programming_language,
        "participantType": sub.author.participant_type,
        "submitted": utc_timestamp(sub.creation_time_seconds),
    })
}

/// `user.info` for one or more handles
pub struct GetUserInfoTool {
    api: Arc<dyn ContestApi>,
}

impl GetUserInfoTool {
    pub fn new(api: Arc<dyn ContestApi>) -> Self {
        Self { api }
    }
}

#[derive(Deserialize)]
struct UserInfoArgs {
    handles: Vec<String>,
}

#[async_trait]
impl Tool for GetUserInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_user_info".into(),
            description: "Get Codeforces profiles: current and max rating and rank, country, organization, contribution.".into(),
            parameters: vec![
                ParameterSchema::required("handles", "array", "Codeforces handles, e.g. [\"tourist\"]").with_items("string"),
            ],
            category: Some("users".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let args: UserInfoArgs = call.parse_args()?;
        let users = self.api.user_info(&args.handles).await?;
        let data: Vec<Value> = users.into_iter().map(project_user).collect();
        Ok(ToolResult::json("get_user_info", Value::Array(data)))
    }
}

/// `user.rating`
pub struct GetUserRatingTool {
    api: Arc<dyn ContestApi>,
}

impl GetUserRatingTool {
    pub fn new(api: Arc<dyn ContestApi>) -> Self {
        Self { api }
    }
}

#[derive(Deserialize)]
struct HandleArgs {
    handle: String,
}

#[async_trait]
impl Tool for GetUserRatingTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_user_rating".into(),
            description: "Get the rated contest history of a user: contest, rank, old and new rating, in chronological order.".into(),
            parameters: vec![ParameterSchema::required("handle", "string", "Codeforces handle")],
            category: Some("users".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let args: HandleArgs = call.parse_args()?;
        let changes = self.api.user_rating(&args.handle).await?;

        let data: Vec<Value> = changes
            .into_iter()
            .map(|c| {
                json!({
                    "contestId": c.contest_id,
                    "contestName": c.contest_name,
                    "rank": c.rank,
                    "oldRating": c.old_rating,
                    "newRating": c.new_rating,
                    "delta": c.new_rating - c.old_rating,
                    "date": utc_timestamp(c.rating_update_time_seconds),
                })
            })
            .collect();

        Ok(ToolResult::json(
            "get_user_rating",
            json!({ "handle": args.handle, "contests": data.len(), "changes": data }),
        ))
    }
}

/// `user.status`, capped at 200 submissions
pub struct GetUserSubmissionsTool {
    api: Arc<dyn ContestApi>,
}

impl GetUserSubmissionsTool {
    pub fn new(api: Arc<dyn ContestApi>) -> Self {
        Self { api }
    }
}

#[derive(Deserialize)]
struct SubmissionsArgs {
    handle: String,
    #[serde(default = "default_from")]
    from: u32,
    #[serde(default = "default_count")]
    count: u32,
}

const fn default_from() -> u32 {
    1
}

const fn default_count() -> u32 {
    50
}

#[async_trait]
impl Tool for GetUserSubmissionsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_user_submissions".into(),
            description: "Get a user's most recent submissions (newest first, at most 200): problem, rating, tags, verdict, language.".into(),
            parameters: vec![
                ParameterSchema::required("handle", "string", "Codeforces handle"),
                ParameterSchema::optional("from", "integer", "1-based index of the first submission").with_default(json!(1)),
                ParameterSchema::optional("count", "integer", "Number of submissions, at most 200").with_default(json!(50)),
            ],
            category: Some("users".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let args: SubmissionsArgs = call.parse_args()?;
        let count = args.count.clamp(1, MAX_SUBMISSIONS);
        let submissions = self.api.user_status(&args.handle, args.from.max(1), count).await?;

        Ok(ToolResult::json(
            "get_user_submissions",
            capped_list("submissions", submissions, MAX_SUBMISSIONS as usize, project_submission),
        ))
    }
}

/// `user.ratedList`, capped at 100 users
pub struct GetRatedUsersTool {
    api: Arc<dyn ContestApi>,
}

impl GetRatedUsersTool {
    pub fn new(api: Arc<dyn ContestApi>) -> Self {
        Self { api }
    }
}

#[derive(Deserialize)]
struct RatedUsersArgs {
    #[serde(default = "default_active_only")]
    active_only: bool,
    #[serde(default)]
    country: Option<String>,
}

const fn default_active_only() -> bool {
    true
}

#[async_trait]
impl Tool for GetRatedUsersTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_rated_users".into(),
            description: "Get the top rated users ordered by rating (at most 100), optionally filtered by country.".into(),
            parameters: vec![
                ParameterSchema::optional("active_only", "boolean", "Only users who took part in a rated contest in the last month").with_default(json!(true)),
                ParameterSchema::optional("country", "string", "Country name in English, e.g. \"Japan\""),
            ],
            category: Some("users".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let args: RatedUsersArgs = call.parse_args()?;
        let mut users = self.api.rated_list(args.active_only).await?;

        if let Some(country) = &args.country {
            users.retain(|u| u.country.as_deref().is_some_and(|c| c.eq_ignore_ascii_case(country)));
        }

        let data = capped_list("users", users, MAX_RATED_USERS, |u| {
            json!({
                "handle": u.handle,
                "rating": u.rating,
                "rank": u.rank,
                "country": u.country,
            })
        });
        Ok(ToolResult::json("get_rated_users", data))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::*;
    use crate::codeforces::MockContestApi;
    use crate::model::{Member, ParticipantType, Party, Problem};

    fn call(name: &str, args: Value) -> ToolCall {
        let Value::Object(map) = args else { panic!("arguments must be an object") };
        ToolCall::new("call_1", name, map)
    }

    #[tokio::test]
    async fn test_user_info_projection() {
        let tool = GetUserInfoTool::new(Arc::new(MockContestApi::sample()));
        let result = tool.execute(&call("get_user_info", json!({"handles": ["automac"]}))).await.unwrap();
        let data = result.data.unwrap();
        assert_eq!(data[0]["handle"], "automac");
        assert_eq!(data[0]["maxRating"], 2712);
    }

    #[tokio::test]
    async fn test_unknown_handle_is_tool_error() {
        let tool = GetUserInfoTool::new(Arc::new(MockContestApi::new()));
        let err = tool.execute(&call("get_user_info", json!({"handles": ["ghost"]}))).await.unwrap_err();
        assert!(matches!(err, agent_core::AgentError::ToolExecution(_)));
    }

    #[tokio::test]
    async fn test_rating_delta() {
        let tool = GetUserRatingTool::new(Arc::new(MockContestApi::sample()));
        let data = tool
            .execute(&call("get_user_rating", json!({"handle": "automac"})))
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(data["contests"], 1);
        assert_eq!(data["changes"][0]["delta"], 52);
    }

    #[tokio::test]
    async fn test_submissions_are_capped() {
        let submissions = (0..250)
            .map(|i| Submission {
                id: 1000 - i,
                contest_id: Some(1951),
                problem: Problem { contest_id: Some(1951), index: "A".into(), ..Default::default() },
                author: Party {
                    members: vec![Member { handle: "a".into(), name: None }],
                    participant_type: ParticipantType::Contestant,
                    ..Default::default()
                },
                ..Default::default()
            })
            .collect();
        let tool = GetUserSubmissionsTool::new(Arc::new(MockContestApi::new().with_submissions("a", submissions)));

        let data = tool
            .execute(&call("get_user_submissions", json!({"handle": "a", "count": 1000})))
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(data["returned"], 200);
        assert_eq!(data["submissions"][0]["problem"], "1951A");
        assert_eq!(data["submissions"][0]["participantType"], "CONTESTANT");
    }

    #[tokio::test]
    async fn test_rated_users_country_filter() {
        let api = MockContestApi::sample().with_user(User {
            handle: "Petr".into(),
            rating: Some(3100),
            country: Some("Russia".into()),
            ..Default::default()
        });
        let tool = GetRatedUsersTool::new(Arc::new(api));

        let data = tool
            .execute(&call("get_rated_users", json!({"country": "japan"})))
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(data["total"], 1);
        assert_eq!(data["users"][0]["handle"], "automac");

        let all = tool.execute(&call("get_rated_users", Value::Object(Map::new()))).await.unwrap();
        assert_eq!(all.data.unwrap()["users"][0]["handle"], "Petr");
    }
}
