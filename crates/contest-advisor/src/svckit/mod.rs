//! Service Kit - Agent Tools
//!
//! Read-only Codeforces tools that implement `agent_core::Tool`. Large API
//! payloads are capped and projected to a few fields before they reach the
//! model.

mod contest;
mod gym;
mod problemset;
mod user;

pub use contest::{GetContestListTool, GetContestStandingsTool};
pub use gym::GetGymSimulationsTool;
pub use problemset::GetProblemsetTool;
pub use user::{GetRatedUsersTool, GetUserInfoTool, GetUserRatingTool, GetUserSubmissionsTool};

use serde_json::{Map, Value};

/// `{ total, returned, <key>: items }` keeping the first `cap` items
fn capped_list<T>(key: &str, items: Vec<T>, cap: usize, project: impl Fn(T) -> Value) -> Value {
    let total = items.len();
    let kept: Vec<Value> = items.into_iter().take(cap).map(project).collect();

    let mut payload = Map::new();
    payload.insert("total".into(), total.into());
    payload.insert("returned".into(), kept.len().into());
    payload.insert(key.into(), Value::Array(kept));
    Value::Object(payload)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_capped_list_reports_total() {
        let payload = capped_list("items", vec![1, 2, 3, 4], 2, |n| json!(n * 10));
        assert_eq!(payload, json!({"total": 4, "returned": 2, "items": [10, 20]}));
    }
}
