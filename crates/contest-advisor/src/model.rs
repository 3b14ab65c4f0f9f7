//! Domain Models
//!
//! Codeforces API objects. The API omits fields freely (unrated users, gym
//! contests without a difficulty, submissions still in queue), so nearly
//! everything optional carries `#[serde(default)]`.

use serde::{Deserialize, Serialize};

/// How a party took part in a contest
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantType {
    Contestant,
    /// Solving problems after the contest ended (upsolving)
    Practice,
    /// Full timed simulation of a finished contest
    Virtual,
    Manager,
    OutOfCompetition,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub handle: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A contestant or a team
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    #[serde(default)]
    pub contest_id: Option<u64>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub participant_type: ParticipantType,
    #[serde(default)]
    pub team_id: Option<u64>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub ghost: bool,
    #[serde(default)]
    pub room: Option<u32>,
    /// When the party started; set for virtual participations
    #[serde(default)]
    pub start_time_seconds: Option<i64>,
}

impl Party {
    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.handle.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    #[serde(default)]
    pub contest_id: Option<u64>,
    #[serde(default)]
    pub problemset_name: Option<String>,
    #[serde(default)]
    pub index: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub rating: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStatistics {
    #[serde(default)]
    pub contest_id: Option<u64>,
    #[serde(default)]
    pub index: String,
    #[serde(default)]
    pub solved_count: u64,
}

/// `problemset.problems` result
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSet {
    #[serde(default)]
    pub problems: Vec<Problem>,
    #[serde(default)]
    pub problem_statistics: Vec<ProblemStatistics>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: u64,
    #[serde(default)]
    pub contest_id: Option<u64>,
    #[serde(default)]
    pub creation_time_seconds: i64,
    #[serde(default)]
    pub relative_time_seconds: Option<i64>,
    #[serde(default)]
    pub problem: Problem,
    #[serde(default)]
    pub author: Party,
    #[serde(default)]
    pub programming_language: String,
    /// Absent while the submission is still being judged
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub passed_test_count: u32,
    #[serde(default)]
    pub time_consumed_millis: u64,
    #[serde(default)]
    pub memory_consumed_bytes: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contest {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// Scoring system: CF, IOI or ICPC
    #[serde(default, rename = "type")]
    pub scoring: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub frozen: bool,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub start_time_seconds: Option<i64>,
    #[serde(default)]
    pub prepared_by: Option<String>,
    /// Gym difficulty, 1 to 5
    #[serde(default)]
    pub difficulty: Option<u8>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemResult {
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub penalty: Option<i64>,
    #[serde(default)]
    pub rejected_attempt_count: u32,
    #[serde(default)]
    pub best_submission_time_seconds: Option<i64>,
}

impl ProblemResult {
    pub fn is_solved(&self) -> bool {
        self.points > 0.0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RanklistRow {
    #[serde(default)]
    pub party: Party,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub penalty: i64,
    #[serde(default)]
    pub successful_hack_count: u32,
    #[serde(default)]
    pub unsuccessful_hack_count: u32,
    #[serde(default)]
    pub problem_results: Vec<ProblemResult>,
}

impl RanklistRow {
    pub fn solved(&self) -> usize {
        self.problem_results.iter().filter(|r| r.is_solved()).count()
    }
}

/// `contest.standings` result
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Standings {
    pub contest: Contest,
    #[serde(default)]
    pub problems: Vec<Problem>,
    #[serde(default)]
    pub rows: Vec<RanklistRow>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub handle: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub contribution: i64,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub max_rank: Option<String>,
    #[serde(default)]
    pub max_rating: Option<i32>,
    #[serde(default)]
    pub last_online_time_seconds: Option<i64>,
    #[serde(default)]
    pub registration_time_seconds: Option<i64>,
    #[serde(default)]
    pub friend_of_count: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingChange {
    pub contest_id: u64,
    #[serde(default)]
    pub contest_name: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub rating_update_time_seconds: i64,
    #[serde(default)]
    pub old_rating: i32,
    #[serde(default)]
    pub new_rating: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_tolerates_missing_fields() {
        let json = r#"{
            "id": 1,
            "contestId": 105789,
            "creationTimeSeconds": 1700000100,
            "problem": {"index": "A", "name": "Sum", "tags": ["math"]},
            "author": {
                "members": [{"handle": "automac"}],
                "participantType": "VIRTUAL",
                "teamName": "Bytes",
                "startTimeSeconds": 1700000000
            },
            "programmingLanguage": "C++17"
        }"#;
        let sub: Submission = serde_json::from_str(json).unwrap();
        assert_eq!(sub.author.participant_type, ParticipantType::Virtual);
        assert_eq!(sub.author.start_time_seconds, Some(1_700_000_000));
        assert_eq!(sub.verdict, None);
        assert_eq!(sub.author.handles().collect::<Vec<_>>(), vec!["automac"]);
    }

    #[test]
    fn test_unknown_participant_type() {
        let party: Party = serde_json::from_str(r#"{"participantType": "SOMETHING_NEW"}"#).unwrap();
        assert_eq!(party.participant_type, ParticipantType::Unknown);
    }

    #[test]
    fn test_row_counts_positive_points_only() {
        let row = RanklistRow {
            problem_results: vec![
                ProblemResult { points: 1.0, ..Default::default() },
                ProblemResult { points: 0.0, rejected_attempt_count: 3, ..Default::default() },
                ProblemResult { points: 1.0, ..Default::default() },
            ],
            ..Default::default()
        };
        assert_eq!(row.solved(), 2);
    }
}
