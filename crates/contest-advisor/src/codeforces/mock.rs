//! Mock Contest API
//!
//! For testing and demo purposes. Serves seeded in-memory data and counts
//! the calls it receives.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ContestApi, StandingsQuery};
use crate::error::{AdvisorError, Result};
use crate::model::{
    Contest, Member, ParticipantType, Party, Problem, ProblemResult, ProblemSet, ProblemStatistics,
    RanklistRow, RatingChange, Standings, Submission, User,
};

/// In-memory contest API
#[derive(Default)]
pub struct MockContestApi {
    users: Vec<User>,
    ratings: HashMap<String, Vec<RatingChange>>,
    submissions: HashMap<String, Vec<Submission>>,
    contests: Vec<Contest>,
    gym_contests: Vec<Contest>,
    standings: HashMap<u64, Standings>,
    failing_standings: HashSet<u64>,
    fail_contest_list: bool,
    problemset: ProblemSet,
    status_calls: AtomicUsize,
    standings_calls: AtomicUsize,
    contest_list_calls: AtomicUsize,
}

impl MockContestApi {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    #[must_use]
    pub fn with_rating_changes(mut self, handle: &str, changes: Vec<RatingChange>) -> Self {
        self.ratings.insert(handle.to_lowercase(), changes);
        self
    }

    /// Submissions of `handle`, newest first as `user.status` returns them
    #[must_use]
    pub fn with_submissions(mut self, handle: &str, submissions: Vec<Submission>) -> Self {
        self.submissions.insert(handle.to_lowercase(), submissions);
        self
    }

    #[must_use]
    pub fn with_contest(mut self, contest: Contest) -> Self {
        self.contests.push(contest);
        self
    }

    #[must_use]
    pub fn with_gym_contest(mut self, contest: Contest) -> Self {
        self.gym_contests.push(contest);
        self
    }

    #[must_use]
    pub fn with_standings(mut self, standings: Standings) -> Self {
        self.standings.insert(standings.contest.id, standings);
        self
    }

    /// Make `contest.standings` fail for this contest
    #[must_use]
    pub fn with_failing_standings(mut self, contest_id: u64) -> Self {
        self.failing_standings.insert(contest_id);
        self
    }

    /// Make `contest.list` fail
    #[must_use]
    pub fn with_failing_contest_list(mut self) -> Self {
        self.fail_contest_list = true;
        self
    }

    #[must_use]
    pub fn with_problemset(mut self, problemset: ProblemSet) -> Self {
        self.problemset = problemset;
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn standings_calls(&self) -> usize {
        self.standings_calls.load(Ordering::SeqCst)
    }

    pub fn contest_list_calls(&self) -> usize {
        self.contest_list_calls.load(Ordering::SeqCst)
    }

    /// Small realistic data set for running the server offline
    pub fn sample() -> Self {
        let team = |start: i64| Party {
            contest_id: Some(105_789),
            members: ["automac", "jiangly"]
                .iter()
                .map(|h| Member { handle: (*h).into(), name: None })
                .collect(),
            participant_type: ParticipantType::Virtual,
            team_name: Some("Byte Me".into()),
            start_time_seconds: Some(start),
            ..Default::default()
        };
        let submission = |id: u64, contest_id: u64, index: &str, author: Party| Submission {
            id,
            contest_id: Some(contest_id),
            creation_time_seconds: author.start_time_seconds.unwrap_or_default() + 3600,
            problem: Problem {
                contest_id: Some(contest_id),
                index: index.into(),
                name: format!("Problem {index}"),
                ..Default::default()
            },
            author,
            programming_language: "GNU C++20".into(),
            verdict: Some("OK".into()),
            ..Default::default()
        };

        let start = 1_714_900_000;

        Self::new()
            .with_user(User {
                handle: "automac".into(),
                rank: Some("grandmaster".into()),
                rating: Some(2650),
                max_rank: Some("international grandmaster".into()),
                max_rating: Some(2712),
                country: Some("Japan".into()),
                ..Default::default()
            })
            .with_rating_changes(
                "automac",
                vec![RatingChange {
                    contest_id: 1951,
                    contest_name: "Codeforces Global Round 25".into(),
                    handle: "automac".into(),
                    rank: 41,
                    rating_update_time_seconds: 1_712_000_000,
                    old_rating: 2598,
                    new_rating: 2650,
                }],
            )
            .with_submissions(
                "automac",
                vec![
                    submission(3, 105_789, "B", team(start)),
                    submission(2, 105_789, "A", team(start)),
                    submission(1, 1951, "C", Party {
                        participant_type: ParticipantType::Contestant,
                        members: vec![Member { handle: "automac".into(), name: None }],
                        ..Default::default()
                    }),
                ],
            )
            .with_contest(Contest {
                id: 1951,
                name: "Codeforces Global Round 25".into(),
                scoring: "CF".into(),
                phase: "FINISHED".into(),
                duration_seconds: Some(9000),
                start_time_seconds: Some(1_711_900_000),
                ..Default::default()
            })
            .with_gym_contest(Contest {
                id: 105_789,
                name: "2024 ICPC Asia Regional Contest".into(),
                scoring: "ICPC".into(),
                phase: "FINISHED".into(),
                duration_seconds: Some(18_000),
                difficulty: Some(4),
                ..Default::default()
            })
            .with_standings(Standings {
                contest: Contest { id: 105_789, ..Default::default() },
                problems: ["A", "B", "C"]
                    .iter()
                    .map(|i| Problem { index: (*i).into(), ..Default::default() })
                    .collect(),
                rows: vec![RanklistRow {
                    party: team(start),
                    rank: 12,
                    problem_results: vec![
                        ProblemResult { points: 1.0, ..Default::default() },
                        ProblemResult { points: 1.0, ..Default::default() },
                        ProblemResult::default(),
                    ],
                    ..Default::default()
                }],
            })
            .with_problemset(ProblemSet {
                problems: vec![Problem {
                    contest_id: Some(1951),
                    index: "C".into(),
                    name: "Ticket Hoarding".into(),
                    rating: Some(1400),
                    tags: vec!["greedy".into(), "sortings".into()],
                    ..Default::default()
                }],
                problem_statistics: vec![ProblemStatistics {
                    contest_id: Some(1951),
                    index: "C".into(),
                    solved_count: 17_000,
                }],
            })
    }

    fn not_found(method: &str, what: String) -> AdvisorError {
        AdvisorError::Api {
            method: method.into(),
            comment: what,
        }
    }
}

#[async_trait]
impl ContestApi for MockContestApi {
    async fn user_info(&self, handles: &[String]) -> Result<Vec<User>> {
        handles
            .iter()
            .map(|handle| {
                self.users
                    .iter()
                    .find(|u| u.handle.eq_ignore_ascii_case(handle))
                    .cloned()
                    .ok_or_else(|| {
                        Self::not_found("user.info", format!("handles: User with handle {handle} not found"))
                    })
            })
            .collect()
    }

    async fn user_rating(&self, handle: &str) -> Result<Vec<RatingChange>> {
        Ok(self.ratings.get(&handle.to_lowercase()).cloned().unwrap_or_default())
    }

    async fn user_status(&self, handle: &str, from: u32, count: u32) -> Result<Vec<Submission>> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let submissions = self
            .submissions
            .get(&handle.to_lowercase())
            .ok_or_else(|| Self::not_found("user.status", format!("handle: User with handle {handle} not found")))?;

        let skip = from.saturating_sub(1) as usize;
        Ok(submissions.iter().skip(skip).take(count as usize).cloned().collect())
    }

    async fn contest_list(&self, gym: bool) -> Result<Vec<Contest>> {
        self.contest_list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_contest_list {
            return Err(AdvisorError::Http {
                method: "contest.list".into(),
                status: 503,
            });
        }
        Ok(if gym { self.gym_contests.clone() } else { self.contests.clone() })
    }

    async fn contest_standings(&self, query: &StandingsQuery) -> Result<Standings> {
        self.standings_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_standings.contains(&query.contest_id) {
            return Err(AdvisorError::Http {
                method: "contest.standings".into(),
                status: 502,
            });
        }

        let mut standings = self.standings.get(&query.contest_id).cloned().ok_or_else(|| {
            Self::not_found(
                "contest.standings",
                format!("contestId: Contest with id {} not found", query.contest_id),
            )
        })?;

        standings.rows.retain(|row| {
            let official = matches!(row.party.participant_type, ParticipantType::Contestant);
            let wanted = query.handles.is_empty()
                || row
                    .party
                    .handles()
                    .any(|h| query.handles.iter().any(|q| q.eq_ignore_ascii_case(h)));
            (official || query.show_unofficial) && wanted
        });
        standings.rows = standings
            .rows
            .into_iter()
            .skip(query.from.saturating_sub(1) as usize)
            .take(query.count as usize)
            .collect();
        Ok(standings)
    }

    async fn rated_list(&self, _active_only: bool) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().filter(|u| u.rating.is_some()).cloned().collect();
        users.sort_by(|a, b| b.rating.cmp(&a.rating));
        Ok(users)
    }

    async fn problemset(&self, tags: &[String]) -> Result<ProblemSet> {
        let mut problemset = self.problemset.clone();
        problemset
            .problems
            .retain(|p| tags.iter().all(|t| p.tags.contains(t)));
        Ok(problemset)
    }

    fn name(&self) -> &str {
        "MockContestApi"
    }
}
