//! Codeforces Integration
//!
//! Abstractions and implementations for the Codeforces data API.

mod client;
mod gate;
mod mock;

pub use client::{CodeforcesClient, CodeforcesConfig, api_signature};
pub use gate::RateGate;
pub use mock::MockContestApi;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Contest, ProblemSet, RatingChange, Standings, Submission, User};

/// Parameters of a `contest.standings` call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StandingsQuery {
    pub contest_id: u64,
    /// 1-based index of the first row
    pub from: u32,
    pub count: u32,
    /// Restrict rows to these handles (empty = all)
    pub handles: Vec<String>,
    /// Include virtual and out-of-competition parties
    pub show_unofficial: bool,
}

impl StandingsQuery {
    pub const fn new(contest_id: u64) -> Self {
        Self {
            contest_id,
            from: 1,
            count: 20,
            handles: Vec::new(),
            show_unofficial: false,
        }
    }
}

/// Data API client trait (Strategy pattern)
///
/// `CodeforcesClient` talks to the real API; `MockContestApi` serves seeded
/// in-memory data for tests and offline demos.
#[async_trait]
pub trait ContestApi: Send + Sync {
    /// `user.info`
    async fn user_info(&self, handles: &[String]) -> Result<Vec<User>>;

    /// `user.rating`
    async fn user_rating(&self, handle: &str) -> Result<Vec<RatingChange>>;

    /// `user.status`, newest first; `from` is 1-based
    async fn user_status(&self, handle: &str, from: u32, count: u32) -> Result<Vec<Submission>>;

    /// `contest.list`
    async fn contest_list(&self, gym: bool) -> Result<Vec<Contest>>;

    /// `contest.standings`
    async fn contest_standings(&self, query: &StandingsQuery) -> Result<Standings>;

    /// `user.ratedList`
    async fn rated_list(&self, active_only: bool) -> Result<Vec<User>>;

    /// `problemset.problems`
    async fn problemset(&self, tags: &[String]) -> Result<ProblemSet>;

    /// Backend name for logs
    fn name(&self) -> &str;
}
