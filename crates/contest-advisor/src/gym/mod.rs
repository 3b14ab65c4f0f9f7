//! Gym Simulation Resolver
//!
//! Turns a handle's raw submission history into a short list of distinct
//! gym simulations with contest metadata, team and standings.
//!
//! ```text
//! user.status pages ──▶ filter VIRTUAL gym ──▶ dedupe (contest, start)
//!                                                      │
//!        GymResult ◀── shape ◀── standings join ◀── newest `limit`
//!                                  ▲                   │
//!                                  └── contest.list ◀──┘
//! ```

mod format;
mod session;
mod standings;

pub use format::{difficulty_stars, duration_hours, gym_link, utc_timestamp};
pub use session::{SessionSet, SimulationSession, is_simulation};
pub use standings::{MatchKind, StandingsMatch, StandingsStatus, locate_row, match_standings};

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use crate::codeforces::{ContestApi, StandingsQuery};
use crate::error::Result;
use crate::model::Contest;

/// Resolver limits
#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Submissions per `user.status` page
    pub page_size: u32,
    /// Hard ceiling on pages scanned
    pub max_pages: u32,
    /// Sessions banked per requested result before discovery stops
    pub candidate_multiplier: usize,
    /// Contest ids above this value are gym contests
    pub gym_boundary: u64,
    /// Standings rows fetched per contest
    pub standings_scan_cap: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            page_size: 1000,
            max_pages: 10,
            candidate_multiplier: 3,
            gym_boundary: 100_000,
            standings_scan_cap: 5000,
        }
    }
}

/// A resolved simulation, ready for display
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GymResult {
    pub contest_id: u64,
    pub name: String,
    pub link: String,
    pub difficulty: Option<String>,
    pub duration_hours: Option<i64>,
    pub started_at: String,
    pub team: Option<String>,
    pub members: Vec<String>,
    pub rank: Option<String>,
    pub participants: Option<u32>,
    pub solved: Option<String>,
    pub standings: StandingsStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GymReport {
    pub handle: String,
    pub sessions: Vec<GymResult>,
}

enum StandingsOutcome {
    Found(StandingsMatch),
    Unresolved,
    FetchFailed,
}

pub struct GymResolver {
    api: Arc<dyn ContestApi>,
    config: ResolverConfig,
}

impl GymResolver {
    pub fn new(api: Arc<dyn ContestApi>) -> Self {
        Self::with_config(api, ResolverConfig::default())
    }

    pub const fn with_config(api: Arc<dyn ContestApi>, config: ResolverConfig) -> Self {
        Self { api, config }
    }

    /// Most recent `limit` simulations of `handle`, newest first.
    pub async fn resolve(&self, handle: &str, limit: usize) -> Result<GymReport> {
        let mut report = GymReport {
            handle: handle.to_string(),
            sessions: Vec::new(),
        };
        if limit == 0 {
            return Ok(report);
        }

        let found = self.discover(handle, limit).await?;
        if found.is_empty() {
            tracing::debug!(handle, "No gym simulations found");
            return Ok(report);
        }

        let selected = found.select(limit);
        let catalog = self.catalog(&selected).await;
        let outcomes = join_all(selected.iter().map(|s| self.standings_for(handle, s))).await;

        report.sessions = selected
            .iter()
            .zip(outcomes)
            .map(|(session, outcome)| shape(handle, session, catalog.get(&session.contest_id), outcome))
            .collect();
        Ok(report)
    }

    async fn discover(&self, handle: &str, limit: usize) -> Result<SessionSet> {
        let wanted = limit.saturating_mul(self.config.candidate_multiplier);
        let page_size = self.config.page_size;
        let mut sessions = SessionSet::new();

        for page in 0..self.config.max_pages {
            let batch = self.api.user_status(handle, page * page_size + 1, page_size).await?;
            for submission in &batch {
                sessions.add(submission, self.config.gym_boundary);
            }

            if batch.len() < page_size as usize || sessions.len() >= wanted {
                break;
            }
        }

        tracing::debug!(handle, sessions = sessions.len(), "Gym discovery finished");
        Ok(sessions)
    }

    async fn catalog(&self, sessions: &[SimulationSession]) -> HashMap<u64, Contest> {
        let needed: HashSet<u64> = sessions.iter().map(|s| s.contest_id).collect();

        match self.api.contest_list(true).await {
            Ok(contests) => contests
                .into_iter()
                .filter(|c| needed.contains(&c.id))
                .map(|c| (c.id, c))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Gym catalog unavailable, using placeholder names");
                HashMap::new()
            }
        }
    }

    async fn standings_for(&self, handle: &str, session: &SimulationSession) -> StandingsOutcome {
        let query = StandingsQuery {
            from: 1,
            count: self.config.standings_scan_cap,
            show_unofficial: true,
            ..StandingsQuery::new(session.contest_id)
        };

        let standings = match self.api.contest_standings(&query).await {
            Ok(standings) => standings,
            Err(e) => {
                tracing::warn!(contest_id = session.contest_id, error = %e, "Standings fetch failed");
                return StandingsOutcome::FetchFailed;
            }
        };

        let members = if session.members.is_empty() {
            BTreeSet::from([handle.to_string()])
        } else {
            session.members.clone()
        };

        match match_standings(
            &standings,
            session.start_time_seconds,
            &members,
            self.config.standings_scan_cap as usize,
        ) {
            Some(found) => StandingsOutcome::Found(found),
            None => {
                tracing::warn!(
                    contest_id = session.contest_id,
                    start = session.start_time_seconds,
                    "No standings row matches the session"
                );
                StandingsOutcome::Unresolved
            }
        }
    }
}

fn shape(
    handle: &str,
    session: &SimulationSession,
    contest: Option<&Contest>,
    outcome: StandingsOutcome,
) -> GymResult {
    let members = if session.members.is_empty() {
        vec![handle.to_string()]
    } else {
        session.members.iter().cloned().collect()
    };

    let (rank, participants, solved, standings) = match outcome {
        StandingsOutcome::Found(m) => (
            Some(m.rank.to_string()),
            m.total_participants,
            Some(format!("{}/{}", m.solved, m.total_problems)),
            match m.matched_by {
                MatchKind::Strict => StandingsStatus::Matched,
                MatchKind::MembersOnly => StandingsStatus::MatchedByMembers,
            },
        ),
        StandingsOutcome::Unresolved => (None, None, None, StandingsStatus::Unresolved),
        StandingsOutcome::FetchFailed => (None, None, None, StandingsStatus::FetchFailed),
    };

    GymResult {
        contest_id: session.contest_id,
        name: contest.map_or_else(|| format!("Gym #{}", session.contest_id), |c| c.name.clone()),
        link: gym_link(session.contest_id),
        difficulty: contest.and_then(|c| c.difficulty).map(difficulty_stars),
        duration_hours: contest.and_then(|c| c.duration_seconds).map(duration_hours),
        started_at: utc_timestamp(session.start_time_seconds),
        team: session.team_name.clone(),
        members,
        rank,
        participants,
        solved,
        standings,
    }
}
