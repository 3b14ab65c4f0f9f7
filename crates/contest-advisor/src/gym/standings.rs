//! Locating a session's row in contest standings.
//!
//! Several parties can start a virtual contest in the same second and rows
//! are ordered by rank, so the start time alone does not identify a row. A
//! row must also share at least one handle with the session.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{RanklistRow, Standings};

/// Which join located the row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchKind {
    /// Start time and a member handle both matched
    Strict,
    /// Only a member handle matched
    MembersOnly,
}

/// Result of a successful standings lookup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StandingsMatch {
    pub rank: u32,
    /// Unknown when the row scan hit the cap
    pub total_participants: Option<u32>,
    pub solved: usize,
    pub total_problems: usize,
    pub matched_by: MatchKind,
}

/// How the standings of a session were resolved
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StandingsStatus {
    Matched,
    MatchedByMembers,
    /// Standings loaded but no row belongs to the session
    Unresolved,
    /// The standings request failed
    FetchFailed,
}

fn shares_member(row: &RanklistRow, members: &BTreeSet<String>) -> bool {
    row.party
        .handles()
        .any(|h| members.iter().any(|m| m.eq_ignore_ascii_case(h)))
}

/// Find the row of the party that started at `start` with any of `members`,
/// falling back to a member-only match.
pub fn locate_row<'a>(
    rows: &'a [RanklistRow],
    start: i64,
    members: &BTreeSet<String>,
) -> Option<(&'a RanklistRow, MatchKind)> {
    rows.iter()
        .find(|row| row.party.start_time_seconds == Some(start) && shares_member(row, members))
        .map(|row| (row, MatchKind::Strict))
        .or_else(|| {
            rows.iter()
                .find(|row| shares_member(row, members))
                .map(|row| (row, MatchKind::MembersOnly))
        })
}

/// Resolve rank and solved count from standings fetched with `scan_cap` rows.
pub fn match_standings(
    standings: &Standings,
    start: i64,
    members: &BTreeSet<String>,
    scan_cap: usize,
) -> Option<StandingsMatch> {
    let (row, matched_by) = locate_row(&standings.rows, start, members)?;

    let total_participants = if standings.rows.len() < scan_cap {
        standings.rows.last().map(|last| last.rank)
    } else {
        None
    };

    Some(StandingsMatch {
        rank: row.rank,
        total_participants,
        solved: row.solved(),
        total_problems: standings.problems.len(),
        matched_by,
    })
}
