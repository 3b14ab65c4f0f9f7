//! Session discovery and deduplication.

use std::collections::{BTreeSet, HashSet};

use crate::model::{ParticipantType, Submission};

/// One distinct full simulation of a gym contest
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationSession {
    pub contest_id: u64,
    pub start_time_seconds: i64,
    pub team_name: Option<String>,
    /// Handles of the party, sorted
    pub members: BTreeSet<String>,
}

impl SimulationSession {
    pub const fn key(&self) -> (u64, i64) {
        (self.contest_id, self.start_time_seconds)
    }
}

/// Whether a submission was made during a full simulation of a gym contest.
///
/// Upsolving (`PRACTICE`) submissions are excluded even in gym contests.
pub fn is_simulation(submission: &Submission, gym_boundary: u64) -> bool {
    submission.contest_id.is_some_and(|id| id > gym_boundary)
        && submission.author.participant_type == ParticipantType::Virtual
}

/// Sessions in first-seen order, keyed by `(contest_id, start_time_seconds)`.
#[derive(Debug, Default)]
pub struct SessionSet {
    seen: HashSet<(u64, i64)>,
    sessions: Vec<SimulationSession>,
}

impl SessionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bank a submission; returns true when it opened a new session.
    pub fn add(&mut self, submission: &Submission, gym_boundary: u64) -> bool {
        if !is_simulation(submission, gym_boundary) {
            return false;
        }
        let (Some(contest_id), Some(start)) = (submission.contest_id, submission.author.start_time_seconds)
        else {
            return false;
        };
        if !self.seen.insert((contest_id, start)) {
            return false;
        }

        self.sessions.push(SimulationSession {
            contest_id,
            start_time_seconds: start,
            team_name: submission.author.team_name.clone(),
            members: submission.author.handles().map(str::to_string).collect(),
        });
        true
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Most recent `limit` sessions, newest first
    pub fn select(self, limit: usize) -> Vec<SimulationSession> {
        let mut sessions = self.sessions;
        sessions.sort_by(|a, b| b.start_time_seconds.cmp(&a.start_time_seconds));
        sessions.truncate(limit);
        sessions
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{Member, Party};

    pub(crate) fn submission(
        id: u64,
        contest_id: u64,
        participant_type: ParticipantType,
        start: i64,
        handles: &[&str],
    ) -> Submission {
        Submission {
            id,
            contest_id: Some(contest_id),
            creation_time_seconds: start + 600,
            author: Party {
                contest_id: Some(contest_id),
                members: handles
                    .iter()
                    .map(|h| Member { handle: (*h).into(), name: None })
                    .collect(),
                participant_type,
                team_name: (handles.len() > 1).then(|| format!("team-{contest_id}")),
                start_time_seconds: Some(start),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicate_keys_collapse() {
        let mut set = SessionSet::new();
        assert!(set.add(&submission(2, 105_789, ParticipantType::Virtual, 1000, &["b", "a"]), 100_000));
        assert!(!set.add(&submission(1, 105_789, ParticipantType::Virtual, 1000, &["c"]), 100_000));
        assert!(!set.add(&submission(2, 105_789, ParticipantType::Virtual, 1000, &["b", "a"]), 100_000));

        let sessions = set.select(10);
        assert_eq!(sessions.len(), 1);
        let members: Vec<_> = sessions[0].members.iter().map(String::as_str).collect();
        assert_eq!(members, vec!["a", "b"]);
        assert_eq!(sessions[0].team_name.as_deref(), Some("team-105789"));
    }

    #[test]
    fn test_filter_rejects_upsolving_and_regular_rounds() {
        assert!(!is_simulation(&submission(1, 105_789, ParticipantType::Practice, 1000, &["a"]), 100_000));
        assert!(!is_simulation(&submission(1, 1951, ParticipantType::Virtual, 1000, &["a"]), 100_000));
        assert!(!is_simulation(&submission(1, 100_000, ParticipantType::Virtual, 1000, &["a"]), 100_000));
        assert!(is_simulation(&submission(1, 100_001, ParticipantType::Virtual, 1000, &["a"]), 100_000));
    }

    #[test]
    fn test_missing_start_time_is_skipped() {
        let mut sub = submission(1, 105_789, ParticipantType::Virtual, 1000, &["a"]);
        sub.author.start_time_seconds = None;
        let mut set = SessionSet::new();
        assert!(!set.add(&sub, 100_000));
        assert!(set.is_empty());
    }

    #[test]
    fn test_select_sorts_descending_and_truncates() {
        let mut set = SessionSet::new();
        for (id, start) in [(1, 300), (2, 900), (3, 100), (4, 600)] {
            set.add(&submission(id, 100_000 + id, ParticipantType::Virtual, start, &["a"]), 100_000);
        }
        let starts: Vec<_> = set.select(3).iter().map(|s| s.start_time_seconds).collect();
        assert_eq!(starts, vec![900, 600, 300]);
    }
}
