//! # contest-advisor
//!
//! Codeforces data tools for the contest agent, plus the gym simulation
//! resolver that reconstructs a user's virtual gym contests.
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  svckit tools (agent_core::Tool)                             │
//! │   get_user_info · get_user_rating · get_user_submissions     │
//! │   get_contest_list · get_contest_standings · get_rated_users │
//! │   get_problemset · get_gym_simulations ──▶ gym::GymResolver  │
//! ├──────────────────────────────────────────────────────────────┤
//! │  codeforces::ContestApi                                      │
//! │   CodeforcesClient (RateGate, apiSig) │ MockContestApi       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod codeforces;
pub mod error;
pub mod gym;
pub mod model;
pub mod svckit;

use std::sync::Arc;

use agent_core::ToolRegistry;

pub use codeforces::{CodeforcesClient, CodeforcesConfig, ContestApi, MockContestApi};
pub use error::{AdvisorError, Result};
pub use gym::{GymReport, GymResolver, GymResult};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{
        GetContestListTool, GetContestStandingsTool, GetGymSimulationsTool, GetProblemsetTool,
        GetRatedUsersTool, GetUserInfoTool, GetUserRatingTool, GetUserSubmissionsTool,
    };
}

/// Register every Codeforces tool against one API backend
pub fn register_tools(registry: &mut ToolRegistry, api: &Arc<dyn ContestApi>) {
    use tools::{
        GetContestListTool, GetContestStandingsTool, GetGymSimulationsTool, GetProblemsetTool,
        GetRatedUsersTool, GetUserInfoTool, GetUserRatingTool, GetUserSubmissionsTool,
    };

    registry.register(GetUserInfoTool::new(Arc::clone(api)));
    registry.register(GetUserRatingTool::new(Arc::clone(api)));
    registry.register(GetUserSubmissionsTool::new(Arc::clone(api)));
    registry.register(GetContestListTool::new(Arc::clone(api)));
    registry.register(GetContestStandingsTool::new(Arc::clone(api)));
    registry.register(GetRatedUsersTool::new(Arc::clone(api)));
    registry.register(GetProblemsetTool::new(Arc::clone(api)));
    registry.register(GetGymSimulationsTool::new(Arc::clone(api)));
}

/// System prompt for the contest agent
pub const ADVISOR_PROMPT: &str = r#"You are a competitive programming assistant with live access to Codeforces data.

## How to Answer

1. Use the tools to look up facts; never guess ratings, ranks or results.
2. Call several tools in one turn when the lookups are independent.
3. Quote handles, contest names and numbers exactly as the tools return them.
4. Keep answers short. Use tables for lists of contests, problems or users.

## Tools Available

- `get_user_info` - Profiles: rating, rank, country, organization
- `get_user_rating` - Rated contest history with rating deltas
- `get_user_submissions` - Recent submissions with verdicts and problem tags
- `get_contest_list` - Regular or gym contests, filterable by phase
- `get_contest_standings` - Ranklist of a contest
- `get_rated_users` - Top rated users, optionally by country
- `get_problemset` - Problems by tags and rating range with solve counts
- `get_gym_simulations` - A user's recent gym virtual contests with team, rank and solved count

## Gym Simulations

Only full virtual participations count as simulations; upsolving is not a
simulation. When a result's `standings` is `unresolved` or `fetch_failed`,
say that the rank could not be determined instead of leaving it out.

If a tool fails, tell the user what could not be retrieved and answer with
what you have."#;
