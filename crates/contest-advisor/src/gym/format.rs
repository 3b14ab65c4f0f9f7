//! Display helpers for resolved sessions.

use chrono::DateTime;

const FILLED: char = '★';
const EMPTY: char = '☆';

/// Difficulty 1-5 as a five glyph scale, e.g. `★★★☆☆`
pub fn difficulty_stars(difficulty: u8) -> String {
    let filled = usize::from(difficulty.min(5));
    std::iter::repeat_n(FILLED, filled)
        .chain(std::iter::repeat_n(EMPTY, 5 - filled))
        .collect()
}

/// Whole hours, rounded half up
pub const fn duration_hours(seconds: i64) -> i64 {
    (seconds + 1800).div_euclid(3600)
}

/// `YYYY-MM-DD HH:MM UTC`
pub fn utc_timestamp(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0).map_or_else(
        || seconds.to_string(),
        |t| t.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}

pub fn gym_link(contest_id: u64) -> String {
    format!("https://codeforces.com/gym/{contest_id}")
}
