//! History trimming
//!
//! The caller resends the whole conversation on every request. Only the most
//! recent turns are forwarded to the provider, plus the question being asked.

use crate::message::{Message, Role};

/// Number of (user, assistant) turns kept by default
pub const DEFAULT_MAX_TURNS: usize = 4;

/// Bound the history sent to the provider.
///
/// Messages are grouped into turns, each starting at a user message and
/// carrying the assistant replies that follow it. At most `max_turns` of the
/// most recent answered turns are kept. A trailing unanswered user message is
/// always appended, even when `max_turns` is zero.
pub fn trim_history(messages: &[Message], max_turns: usize) -> Vec<Message> {
    let (prior, pending) = match messages.split_last() {
        Some((last, rest)) if last.role == Role::User => (rest, Some(last)),
        _ => (messages, None),
    };

    let mut turns: Vec<Vec<&Message>> = Vec::new();
    for message in prior {
        match message.role {
            Role::User => turns.push(vec![message]),
            // Assistant text before any user message has no turn to join.
            Role::Assistant => {
                if let Some(turn) = turns.last_mut() {
                    turn.push(message);
                }
            }
        }
    }

    let skip = turns.len().saturating_sub(max_turns);
    let mut trimmed: Vec<Message> = turns
        .into_iter()
        .skip(skip)
        .flatten()
        .cloned()
        .collect();

    if let Some(pending) = pending {
        trimmed.push(pending.clone());
    }

    trimmed
}
