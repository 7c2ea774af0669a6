//! Defensive parsing of oracle replies into a task kind
//!
//! Oracle output is untrusted free text. It is matched against the fixed
//! `TaskKind` vocabulary and nothing else; anything unrecognised is `Idle`.

use serde::Deserialize;

use crate::entity::tasks::TaskKind;

#[derive(Deserialize)]
struct TaskReply {
    #[serde(alias = "action", alias = "kind")]
    task: String,
}

/// Map an oracle reply onto a task kind
///
/// Accepted, in order: a bare kind name, a JSON object with a `task` (or
/// `action`/`kind`) field, or the first recognised word in the text.
pub fn parse_task_kind(reply: &str) -> TaskKind {
    let trimmed = reply.trim().trim_matches(|c: char| c == '"' || c == '.' || c == '`');
    if let Ok(kind) = trimmed.parse() {
        return kind;
    }
    if let Some(json) = extract_json(reply) {
        if let Ok(parsed) = serde_json::from_str::<TaskReply>(json) {
            if let Ok(kind) = parsed.task.parse() {
                return kind;
            }
        }
    }
    reply
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|w| !w.is_empty())
        .find_map(|w| w.parse().ok())
        .unwrap_or(TaskKind::Idle)
}

/// JSON object embedded in surrounding text, if any
fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (start < end).then(|| &reply[start..=end])
}

/// System prompt sent with every decision request
pub const DECISION_SYSTEM_PROMPT: &str = r#"You decide what a colony worker does next.
Reply with exactly one word from this list and nothing else:
MINING, WOODCUTTING, BUILDING, SOCIALIZING, EATING, SLEEPING, IDLE

Prefer EATING when hungry, SLEEPING when tired, SOCIALIZING when unhappy.
Only choose MINING, WOODCUTTING or BUILDING if a matching target is listed."#;
