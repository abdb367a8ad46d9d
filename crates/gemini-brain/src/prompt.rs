//! Prompt assembly.
//!
//! The generative API is driven with one flat text prompt: system prompt,
//! recent transcript rendered as labeled lines, the new message, and a
//! trailing assistant cue so the model answers in character.

use store::{Role, Turn, REPLAY_TURNS};

/// Label for user lines in the prompt.
pub const USER_LABEL: &str = "User";

/// Label for assistant lines and the trailing cue.
pub const ASSISTANT_LABEL: &str = "Solace";

fn label(role: Role) -> &'static str {
    match role {
        Role::User => USER_LABEL,
        Role::Model => ASSISTANT_LABEL,
    }
}

/// Build the full prompt. Only the last [`REPLAY_TURNS`] turns of `history`
/// are rendered, oldest first.
pub fn build_prompt(system_prompt: &str, history: &[Turn], message: &str) -> String {
    let start = history.len().saturating_sub(REPLAY_TURNS);
    let lines: Vec<String> = history[start..]
        .iter()
        .map(|turn| format!("{}: {}", label(turn.role), turn.text))
        .collect();

    if lines.is_empty() {
        format!("{system_prompt}\n\n{USER_LABEL}: {message}\n{ASSISTANT_LABEL}:")
    } else {
        format!(
            "{system_prompt}\n\n{}\n\n{USER_LABEL}: {message}\n{ASSISTANT_LABEL}:",
            lines.join("\n")
        )
    }
}
