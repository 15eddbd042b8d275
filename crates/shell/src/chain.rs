//! Renders a command list into one and-then chain for a single interpreter process.
//!
//! Every command is preceded by a write of its index to the file named by
//! [`STEP_FILE_VAR`], so after a failure the caller can tell which command ended
//! the chain. Commands are wrapped in `{ ... }` groups: the group keeps `;` and
//! trailing comments inside the command without opening a subshell, so `cd` and
//! variable assignments carry over to the commands that follow.

use std::path::Path;

/// Environment variable naming the file that holds the index of the running command.
pub const STEP_FILE_VAR: &str = "GG_STEP_FILE";

pub fn render(commands: &[String]) -> String {
    commands
        .iter()
        .enumerate()
        .map(|(index, command)| {
            let body = if command.trim().is_empty() {
                ":"
            } else {
                command.as_str()
            };
            format!(
                "printf '%s' {} > \"${}\" && {{ {}\n}}",
                index, STEP_FILE_VAR, body
            )
        })
        .collect::<Vec<_>>()
        .join(" && ")
}

/// Index of the last command the chain started, as recorded in `step_file`.
pub fn last_step(step_file: &Path) -> Option<usize> {
    std::fs::read_to_string(step_file)
        .ok()
        .and_then(|content| content.trim().parse().ok())
}
