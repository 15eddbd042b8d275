use goodgame_core::{CoreError, ExecutionResult};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Could not infer the game from the current directory {}", .0.display())]
    NoGameForDirectory(PathBuf),

    /// A run or backup stage ended in `Failed` or `InterpreterError`.
    #[error("{0}")]
    StageFailed(ExecutionResult),

    #[error("The game {game:?} has no {what} configured")]
    MissingPath { game: String, what: &'static str },

    #[error("The game {game:?} has no backup named {name:?}")]
    SnapshotNotFound { game: String, name: String },

    #[error("Invalid backup description {0:?}: descriptions must not be empty or contain path separators")]
    InvalidDescription(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl OrchestratorError {
    pub fn missing_path(game: impl Into<String>, what: &'static str) -> Self {
        Self::MissingPath {
            game: game.into(),
            what,
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit code for this error: the failing command's own code where there is one.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::StageFailed(result) => result
                .exit_code()
                .filter(|code| *code != 0)
                .unwrap_or(1),
            _ => 1,
        }
    }

    pub fn failed_result(&self) -> Option<&ExecutionResult> {
        match self {
            Self::StageFailed(result) => Some(result),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Turns a non-successful result into [`OrchestratorError::StageFailed`].
pub fn ensure_success(result: ExecutionResult) -> Result<ExecutionResult> {
    if result.is_success() {
        Ok(result)
    } else {
        Err(OrchestratorError::StageFailed(result))
    }
}
