use std::fmt;

use super::phase::Stage;

/// Exit status of a single command or of a whole sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    /// The command ran and exited non-zero. Signal deaths are reported as `128 + signal`.
    Failed(i32),
    /// The interpreter could not be located or spawned.
    InterpreterError(String),
}

impl ExecutionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Success => Some(0),
            Self::Failed(code) => Some(*code),
            Self::InterpreterError(_) => None,
        }
    }
}

/// Outcome of running a command or a command sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stage: Stage,
    /// The originating command text. `None` when the sequence was empty and nothing ran.
    pub command: Option<String>,
    pub status: ExecutionStatus,
}

impl ExecutionResult {
    pub fn new(stage: Stage, command: impl Into<String>, status: ExecutionStatus) -> Self {
        Self {
            stage,
            command: Some(command.into()),
            status,
        }
    }

    /// A successful result for a sequence that spawned nothing.
    pub fn empty(stage: Stage) -> Self {
        Self {
            stage,
            command: None,
            status: ExecutionStatus::Success,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.status.exit_code()
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let command = self.command.as_deref().unwrap_or("");
        match &self.status {
            ExecutionStatus::Success if self.command.is_none() => {
                write!(f, "{}: nothing to run", self.stage)
            }
            ExecutionStatus::Success => write!(f, "{} succeeded", self.stage),
            ExecutionStatus::Failed(code) => write!(
                f,
                "{} failed: command `{}` exited with code {}",
                self.stage, command, code
            ),
            ExecutionStatus::InterpreterError(reason) => write!(
                f,
                "{} failed: could not start interpreter for `{}`: {}",
                self.stage, command, reason
            ),
        }
    }
}
