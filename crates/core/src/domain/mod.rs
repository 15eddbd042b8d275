mod execution;
mod phase;
mod profile;

pub use execution::{ExecutionResult, ExecutionStatus};
pub use phase::{BackupPhase, Stage};
pub use profile::{BackupCommands, GameProfile, Interpreter};
