use serde::{Deserialize, Serialize};
use std::fmt;

/// A named stage of the backup lifecycle.
///
/// The declaration order is the canonical execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BackupPhase {
    /// Establish the backup repository/remote. Expected to tolerate re-runs.
    Init,
    /// Capture the current save data into a local checkpoint.
    Commit,
    /// Publish the checkpoint to the remote store.
    Push,
}

impl BackupPhase {
    pub const ALL: [BackupPhase; 3] = [Self::Init, Self::Commit, Self::Push];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Commit => "commit",
            Self::Push => "push",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "init" => Some(Self::Init),
            "commit" => Some(Self::Commit),
            "push" => Some(Self::Push),
            _ => None,
        }
    }

    /// Deduplicates `phases` and sorts them into Init -> Commit -> Push order.
    pub fn canonical_order(phases: &[BackupPhase]) -> Vec<BackupPhase> {
        Self::ALL
            .into_iter()
            .filter(|phase| phases.contains(phase))
            .collect()
    }
}

impl fmt::Display for BackupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label attached to every execution result: either the run list or one backup phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Run,
    Backup(BackupPhase),
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Backup(phase) => phase.as_str(),
        }
    }

    pub fn backup_phase(&self) -> Option<BackupPhase> {
        match self {
            Self::Run => None,
            Self::Backup(phase) => Some(*phase),
        }
    }
}

impl From<BackupPhase> for Stage {
    fn from(phase: BackupPhase) -> Self {
        Self::Backup(phase)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
