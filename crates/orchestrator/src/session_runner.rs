//! User-facing operations: play a game, back a game up, restore a local snapshot.
//!
//! Both operations block the caller until every command has finished; games
//! and git pushes are interactive and may take hours.

use goodgame_core::{BackupPhase, ExecutionResult, GameProfile, ProfileStore, Stage};
use shell::{CommandSequencer, ExecContext, ShellExecutor};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::{OrchestratorError, Result};
use crate::lifecycle::{BackupLifecycle, BackupReport};
use crate::snapshot::{RestoreOutcome, Snapshot, SnapshotStore};

/// Phases run after a game exits, unless cloud saving is skipped.
pub const POST_RUN_PHASES: [BackupPhase; 2] = [BackupPhase::Commit, BackupPhase::Push];

/// Outcome of [`SessionRunner::play`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayReport {
    pub run: ExecutionResult,
    /// `None` when the backup was skipped or the run failed.
    pub backup: Option<BackupReport>,
}

impl PlayReport {
    pub fn is_success(&self) -> bool {
        self.run.is_success() && self.backup.as_ref().map_or(true, BackupReport::is_success)
    }

    pub fn failure(&self) -> Option<&ExecutionResult> {
        if !self.run.is_success() {
            return Some(&self.run);
        }
        self.backup.as_ref().and_then(BackupReport::failure)
    }

    pub fn into_result(self) -> Result<Self> {
        match self.failure() {
            Some(failure) => Err(OrchestratorError::StageFailed(failure.clone())),
            None => Ok(self),
        }
    }
}

/// Outcome of [`SessionRunner::restore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub restore: RestoreOutcome,
    /// Cloud commit and push of the restored save. `None` when skipped.
    pub backup: Option<BackupReport>,
}

impl RestoreReport {
    pub fn into_result(self) -> Result<Self> {
        match self.backup.as_ref().and_then(BackupReport::failure) {
            Some(failure) => Err(OrchestratorError::StageFailed(failure.clone())),
            None => Ok(self),
        }
    }
}

pub struct SessionRunner {
    store: ProfileStore,
    sequencer: CommandSequencer,
    lifecycle: BackupLifecycle,
}

impl SessionRunner {
    pub fn new(store: ProfileStore, executor: Arc<dyn ShellExecutor>) -> Self {
        let sequencer = CommandSequencer::new(executor);
        Self {
            store,
            lifecycle: BackupLifecycle::new(sequencer.clone()),
            sequencer,
        }
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Looks a game up by name, or by `cwd` matching its root or save location when no name is given.
    pub fn resolve(&self, name: Option<&str>, cwd: &Path) -> Result<&GameProfile> {
        match name {
            Some(name) => Ok(self.store.get(name)?),
            None => self
                .store
                .find_by_dir(cwd)
                .ok_or_else(|| OrchestratorError::NoGameForDirectory(cwd.to_path_buf())),
        }
    }

    /// Runs the game's run commands under its interpreter.
    pub async fn run(&self, name: &str) -> Result<ExecutionResult> {
        let profile = self.store.get(name)?;
        info!(
            game = %profile.name(),
            interpreter = %profile.interpreter(),
            commands = profile.run_commands().len(),
            "Running game"
        );

        let ctx = ExecContext::for_profile(profile, Stage::Run);
        let result = self
            .sequencer
            .run_sequence(profile.run_commands(), &ctx)
            .await;

        info!(game = %profile.name(), success = result.is_success(), "Game exited");
        Ok(result)
    }

    /// Runs the requested backup phases in canonical order, stopping at the first failure.
    pub async fn backup(&self, name: &str, phases: &[BackupPhase]) -> Result<BackupReport> {
        let profile = self.store.get(name)?;
        Ok(self.lifecycle.run(profile, phases).await)
    }

    /// Runs the game, then commits and pushes its saves when `backup_after` is set
    /// and the run succeeded.
    pub async fn play(&self, name: &str, backup_after: bool) -> Result<PlayReport> {
        let run = self.run(name).await?;

        let backup = if backup_after && run.is_success() {
            Some(self.backup(name, &POST_RUN_PHASES).await?)
        } else {
            None
        };

        Ok(PlayReport { run, backup })
    }

    /// Archives the game's save location into `<root>/gg-saves`.
    pub fn snapshot(&self, name: &str, description: Option<&str>) -> Result<Snapshot> {
        let profile = self.store.get(name)?;
        SnapshotStore::for_profile(profile)?.create(description)
    }

    /// Local snapshots of the game, sorted by name.
    pub fn snapshots(&self, name: &str) -> Result<Vec<Snapshot>> {
        let profile = self.store.get(name)?;
        SnapshotStore::for_profile(profile)?.list()
    }

    /// Restores snapshot `snapshot` over the save location, after snapshotting the
    /// current save, then commits and pushes it when `backup_after` is set.
    pub async fn restore(
        &self,
        name: &str,
        snapshot: &str,
        backup_after: bool,
    ) -> Result<RestoreReport> {
        let profile = self.store.get(name)?;
        let restore = SnapshotStore::for_profile(profile)?.restore(snapshot)?;

        let backup = if backup_after {
            Some(self.lifecycle.run(profile, &POST_RUN_PHASES).await)
        } else {
            None
        };
        Ok(RestoreReport { restore, backup })
    }
}
