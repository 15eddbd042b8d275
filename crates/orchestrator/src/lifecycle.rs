//! Backup lifecycle: Init -> Commit -> Push.
//!
//! Each phase is the profile's command list for that phase run through the
//! sequencer. Phases always execute in canonical order regardless of how they
//! were requested, and the first failing phase ends the invocation. Nothing is
//! retried or rolled back, and no state survives between invocations.

use goodgame_core::{BackupPhase, ExecutionResult, GameProfile};
use shell::{CommandSequencer, ExecContext};
use tracing::{info, warn};

use crate::error::{OrchestratorError, Result};

/// Per-phase results of one backup invocation, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    game: String,
    results: Vec<ExecutionResult>,
}

impl BackupReport {
    pub fn game(&self) -> &str {
        &self.game
    }

    pub fn results(&self) -> &[ExecutionResult] {
        &self.results
    }

    /// The phase result that stopped the invocation, if any.
    pub fn failure(&self) -> Option<&ExecutionResult> {
        self.results.iter().find(|result| !result.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }

    /// Phases that ran to completion.
    pub fn completed_phases(&self) -> Vec<BackupPhase> {
        self.results
            .iter()
            .filter(|result| result.is_success())
            .filter_map(|result| result.stage.backup_phase())
            .collect()
    }

    pub fn into_result(self) -> Result<Self> {
        match self.failure() {
            Some(failure) => Err(OrchestratorError::StageFailed(failure.clone())),
            None => Ok(self),
        }
    }
}

#[derive(Clone)]
pub struct BackupLifecycle {
    sequencer: CommandSequencer,
}

impl BackupLifecycle {
    pub fn new(sequencer: CommandSequencer) -> Self {
        Self { sequencer }
    }

    pub async fn run_phase(&self, profile: &GameProfile, phase: BackupPhase) -> ExecutionResult {
        let commands = profile.backup().for_phase(phase);
        info!(
            game = %profile.name(),
            phase = %phase,
            commands = commands.len(),
            "Running backup phase"
        );

        let ctx = ExecContext::for_profile(profile, phase.into());
        let result = self.sequencer.run_sequence(commands, &ctx).await;

        if result.is_success() {
            info!(game = %profile.name(), phase = %phase, "Backup phase completed");
        } else {
            warn!(game = %profile.name(), phase = %phase, "Backup phase failed");
        }
        result
    }

    /// Runs `phases` in canonical order, stopping at the first failure.
    pub async fn run(&self, profile: &GameProfile, phases: &[BackupPhase]) -> BackupReport {
        let mut results = Vec::new();
        let ordered = BackupPhase::canonical_order(phases);

        for (i, phase) in ordered.iter().enumerate() {
            let result = self.run_phase(profile, *phase).await;
            let failed = !result.is_success();
            results.push(result);

            if failed {
                let skipped: Vec<&str> = ordered[i + 1..].iter().map(|p| p.as_str()).collect();
                if !skipped.is_empty() {
                    warn!(game = %profile.name(), skipped = ?skipped, "Skipping remaining backup phases");
                }
                break;
            }
        }

        BackupReport {
            game: profile.name().to_string(),
            results,
        }
    }

    /// The canonical Init -> Commit -> Push backup.
    pub async fn run_full(&self, profile: &GameProfile) -> BackupReport {
        self.run(profile, &BackupPhase::ALL).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goodgame_core::{BackupCommands, ExecutionStatus, Interpreter, Stage};
    use shell::testing::RecordingExecutor;
    use std::sync::Arc;

    fn profile() -> GameProfile {
        GameProfile::new("mc", Interpreter::default()).with_backup(BackupCommands {
            init_commands: vec!["git init".into()],
            commit_commands: vec!["git add -A".into(), "git commit -m save".into()],
            push_commands: vec!["git push".into()],
        })
    }

    fn lifecycle(executor: &RecordingExecutor) -> BackupLifecycle {
        BackupLifecycle::new(CommandSequencer::new(Arc::new(executor.clone())))
    }

    #[tokio::test]
    async fn test_full_backup_runs_phases_in_order() {
        let executor = RecordingExecutor::new();

        let report = lifecycle(&executor).run_full(&profile()).await;

        assert!(report.is_success());
        assert_eq!(report.game(), "mc");
        assert_eq!(report.completed_phases(), BackupPhase::ALL.to_vec());
        assert_eq!(
            executor.commands(),
            vec!["git init", "git add -A", "git commit -m save", "git push"]
        );
        assert_eq!(
            executor.stages(),
            vec![
                Stage::Backup(BackupPhase::Init),
                Stage::Backup(BackupPhase::Commit),
                Stage::Backup(BackupPhase::Commit),
                Stage::Backup(BackupPhase::Push),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_commit_never_pushes() {
        let executor =
            RecordingExecutor::new().fail_with("git commit -m save", ExecutionStatus::Failed(1));

        let report = lifecycle(&executor).run_full(&profile()).await;

        assert!(!report.is_success());
        let failure = report.failure().unwrap();
        assert_eq!(failure.stage, Stage::Backup(BackupPhase::Commit));
        assert_eq!(failure.command.as_deref(), Some("git commit -m save"));
        assert_eq!(report.completed_phases(), vec![BackupPhase::Init]);
        assert!(!executor.commands().contains(&"git push".to_string()));
    }

    #[tokio::test]
    async fn test_requested_phases_run_in_canonical_order() {
        let executor = RecordingExecutor::new();

        let report = lifecycle(&executor)
            .run(&profile(), &[BackupPhase::Push, BackupPhase::Commit])
            .await;

        assert_eq!(
            report.completed_phases(),
            vec![BackupPhase::Commit, BackupPhase::Push]
        );
        assert_eq!(
            executor.commands(),
            vec!["git add -A", "git commit -m save", "git push"]
        );
    }

    #[tokio::test]
    async fn test_single_phase_invocation() {
        let executor = RecordingExecutor::new();

        let report = lifecycle(&executor)
            .run(&profile(), &[BackupPhase::Push])
            .await;

        assert!(report.is_success());
        assert_eq!(executor.commands(), vec!["git push"]);
    }

    #[tokio::test]
    async fn test_empty_phase_is_a_successful_noop() {
        let executor = RecordingExecutor::new();
        let profile = GameProfile::new("idle", Interpreter::default());

        let report = lifecycle(&executor).run_full(&profile).await;

        assert!(report.is_success());
        assert_eq!(report.results().len(), 3);
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_into_result_carries_failure() {
        let executor = RecordingExecutor::new().fail_with(
            "git init",
            ExecutionStatus::InterpreterError("bash: not found".into()),
        );

        let err = lifecycle(&executor)
            .run_full(&profile())
            .await
            .into_result()
            .unwrap_err();

        let failed = err.failed_result().unwrap();
        assert_eq!(failed.stage, Stage::Backup(BackupPhase::Init));
        assert_eq!(executor.commands(), vec!["git init"]);
    }
}
