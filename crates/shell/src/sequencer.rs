use goodgame_core::ExecutionResult;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::executor::{ExecContext, ShellExecutor};

/// Runs an ordered command list as one unit of work.
///
/// The list is handed to the executor as a single `&&` chain: commands run in
/// order inside one interpreter process, and the first failure ends the chain so
/// later commands never run. There is no per-command error suppression: a
/// command that may fail has to say so itself (`cmd || true`).
#[derive(Clone)]
pub struct CommandSequencer {
    executor: Arc<dyn ShellExecutor>,
}

impl CommandSequencer {
    pub fn new(executor: Arc<dyn ShellExecutor>) -> Self {
        Self { executor }
    }

    pub async fn run_sequence(&self, commands: &[String], ctx: &ExecContext) -> ExecutionResult {
        if commands.is_empty() {
            debug!(stage = %ctx.stage, "No commands configured");
            return ExecutionResult::empty(ctx.stage);
        }

        let result = self.executor.execute_chain(commands, ctx).await;
        if result.is_success() {
            debug!(stage = %ctx.stage, commands = commands.len(), "Sequence completed");
        } else {
            let index = result
                .command
                .as_deref()
                .and_then(|failed| commands.iter().position(|c| c == failed));
            warn!(
                stage = %ctx.stage,
                index = ?index,
                command = ?result.command,
                status = ?result.status,
                "Command failed, stopping sequence"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingExecutor;
    use goodgame_core::{ExecutionStatus, Interpreter, Stage};

    fn commands(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    fn ctx() -> ExecContext {
        ExecContext::new(Interpreter::default(), Stage::Run)
    }

    #[tokio::test]
    async fn test_all_success_runs_each_once_in_order() {
        let executor = RecordingExecutor::new();
        let sequencer = CommandSequencer::new(Arc::new(executor.clone()));
        let list = commands(&["a", "b", "c"]);

        let result = sequencer.run_sequence(&list, &ctx()).await;

        assert!(result.is_success());
        assert_eq!(result.command.as_deref(), Some("c"));
        assert_eq!(executor.commands(), list);
        assert_eq!(executor.chains(), vec![list]);
    }

    #[tokio::test]
    async fn test_failure_short_circuits() {
        let list = commands(&["a", "b", "c", "d"]);
        for failing in 0..list.len() {
            let executor = RecordingExecutor::new()
                .fail_with(list[failing].clone(), ExecutionStatus::Failed(2));
            let sequencer = CommandSequencer::new(Arc::new(executor.clone()));

            let result = sequencer.run_sequence(&list, &ctx()).await;

            assert_eq!(result.status, ExecutionStatus::Failed(2));
            assert_eq!(result.command.as_deref(), Some(list[failing].as_str()));
            assert_eq!(executor.commands(), list[..=failing].to_vec());
        }
    }

    #[tokio::test]
    async fn test_interpreter_error_short_circuits() {
        let executor = RecordingExecutor::new()
            .fail_with("a", ExecutionStatus::InterpreterError("missing".into()));
        let sequencer = CommandSequencer::new(Arc::new(executor.clone()));

        let result = sequencer.run_sequence(&commands(&["a", "b"]), &ctx()).await;

        assert!(matches!(result.status, ExecutionStatus::InterpreterError(_)));
        assert_eq!(executor.commands(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_sequence_spawns_nothing() {
        let executor = RecordingExecutor::new();
        let sequencer = CommandSequencer::new(Arc::new(executor.clone()));

        let result = sequencer.run_sequence(&[], &ctx()).await;

        assert!(result.is_success());
        assert!(result.command.is_none());
        assert!(executor.calls().is_empty());
        assert!(executor.chains().is_empty());
    }

    #[tokio::test]
    async fn test_context_is_forwarded() {
        let executor = RecordingExecutor::new();
        let sequencer = CommandSequencer::new(Arc::new(executor.clone()));
        let ctx = ExecContext::new(Interpreter::new("bash"), Stage::Run)
            .with_env(vec![("GAME".to_string(), "mc".to_string())]);

        sequencer.run_sequence(&commands(&["a"]), &ctx).await;

        let calls = executor.calls();
        assert_eq!(calls[0].interpreter.as_str(), "bash");
        assert_eq!(calls[0].env, ctx.env);
    }
}
