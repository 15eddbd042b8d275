use async_trait::async_trait;
use goodgame_core::{ExecutionResult, ExecutionStatus};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::chain::{self, STEP_FILE_VAR};
use crate::executor::{ExecContext, ShellExecutor};

/// Exit code reported when the user interrupts a running command (128 + SIGINT).
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Spawns `<interpreter> -c <command>` with the caller's standard streams.
///
/// A command list runs as one `&&` chain in a single process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessExecutor {
    /// Spawns `<interpreter> -c <script>` and waits for it, or for Ctrl-C.
    async fn run_script(
        &self,
        script: &str,
        ctx: &ExecContext,
        step_file: Option<&Path>,
    ) -> ExecutionStatus {
        let mut command = Command::new(ctx.interpreter.as_str());
        command
            .arg("-c")
            .arg(script)
            .envs(ctx.env.iter().cloned())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(step_file) = step_file {
            command.env(STEP_FILE_VAR, step_file);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(interpreter = %ctx.interpreter, error = %e, "Failed to spawn interpreter");
                return ExecutionStatus::InterpreterError(format!("{}: {}", ctx.interpreter, e));
            }
        };

        tokio::select! {
            waited = child.wait() => match waited {
                Ok(status) => status_from_exit(status),
                Err(e) => ExecutionStatus::InterpreterError(format!("failed to wait on child: {}", e)),
            },
            Ok(()) = tokio::signal::ctrl_c() => {
                warn!(stage = %ctx.stage, "Interrupted, stopping command");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill interrupted command");
                }
                ExecutionStatus::Failed(INTERRUPTED_EXIT_CODE)
            }
        }
    }
}

#[async_trait]
impl ShellExecutor for ProcessExecutor {
    async fn execute(&self, command: &str, ctx: &ExecContext) -> ExecutionResult {
        debug!(
            stage = %ctx.stage,
            interpreter = %ctx.interpreter,
            command,
            "Spawning command"
        );

        let status = self.run_script(command, ctx, None).await;

        debug!(stage = %ctx.stage, command, status = ?status, "Command finished");
        ExecutionResult::new(ctx.stage, command, status)
    }

    async fn execute_chain(&self, commands: &[String], ctx: &ExecContext) -> ExecutionResult {
        let (first, last) = match (commands.first(), commands.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return ExecutionResult::empty(ctx.stage),
        };
        if commands.len() == 1 {
            return self.execute(first, ctx).await;
        }

        let step_file = match tempfile::Builder::new().prefix("gg-step-").tempfile() {
            Ok(file) => file,
            Err(e) => {
                return ExecutionResult::new(
                    ctx.stage,
                    first.as_str(),
                    ExecutionStatus::InterpreterError(format!("could not create step file: {}", e)),
                )
            }
        };

        debug!(
            stage = %ctx.stage,
            interpreter = %ctx.interpreter,
            commands = commands.len(),
            "Spawning command chain"
        );
        let script = chain::render(commands);
        let status = self.run_script(&script, ctx, Some(step_file.path())).await;

        let command = if status.is_success() {
            last
        } else {
            chain::last_step(step_file.path())
                .and_then(|index| commands.get(index))
                .unwrap_or(first)
        };

        debug!(stage = %ctx.stage, command = %command, status = ?status, "Command chain finished");
        ExecutionResult::new(ctx.stage, command.as_str(), status)
    }
}

fn status_from_exit(status: ExitStatus) -> ExecutionStatus {
    if status.success() {
        return ExecutionStatus::Success;
    }
    if let Some(code) = status.code() {
        return ExecutionStatus::Failed(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ExecutionStatus::Failed(128 + signal);
        }
    }
    ExecutionStatus::Failed(1)
}
