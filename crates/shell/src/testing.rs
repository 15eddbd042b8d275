//! In-memory executor that records invocations instead of spawning processes.

use async_trait::async_trait;
use goodgame_core::{ExecutionResult, ExecutionStatus, Interpreter, Stage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::executor::{ExecContext, ShellExecutor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub command: String,
    pub stage: Stage,
    pub interpreter: Interpreter,
    pub env: Vec<(String, String)>,
}

/// Succeeds for every command unless told otherwise with [`RecordingExecutor::fail_with`].
///
/// Chains are replayed command by command with `&&` semantics, so every command the
/// chain would have started shows up in [`RecordingExecutor::calls`]. Clones share
/// the same call log.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    chains: Arc<Mutex<Vec<Vec<String>>>>,
    outcomes: Arc<Mutex<HashMap<String, ExecutionStatus>>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(self, command: impl Into<String>, status: ExecutionStatus) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .insert(command.into(), status);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.command).collect()
    }

    /// Command lists handed over as one chain, in call order.
    pub fn chains(&self) -> Vec<Vec<String>> {
        self.chains.lock().unwrap().clone()
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.calls().into_iter().map(|call| call.stage).collect()
    }
}

#[async_trait]
impl ShellExecutor for RecordingExecutor {
    async fn execute(&self, command: &str, ctx: &ExecContext) -> ExecutionResult {
        self.calls.lock().unwrap().push(RecordedCall {
            command: command.to_string(),
            stage: ctx.stage,
            interpreter: ctx.interpreter.clone(),
            env: ctx.env.clone(),
        });

        let status = self
            .outcomes
            .lock()
            .unwrap()
            .get(command)
            .cloned()
            .unwrap_or(ExecutionStatus::Success);
        ExecutionResult::new(ctx.stage, command, status)
    }

    async fn execute_chain(&self, commands: &[String], ctx: &ExecContext) -> ExecutionResult {
        self.chains.lock().unwrap().push(commands.to_vec());

        let mut last = ExecutionResult::empty(ctx.stage);
        for command in commands {
            last = self.execute(command, ctx).await;
            if !last.is_success() {
                break;
            }
        }
        last
    }
}
