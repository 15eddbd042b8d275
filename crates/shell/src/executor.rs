use async_trait::async_trait;
use goodgame_core::{ExecutionResult, GameProfile, Interpreter, Stage};

/// Everything a command needs besides its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecContext {
    pub interpreter: Interpreter,
    pub stage: Stage,
    /// Extra variables exported to the child on top of the inherited environment.
    pub env: Vec<(String, String)>,
}

impl ExecContext {
    pub fn new(interpreter: Interpreter, stage: Stage) -> Self {
        Self {
            interpreter,
            stage,
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    /// Context for running one of `profile`'s command lists.
    pub fn for_profile(profile: &GameProfile, stage: Stage) -> Self {
        Self::new(profile.interpreter().clone(), stage).with_env(profile.environment())
    }
}

/// Runs command strings under an interpreter.
#[async_trait]
pub trait ShellExecutor: Send + Sync {
    /// Runs `command` to completion and reports how it ended. Never retries.
    async fn execute(&self, command: &str, ctx: &ExecContext) -> ExecutionResult;

    /// Runs `commands` joined with `&&` in one interpreter process, so shell state
    /// such as the working directory carries from one command to the next.
    ///
    /// The result names the command that ended the chain: the failing one, or the
    /// last one on success. `commands` is never empty.
    async fn execute_chain(&self, commands: &[String], ctx: &ExecContext) -> ExecutionResult;
}
