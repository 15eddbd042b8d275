use goodgame_core::{ExecutionStatus, Interpreter, Stage};
use shell::{CommandSequencer, ExecContext, ProcessExecutor};
use std::sync::Arc;
use tempfile::TempDir;

fn sequencer() -> CommandSequencer {
    CommandSequencer::new(Arc::new(ProcessExecutor::new()))
}

fn ctx() -> ExecContext {
    ExecContext::new(Interpreter::new("sh"), Stage::Run)
}

#[tokio::test]
async fn test_commands_run_in_order_with_real_shell() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("log.txt");
    let commands: Vec<String> = ["first", "second", "third"]
        .iter()
        .map(|word| format!("echo {} >> '{}'", word, log.display()))
        .collect();

    let result = sequencer().run_sequence(&commands, &ctx()).await;

    assert!(result.is_success());
    assert_eq!(
        std::fs::read_to_string(&log).unwrap(),
        "first\nsecond\nthird\n"
    );
}

#[tokio::test]
async fn test_failing_command_stops_later_commands() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("marker");
    let commands = vec![
        "true".to_string(),
        "exit 4".to_string(),
        format!("touch '{}'", marker.display()),
    ];

    let result = sequencer().run_sequence(&commands, &ctx()).await;

    assert_eq!(result.status, ExecutionStatus::Failed(4));
    assert_eq!(result.command.as_deref(), Some("exit 4"));
    assert!(!marker.exists());
}

#[tokio::test]
async fn test_soft_fail_idiom_lives_in_the_command() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("marker");
    let commands = vec![
        "false || true".to_string(),
        format!("touch '{}'", marker.display()),
    ];

    let result = sequencer().run_sequence(&commands, &ctx()).await;

    assert!(result.is_success());
    assert!(marker.exists());
}

#[tokio::test]
async fn test_cd_carries_over_to_later_commands() {
    let dir = TempDir::new().unwrap();
    let saves = dir.path().join("saves");
    std::fs::create_dir(&saves).unwrap();
    let commands = vec![
        format!("cd '{}'", saves.display()),
        "touch committed".to_string(),
    ];

    let result = sequencer().run_sequence(&commands, &ctx()).await;

    assert!(result.is_success());
    assert!(saves.join("committed").exists());
    assert!(!std::env::current_dir().unwrap().join("committed").exists());
}

#[tokio::test]
async fn test_variables_carry_over_to_later_commands() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.txt");
    let commands = vec![
        "SHARED=1".to_string(),
        format!("printf '%s' \"${{SHARED:-unset}}\" > '{}'", out.display()),
    ];

    let result = sequencer().run_sequence(&commands, &ctx()).await;

    assert!(result.is_success());
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "1");
}
