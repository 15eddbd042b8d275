use goodgame_core::{BackupPhase, ExecutionStatus, Interpreter, ProfileStore, Stage};
use orchestrator::{OrchestratorError, SessionRunner};
use serde_json::json;
use shell::ProcessExecutor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn runner_for(config: serde_json::Value) -> SessionRunner {
    let store = ProfileStore::load(&config.to_string(), Interpreter::new("sh"))
        .expect("Failed to load config");
    SessionRunner::new(store, Arc::new(ProcessExecutor::new()))
}

fn append(log: &Path, word: &str) -> String {
    format!("echo {} >> '{}'", word, log.display())
}

fn read(log: &Path) -> String {
    std::fs::read_to_string(log).unwrap_or_default()
}

#[tokio::test]
async fn test_run_prints_start_then_end() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("log");
    let runner = runner_for(json!({
        "games": { "mc": { "run": { "commands": [append(&log, "start"), append(&log, "end")] } } }
    }));

    let result = runner.run("mc").await.unwrap();

    assert!(result.is_success());
    assert_eq!(read(&log), "start\nend\n");
}

#[tokio::test]
async fn test_failed_commit_never_pushes() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("log");
    let runner = runner_for(json!({
        "games": { "mc": { "backup": {
            "cloudCommitCommands": ["false"],
            "cloudPushCommands": [append(&log, "pushed")]
        } } }
    }));

    let report = runner
        .backup("mc", &[BackupPhase::Commit, BackupPhase::Push])
        .await
        .unwrap();

    let failure = report.failure().expect("commit should fail");
    assert_eq!(failure.stage, Stage::Backup(BackupPhase::Commit));
    assert_eq!(failure.status, ExecutionStatus::Failed(1));
    assert!(!read(&log).contains("pushed"));
}

#[tokio::test]
async fn test_backup_commands_see_game_variables() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("log");
    let save = dir.path().join("saves");
    std::fs::create_dir(&save).unwrap();
    let runner = runner_for(json!({
        "cloudNameTemplate": "cloud-$GAME",
        "games": { "mc": {
            "saveLocation": save,
            "backup": {
                "cloudInitCommands": [format!("echo \"$GAME $NAME\" >> '{}'", log.display())],
                "cloudCommitCommands": [format!("test -d \"$SAVE\" && echo saved >> '{}'", log.display())]
            }
        } }
    }));

    let report = runner
        .backup("mc", &BackupPhase::ALL)
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(report.completed_phases(), BackupPhase::ALL.to_vec());
    assert_eq!(read(&log), "mc cloud-mc\nsaved\n");
}

#[tokio::test]
async fn test_missing_profile_interpreter_is_reported() {
    let runner = runner_for(json!({
        "games": { "mc": {
            "shell": "/nonexistent/shell",
            "run": { "commands": ["true"] }
        } }
    }));

    let err = runner
        .play("mc", true)
        .await
        .unwrap()
        .into_result()
        .unwrap_err();

    match err {
        OrchestratorError::StageFailed(result) => {
            assert_eq!(result.stage, Stage::Run);
            assert!(matches!(result.status, ExecutionStatus::InterpreterError(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
