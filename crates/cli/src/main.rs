use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use goodgame_core::{BackupPhase, Interpreter, ProfileStore, DEFAULT_CONFIG_PATH};
use orchestrator::{BackupReport, OrchestratorError, SessionRunner, Snapshot};
use shell::ProcessExecutor;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gg")]
#[command(about = "Run games and back up their saves", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file [default: /etc/goodgame/config.json]
    #[arg(long, global = true, env = "GG_CONFIG")]
    config: Option<PathBuf>,

    /// Log more (-v for info, -vv for debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the selected game, then commits and pushes its saves.
    ///
    /// If no game name is provided, the game whose root or save location is the
    /// current directory is used.
    #[command(alias = "r")]
    Run {
        /// Name of the game to run.
        game: Option<String>,
        /// Skip backing up the saves when the game exits.
        #[arg(short, long = "skip-cloud")]
        skip_cloud: bool,
    },
    /// Backs up the saves of the selected game.
    ///
    /// When the game has a root and a save location, the save is first archived
    /// into "<root>/gg-saves" as "GAME-IDX", or "GAME-IDX-DESCRIPTION" when a
    /// description is given. Without phase flags the full init, commit, push
    /// cloud lifecycle runs afterwards.
    #[command(alias = "b", alias = "bk")]
    Backup {
        /// Name of the game to back up.
        game: Option<String>,
        /// Description appended to the local backup name.
        #[arg(short, long)]
        desc: Option<String>,
        /// Only write the local backup.
        #[arg(short, long = "skip-cloud")]
        skip_cloud: bool,
        #[arg(long)]
        init: bool,
        #[arg(long)]
        commit: bool,
        #[arg(long)]
        push: bool,
    },
    /// Restores a local save backup, then commits and pushes it.
    ///
    /// A backup of the current save is created first. Without a backup name the
    /// available backups are listed.
    Restore {
        /// Name of the game to restore the save backup.
        game: String,
        /// Name of the backup to restore.
        backup: Option<String>,
        /// Skip committing and pushing the restored save.
        #[arg(short, long = "skip-cloud")]
        skip_cloud: bool,
    },
    /// Lists all managed games.
    #[command(alias = "l", alias = "ls")]
    List,
    /// Opens the root directory of the game.
    #[command(alias = "o")]
    Open {
        /// Name of the game to open.
        game: Option<String>,
        /// Open the save directory instead of the root.
        #[arg(short, long)]
        save: bool,
    },
    /// Prints the resolved configuration.
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            let code = err
                .downcast_ref::<OrchestratorError>()
                .map_or(1, OrchestratorError::exit_code);
            ExitCode::from(code.clamp(1, 255) as u8)
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let store = load_store(cli.config.as_deref(), Path::new(DEFAULT_CONFIG_PATH))?;
    let runner = SessionRunner::new(store, Arc::new(ProcessExecutor::new()));

    match cli.command {
        Commands::Run { game, skip_cloud } => run(&runner, game, skip_cloud).await,
        Commands::Backup {
            game,
            desc,
            skip_cloud,
            init,
            commit,
            push,
        } => {
            let phases = (!skip_cloud).then(|| requested_phases(init, commit, push));
            backup(&runner, game, desc, phases).await
        }
        Commands::Restore {
            game,
            backup,
            skip_cloud,
        } => restore(&runner, &game, backup, skip_cloud).await,
        Commands::List => list(&runner),
        Commands::Open { game, save } => open_dir(&runner, game, save),
        Commands::Config => print_config(&runner),
    }
}

/// Loads `config`, or `default_path` when none was given. A missing default
/// configuration means no games; one that cannot be checked is an error.
fn load_store(config: Option<&Path>, default_path: &Path) -> Result<ProfileStore> {
    let fallback = Interpreter::resolve(None, std::env::var("SHELL").ok().as_deref());

    let path = match config {
        Some(path) => path,
        None => {
            let installed = default_path
                .try_exists()
                .with_context(|| format!("Failed to read {}", default_path.display()))?;
            if !installed {
                tracing::debug!(path = %default_path.display(), "No configuration installed");
                return Ok(ProfileStore::empty(fallback));
            }
            default_path
        }
    };

    ProfileStore::load_path(path, fallback).context("Failed to load configuration")
}

fn requested_phases(init: bool, commit: bool, push: bool) -> Vec<BackupPhase> {
    let flags = [
        (init, BackupPhase::Init),
        (commit, BackupPhase::Commit),
        (push, BackupPhase::Push),
    ];
    let phases: Vec<BackupPhase> = flags
        .into_iter()
        .filter(|(requested, _)| *requested)
        .map(|(_, phase)| phase)
        .collect();

    if phases.is_empty() {
        BackupPhase::ALL.to_vec()
    } else {
        phases
    }
}

fn resolve_name(runner: &SessionRunner, game: Option<String>) -> Result<String> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    Ok(runner.resolve(game.as_deref(), &cwd)?.name().to_string())
}

async fn run(runner: &SessionRunner, game: Option<String>, skip_cloud: bool) -> Result<()> {
    let name = resolve_name(runner, game)?;
    let report = runner.play(&name, !skip_cloud).await?;

    if let Some(backup) = report.backup.as_ref().filter(|b| b.is_success()) {
        print_backup_summary(backup);
    }
    report.into_result()?;
    Ok(())
}

/// Writes the local snapshot when the game has somewhere to keep it, then runs
/// the cloud `phases` unless they are `None`.
async fn backup(
    runner: &SessionRunner,
    game: Option<String>,
    desc: Option<String>,
    phases: Option<Vec<BackupPhase>>,
) -> Result<()> {
    let name = resolve_name(runner, game)?;
    let profile = runner.store().get(&name)?;

    let local = desc.is_some() || (profile.root().is_some() && profile.save_location().is_some());
    if local {
        let snapshot = runner.snapshot(&name, desc.as_deref())?;
        print_snapshot(&snapshot);
    }

    match phases {
        Some(phases) => {
            let report = runner.backup(&name, &phases).await?.into_result()?;
            print_backup_summary(&report);
        }
        None if !local => eprintln!(
            "{} Nothing to back up: {} has no save location and cloud saving was skipped",
            "!".yellow(),
            name.bold()
        ),
        None => {}
    }
    Ok(())
}

async fn restore(
    runner: &SessionRunner,
    game: &str,
    backup: Option<String>,
    skip_cloud: bool,
) -> Result<()> {
    let Some(backup) = backup else {
        let snapshots = runner.snapshots(game)?;
        if snapshots.is_empty() {
            println!("No backups for {}.", game);
        }
        for snapshot in snapshots {
            println!("{}", snapshot.name());
        }
        return Ok(());
    };

    let report = runner.restore(game, &backup, !skip_cloud).await?;
    match &report.restore.safety {
        Some(safety) => eprintln!(
            "{} Restored {} (previous save kept as {})",
            "✓".green(),
            report.restore.restored.name().bold(),
            safety.name()
        ),
        None => eprintln!(
            "{} Restored {}",
            "✓".green(),
            report.restore.restored.name().bold()
        ),
    }

    let report = report.into_result()?;
    if let Some(backup) = &report.backup {
        print_backup_summary(backup);
    }
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot) {
    eprintln!(
        "{} Saved {} ({})",
        "✓".green(),
        snapshot.name().bold(),
        snapshot.path().display()
    );
}

fn print_backup_summary(report: &BackupReport) {
    let phases: Vec<&str> = report
        .completed_phases()
        .iter()
        .map(BackupPhase::as_str)
        .collect();
    eprintln!(
        "{} Backed up {} ({})",
        "✓".green(),
        report.game().bold(),
        phases.join(", ")
    );
}

fn list(runner: &SessionRunner) -> Result<()> {
    let store = runner.store();
    if store.is_empty() {
        println!("No games configured.");
        return Ok(());
    }

    for profile in store.profiles() {
        match profile.root() {
            Some(root) => println!("{}\t{}", profile.name(), root.display()),
            None => println!("{}", profile.name()),
        }
    }
    Ok(())
}

fn open_dir(runner: &SessionRunner, game: Option<String>, save: bool) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let profile = runner.resolve(game.as_deref(), &cwd)?;

    let (dir, what) = if save {
        (profile.save_location(), "save location")
    } else {
        (profile.root(), "root")
    };
    let dir = dir.with_context(|| format!("The game {:?} has no {} configured", profile.name(), what))?;

    open::that(dir).with_context(|| format!("Failed to open {}", dir.display()))?;
    Ok(())
}

fn print_config(runner: &SessionRunner) -> Result<()> {
    let store = runner.store();

    match store.source() {
        Some(path) => println!("Config:      {}", path.display()),
        None => println!("Config:      {} (not installed)", DEFAULT_CONFIG_PATH),
    }

    let interpreter = store.default_interpreter();
    match which::which(interpreter.as_str()) {
        Ok(path) => println!("Interpreter: {} ({})", interpreter, path.display()),
        Err(_) => println!("Interpreter: {} ({})", interpreter, "not found".red()),
    }
    println!();

    let profiles: Vec<_> = store.profiles().collect();
    println!("{}", serde_json::to_string_pretty(&profiles)?);
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let default_filter =
        format!("gg={level},orchestrator={level},shell={level},goodgame_core={level}");

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}
