use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use super::phase::{BackupPhase, Stage};

/// The command processor a command string is handed to, invoked as `<interpreter> -c <command>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Interpreter(String);

impl Interpreter {
    /// Used when neither the configuration nor `$SHELL` name an interpreter.
    pub const FALLBACK: &'static str = "sh";

    pub fn new(program: impl Into<String>) -> Self {
        Self(program.into())
    }

    /// Picks the first non-empty candidate among the configured value and the
    /// environment's shell, falling back to `sh`.
    pub fn resolve(configured: Option<&str>, env_shell: Option<&str>) -> Self {
        configured
            .into_iter()
            .chain(env_shell)
            .map(str::trim)
            .find(|candidate| !candidate.is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Self::FALLBACK)
    }
}

impl fmt::Display for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupCommands {
    pub init_commands: Vec<String>,
    pub commit_commands: Vec<String>,
    pub push_commands: Vec<String>,
}

impl BackupCommands {
    pub fn for_phase(&self, phase: BackupPhase) -> &[String] {
        match phase {
            BackupPhase::Init => &self.init_commands,
            BackupPhase::Commit => &self.commit_commands,
            BackupPhase::Push => &self.push_commands,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.init_commands.is_empty()
            && self.commit_commands.is_empty()
            && self.push_commands.is_empty()
    }
}

/// Per-game configuration bundle, validated once at load time and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameProfile {
    name: String,
    interpreter: Interpreter,
    cloud_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    save_location: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    executable: Option<PathBuf>,
    run_commands: Vec<String>,
    /// Document-wide run commands, exported as `$RUN`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    shared_run_commands: Vec<String>,
    backup: BackupCommands,
}

impl GameProfile {
    pub fn new(name: impl Into<String>, interpreter: Interpreter) -> Self {
        let name = name.into();
        Self {
            cloud_name: name.clone(),
            name,
            interpreter,
            root: None,
            save_location: None,
            executable: None,
            run_commands: Vec::new(),
            shared_run_commands: Vec::new(),
            backup: BackupCommands::default(),
        }
    }

    pub fn with_run_commands(mut self, commands: Vec<String>) -> Self {
        self.run_commands = commands;
        self
    }

    pub fn with_shared_run_commands(mut self, commands: Vec<String>) -> Self {
        self.shared_run_commands = commands;
        self
    }

    pub fn with_backup(mut self, backup: BackupCommands) -> Self {
        self.backup = backup;
        self
    }

    pub fn with_cloud_name(mut self, cloud_name: impl Into<String>) -> Self {
        self.cloud_name = cloud_name.into();
        self
    }

    pub fn with_paths(
        mut self,
        root: Option<PathBuf>,
        save_location: Option<PathBuf>,
        executable: Option<PathBuf>,
    ) -> Self {
        self.root = root;
        self.save_location = save_location;
        self.executable = executable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn cloud_name(&self) -> &str {
        &self.cloud_name
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn save_location(&self) -> Option<&Path> {
        self.save_location.as_deref()
    }

    pub fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }

    pub fn run_commands(&self) -> &[String] {
        &self.run_commands
    }

    pub fn backup(&self) -> &BackupCommands {
        &self.backup
    }

    pub fn commands_for(&self, stage: Stage) -> &[String] {
        match stage {
            Stage::Run => &self.run_commands,
            Stage::Backup(phase) => self.backup.for_phase(phase),
        }
    }

    /// Whether `dir` is this game's root or save location.
    ///
    /// Both sides are canonicalized, so symlinked and relative paths match the
    /// directory they point to. Paths that cannot be resolved are compared as written.
    pub fn manages_dir(&self, dir: &Path) -> bool {
        let dir = canonical(dir);
        [&self.root, &self.save_location]
            .into_iter()
            .flatten()
            .any(|path| canonical(path) == dir)
    }

    /// Variables exported to every command run for this game.
    pub fn environment(&self) -> Vec<(String, String)> {
        let mut env = vec![
            ("GAME".to_string(), self.name.clone()),
            ("NAME".to_string(), self.cloud_name.clone()),
        ];
        let paths = [
            ("ROOT", &self.root),
            ("SAVE", &self.save_location),
            ("EXE", &self.executable),
        ];
        for (key, path) in paths {
            if let Some(path) = path {
                env.push((key.to_string(), path.display().to_string()));
            }
        }
        if !self.shared_run_commands.is_empty() {
            env.push(("RUN".to_string(), self.shared_run_commands.join(" && ")));
        }
        env
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpreter_resolution_order() {
        assert_eq!(
            Interpreter::resolve(Some("bash"), Some("/bin/zsh")).as_str(),
            "bash"
        );
        assert_eq!(
            Interpreter::resolve(None, Some("/bin/zsh")).as_str(),
            "/bin/zsh"
        );
        assert_eq!(Interpreter::resolve(Some("  "), None).as_str(), "sh");
        assert_eq!(Interpreter::resolve(None, Some("")).as_str(), "sh");
    }

    #[test]
    fn test_commands_for_stage() {
        let profile = GameProfile::new("mc", Interpreter::default())
            .with_run_commands(vec!["echo start".into()])
            .with_backup(BackupCommands {
                init_commands: vec!["git init".into()],
                commit_commands: vec!["git add -A".into(), "git commit -m save".into()],
                push_commands: vec![],
            });

        assert_eq!(profile.commands_for(Stage::Run), ["echo start"]);
        assert_eq!(
            profile.commands_for(BackupPhase::Commit.into()).len(),
            2
        );
        assert!(profile.commands_for(BackupPhase::Push.into()).is_empty());
        assert!(!profile.backup().is_empty());
    }

    #[test]
    fn test_environment_includes_optional_paths() {
        let profile = GameProfile::new("mc", Interpreter::default()).with_cloud_name("gg-mc");
        assert_eq!(
            profile.environment(),
            vec![
                ("GAME".to_string(), "mc".to_string()),
                ("NAME".to_string(), "gg-mc".to_string()),
            ]
        );

        let profile = profile.with_paths(
            Some(PathBuf::from("/games/mc")),
            Some(PathBuf::from("/games/mc/saves")),
            None,
        );
        let env = profile.environment();
        assert!(env.contains(&("ROOT".to_string(), "/games/mc".to_string())));
        assert!(env.contains(&("SAVE".to_string(), "/games/mc/saves".to_string())));
        assert!(!env.iter().any(|(key, _)| key == "EXE"));
    }

    #[test]
    fn test_shared_run_commands_are_exported_as_one_chain() {
        let profile = GameProfile::new("mc", Interpreter::default())
            .with_shared_run_commands(vec!["cd \"$ROOT\"".into(), "./launch".into()]);
        assert!(profile
            .environment()
            .contains(&("RUN".to_string(), "cd \"$ROOT\" && ./launch".to_string())));
    }

    #[cfg(unix)]
    #[test]
    fn test_manages_dir_through_symlink() {
        let dir = tempfile::TempDir::new().unwrap();
        let real = dir.path().join("real");
        let link = dir.path().join("link");
        std::fs::create_dir(&real).unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let profile = GameProfile::new("mc", Interpreter::default()).with_paths(
            Some(link.clone()),
            None,
            None,
        );
        assert!(profile.manages_dir(&real));
        assert!(profile.manages_dir(&link));
        assert!(!profile.manages_dir(dir.path()));
    }

    #[test]
    fn test_manages_dir() {
        let profile = GameProfile::new("mc", Interpreter::default()).with_paths(
            Some(PathBuf::from("/games/mc")),
            Some(PathBuf::from("/saves/mc")),
            None,
        );
        assert!(profile.manages_dir(Path::new("/games/mc")));
        assert!(profile.manages_dir(Path::new("/saves/mc")));
        assert!(!profile.manages_dir(Path::new("/games")));
    }
}
