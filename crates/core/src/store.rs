use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{ConfigDocument, GameEntry};
use crate::domain::{BackupCommands, GameProfile, Interpreter};
use crate::error::{CoreError, Result};

/// Read-only set of game profiles, keyed by name.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    profiles: BTreeMap<String, GameProfile>,
    default_interpreter: Interpreter,
    source: Option<PathBuf>,
}

impl ProfileStore {
    /// A store with no games, as used when no configuration file is installed.
    pub fn empty(default_interpreter: Interpreter) -> Self {
        Self {
            profiles: BTreeMap::new(),
            default_interpreter,
            source: None,
        }
    }

    /// Parses a JSON configuration document.
    ///
    /// `fallback` is the interpreter used when neither the document nor a profile names one.
    /// Any malformed profile fails the whole load.
    pub fn load(source: &str, fallback: Interpreter) -> Result<Self> {
        let document: ConfigDocument = serde_json::from_str(source)
            .map_err(|e| CoreError::ConfigInvalid(e.to_string()))?;
        Self::from_document(document, fallback)
    }

    pub fn load_path(path: &Path, fallback: Interpreter) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::ConfigInvalid(format!("could not read {}: {}", path.display(), e))
        })?;
        let document: ConfigDocument = serde_json::from_str(&content).map_err(|e| {
            CoreError::ConfigInvalid(format!("could not parse {}: {}", path.display(), e))
        })?;

        let mut store = Self::from_document(document, fallback)?;
        store.source = Some(path.to_path_buf());
        debug!(path = %path.display(), games = store.len(), "Configuration loaded");
        Ok(store)
    }

    pub fn from_document(document: ConfigDocument, fallback: Interpreter) -> Result<Self> {
        let default_interpreter = match document.shell.as_deref() {
            Some(shell) if !shell.trim().is_empty() => Interpreter::new(shell.trim()),
            _ => fallback,
        };

        let mut profiles = BTreeMap::new();
        for (name, entry) in &document.games {
            validate_name(name)?;
            let profile = build_profile(name, entry, &document, &default_interpreter);
            profiles.insert(name.clone(), profile);
        }

        Ok(Self {
            profiles,
            default_interpreter,
            source: None,
        })
    }

    pub fn get(&self, name: &str) -> Result<&GameProfile> {
        self.profiles
            .get(name)
            .ok_or_else(|| CoreError::ProfileNotFound(name.to_string()))
    }

    /// The game whose root or save location is `dir`.
    pub fn find_by_dir(&self, dir: &Path) -> Option<&GameProfile> {
        self.profiles.values().find(|p| p.manages_dir(dir))
    }

    /// Game names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &GameProfile> {
        self.profiles.values()
    }

    pub fn default_interpreter(&self) -> &Interpreter {
        &self.default_interpreter
    }

    /// Path the store was loaded from, if it came from disk.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CoreError::ConfigInvalid(
            "game names must not be empty".to_string(),
        ));
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || c == '/' || c == '\\')
    {
        return Err(CoreError::ConfigInvalid(format!(
            "invalid game name {name:?}: names must not contain whitespace or path separators"
        )));
    }
    Ok(())
}

fn build_profile(
    name: &str,
    entry: &GameEntry,
    document: &ConfigDocument,
    default_interpreter: &Interpreter,
) -> GameProfile {
    let interpreter = match entry.shell.as_deref() {
        Some(shell) if !shell.trim().is_empty() => Interpreter::new(shell.trim()),
        _ => default_interpreter.clone(),
    };

    GameProfile::new(name, interpreter)
        .with_cloud_name(document.cloud_name(name))
        .with_paths(
            entry.root.clone(),
            entry.save_location.clone(),
            entry.executable.clone(),
        )
        .with_run_commands(
            entry
                .run
                .as_ref()
                .unwrap_or(&document.run)
                .commands
                .clone(),
        )
        .with_shared_run_commands(document.run.commands.clone())
        .with_backup(BackupCommands {
            init_commands: entry.backup.cloud_init_commands.clone(),
            commit_commands: entry.backup.cloud_commit_commands.clone(),
            push_commands: entry.backup.cloud_push_commands.clone(),
        })
}
