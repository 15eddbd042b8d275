//! Local save snapshots: compressed archives kept under `<root>/gg-saves`.
//!
//! A snapshot of `mc` is stored as `mc-IDX[-DESC].tar.zst`, with IDX zero-padded
//! to three digits. Restoring a snapshot first snapshots the current save.

use goodgame_core::GameProfile;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{OrchestratorError, Result};

pub const SNAPSHOT_DIR: &str = "gg-saves";
pub const SNAPSHOT_EXTENSION: &str = ".tar.zst";
/// Description of the snapshot taken right before a restore overwrites the save.
pub const SAFETY_DESCRIPTION: &str = "pre-restore";

const COMPRESSION_LEVEL: i32 = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    name: String,
    path: PathBuf,
}

impl Snapshot {
    fn at(path: PathBuf) -> Option<Self> {
        let name = path
            .file_name()?
            .to_str()?
            .strip_suffix(SNAPSHOT_EXTENSION)?
            .to_string();
        Some(Self { name, path })
    }

    /// Snapshot name without the archive extension, as accepted by `gg restore`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOutcome {
    /// Snapshot of the save as it was before the restore. `None` when there was no save yet.
    pub safety: Option<Snapshot>,
    pub restored: Snapshot,
}

/// Snapshots of one game.
pub struct SnapshotStore<'a> {
    profile: &'a GameProfile,
    dir: PathBuf,
}

impl<'a> SnapshotStore<'a> {
    pub fn for_profile(profile: &'a GameProfile) -> Result<Self> {
        let root = profile
            .root()
            .ok_or_else(|| OrchestratorError::missing_path(profile.name(), "root"))?;
        Ok(Self {
            profile,
            dir: root.join(SNAPSHOT_DIR),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Existing snapshots, sorted by name.
    pub fn list(&self) -> Result<Vec<Snapshot>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(OrchestratorError::io(
                    format!("Could not read {}", self.dir.display()),
                    e,
                ))
            }
        };

        let mut snapshots: Vec<Snapshot> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| Snapshot::at(entry.path()))
            .collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(snapshots)
    }

    /// Looks a snapshot up by name, with or without the archive extension.
    pub fn find(&self, name: &str) -> Result<Snapshot> {
        let wanted = name.strip_suffix(SNAPSHOT_EXTENSION).unwrap_or(name);
        self.list()?
            .into_iter()
            .find(|snapshot| snapshot.name == wanted)
            .ok_or_else(|| OrchestratorError::SnapshotNotFound {
                game: self.profile.name().to_string(),
                name: name.to_string(),
            })
    }

    /// Archives the save location into a new snapshot.
    pub fn create(&self, description: Option<&str>) -> Result<Snapshot> {
        let save = self.save_location()?;
        if let Some(description) = description {
            validate_description(description)?;
        }

        let is_dir = fs::metadata(save)
            .map_err(|e| {
                OrchestratorError::io(format!("Could not read save location {}", save.display()), e)
            })?
            .is_dir();

        fs::create_dir_all(&self.dir).map_err(|e| {
            OrchestratorError::io(
                format!("Could not create backups location {}", self.dir.display()),
                e,
            )
        })?;

        let (path, file) = self.create_archive_file(description)?;
        debug!(game = %self.profile.name(), path = %path.display(), "Writing snapshot");
        if let Err(e) = write_archive(file, save, is_dir) {
            let _ = fs::remove_file(&path);
            return Err(OrchestratorError::io(
                format!("Could not create backup {}", path.display()),
                e,
            ));
        }

        let snapshot = Snapshot::at(path.clone()).ok_or_else(|| {
            OrchestratorError::io(
                format!("Could not create backup {}", path.display()),
                io::Error::new(io::ErrorKind::InvalidData, "backup name is not valid UTF-8"),
            )
        })?;
        info!(game = %self.profile.name(), snapshot = %snapshot.name, "Snapshot created");
        Ok(snapshot)
    }

    /// Replaces the save location with the content of snapshot `name`.
    ///
    /// The current save is snapshotted first, so a restore can always be undone.
    pub fn restore(&self, name: &str) -> Result<RestoreOutcome> {
        let save = self.save_location()?;
        let restored = self.find(name)?;

        let exists = save.try_exists().map_err(|e| {
            OrchestratorError::io(format!("Could not read save location {}", save.display()), e)
        })?;
        let safety = if exists {
            Some(self.create(Some(SAFETY_DESCRIPTION))?)
        } else {
            None
        };

        let parent = match save.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| {
            OrchestratorError::io(format!("Could not create {}", parent.display()), e)
        })?;
        let staging = tempfile::Builder::new()
            .prefix(".gg-restore-")
            .tempdir_in(parent)
            .map_err(|e| {
                OrchestratorError::io(format!("Could not stage restore in {}", parent.display()), e)
            })?;

        unpack(restored.path(), staging.path()).map_err(|e| {
            OrchestratorError::io(
                format!("Could not unpack backup {}", restored.path().display()),
                e,
            )
        })?;
        replace_save(save, staging.path()).map_err(|e| {
            OrchestratorError::io(format!("Could not restore {}", save.display()), e)
        })?;

        info!(
            game = %self.profile.name(),
            snapshot = %restored.name,
            safety = ?safety.as_ref().map(Snapshot::name),
            "Snapshot restored"
        );
        Ok(RestoreOutcome { safety, restored })
    }

    /// The save location, refusing one that holds the snapshots themselves.
    fn save_location(&self) -> Result<&'a Path> {
        let save = self
            .profile
            .save_location()
            .ok_or_else(|| OrchestratorError::missing_path(self.profile.name(), "save location"))?;

        let canonical = |path: &Path| path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let backups = self
            .dir
            .parent()
            .map_or_else(|| self.dir.clone(), |root| canonical(root).join(SNAPSHOT_DIR));
        if backups.starts_with(canonical(save)) {
            return Err(OrchestratorError::io(
                format!("Could not use save location {}", save.display()),
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("it contains the backups location {}", self.dir.display()),
                ),
            ));
        }
        Ok(save)
    }

    /// Creates the next free `GAME-IDX[-DESC].tar.zst`, never overwriting an existing file.
    fn create_archive_file(&self, description: Option<&str>) -> Result<(PathBuf, File)> {
        let read_err =
            |e| OrchestratorError::io(format!("Could not read {}", self.dir.display()), e);
        let mut index = fs::read_dir(&self.dir).map_err(read_err)?.count();

        loop {
            let name = match description {
                Some(description) => format!("{}-{:03}-{}", self.profile.name(), index, description),
                None => format!("{}-{:03}", self.profile.name(), index),
            };
            let path = self.dir.join(format!("{}{}", name, SNAPSHOT_EXTENSION));

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => index += 1,
                Err(e) => {
                    return Err(OrchestratorError::io(
                        format!("Could not create backup {}", path.display()),
                        e,
                    ))
                }
            }
        }
    }
}

fn validate_description(description: &str) -> Result<()> {
    if description.trim().is_empty() || description.contains(['/', '\\']) {
        return Err(OrchestratorError::InvalidDescription(description.to_string()));
    }
    Ok(())
}

fn write_archive(file: File, save: &Path, is_dir: bool) -> io::Result<()> {
    let encoder = zstd::Encoder::new(file, COMPRESSION_LEVEL)?;
    let mut builder = tar::Builder::new(encoder);

    if is_dir {
        builder.append_dir_all(".", save)?;
    } else {
        let name = save.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "save location has no file name")
        })?;
        builder.append_path_with_name(save, name)?;
    }

    builder.into_inner()?.finish()?;
    Ok(())
}

fn unpack(archive: &Path, into: &Path) -> io::Result<()> {
    let decoder = zstd::Decoder::new(File::open(archive)?)?;
    tar::Archive::new(decoder).unpack(into)
}

/// Moves the unpacked snapshot in `staged` over `save`.
///
/// A snapshot holding a single file named like a file save location restores that
/// file; anything else replaces the content of the save directory.
fn replace_save(save: &Path, staged: &Path) -> io::Result<()> {
    let entries = fs::read_dir(staged)?.collect::<io::Result<Vec<_>>>()?;
    let current = match fs::metadata(save) {
        Ok(metadata) => Some(metadata.is_dir()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    if let [entry] = entries.as_slice() {
        let same_name = save.file_name() == Some(entry.file_name().as_os_str());
        if same_name && entry.file_type()?.is_file() && current != Some(true) {
            return fs::rename(entry.path(), save);
        }
    }

    match current {
        Some(true) => clear_dir(save)?,
        Some(false) => {
            fs::remove_file(save)?;
            fs::create_dir(save)?;
        }
        None => fs::create_dir_all(save)?,
    }
    for entry in entries {
        fs::rename(entry.path(), save.join(entry.file_name()))?;
    }
    Ok(())
}

fn clear_dir(dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}
