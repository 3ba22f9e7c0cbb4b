use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;
use notify::EventKind;
use notify::event::{ModifyKind, RenameMode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("file already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid vault path: {0:?}")]
    InvalidPath(String),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// File-tree change notification, with vault-relative paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    Created { path: String },
    Modified { path: String },
    Deleted { path: String },
    Renamed { new_path: String, old_path: String },
}

/// Storage the people extension reads from and writes to.
///
/// Paths are vault-relative and use `/` as the separator.
pub trait Vault: Send + Sync {
    /// Every file currently in the vault.
    fn all_files(&self) -> Result<Vec<String>, VaultError>;

    /// Every folder currently in the vault.
    fn all_folders(&self) -> Result<Vec<String>, VaultError>;

    fn read_binary(&self, path: &str) -> Result<Vec<u8>, VaultError>;

    /// Write a new file. Fails if something already exists at `path`.
    fn create_binary(&self, path: &str, data: &[u8]) -> Result<(), VaultError>;

    /// Existing file at `path`, if any.
    fn resolve(&self, path: &str) -> Option<PathBuf>;
}

/// Vault backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn absolute(&self, path: &str) -> Result<PathBuf, VaultError> {
        let relative = Path::new(path);
        let valid = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !valid {
            return Err(VaultError::InvalidPath(path.to_string()));
        }

        Ok(self.root.join(relative))
    }

    fn walk(&self, want_dirs: bool) -> Vec<String> {
        WalkBuilder::new(&self.root)
            .hidden(false)
            .build()
            .flatten()
            .filter_map(|entry| {
                let metadata = entry.metadata().ok()?;
                if metadata.is_dir() != want_dirs {
                    return None;
                }
                vault_relative(&self.root, entry.path())
            })
            .filter(|path| !path.is_empty())
            .collect()
    }
}

impl Vault for FsVault {
    fn all_files(&self) -> Result<Vec<String>, VaultError> {
        if !self.root.is_dir() {
            return Err(VaultError::NotFound(self.root.display().to_string()));
        }
        Ok(self.walk(false))
    }

    fn all_folders(&self) -> Result<Vec<String>, VaultError> {
        if !self.root.is_dir() {
            return Err(VaultError::NotFound(self.root.display().to_string()));
        }
        Ok(self.walk(true))
    }

    fn read_binary(&self, path: &str) -> Result<Vec<u8>, VaultError> {
        let abs = self.absolute(path)?;
        std::fs::read(&abs).map_err(|source| match source.kind() {
            ErrorKind::NotFound => VaultError::NotFound(path.to_string()),
            _ => VaultError::Io {
                path: path.to_string(),
                source,
            },
        })
    }

    fn create_binary(&self, path: &str, data: &[u8]) -> Result<(), VaultError> {
        let abs = self.absolute(path)?;
        let io_err = |source: std::io::Error| VaultError::Io {
            path: path.to_string(),
            source,
        };

        if let Some(parent) = abs.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&abs)
            .map_err(|source| match source.kind() {
                ErrorKind::AlreadyExists => VaultError::AlreadyExists(path.to_string()),
                _ => io_err(source),
            })?;

        file.write_all(data).map_err(io_err)?;
        file.flush().map_err(io_err)
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let abs = self.absolute(path).ok()?;
        abs.is_file().then_some(abs)
    }
}

/// `abs` expressed relative to `root` with `/` separators, if it lies inside.
pub fn vault_relative(root: &Path, abs: &Path) -> Option<String> {
    let relative = abs.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

/// Files below `dir`, relative to it. Empty unless `dir` is a directory.
fn files_below(dir: &Path) -> Vec<String> {
    if !dir.is_dir() {
        return Vec::new();
    }

    WalkBuilder::new(dir)
        .hidden(false)
        .build()
        .flatten()
        .filter(|entry| entry.file_type().is_some_and(|kind| kind.is_file()))
        .filter_map(|entry| vault_relative(dir, entry.path()))
        .filter(|path| !path.is_empty())
        .collect()
}

/// `Created` for the file at `abs`, or for every file below it when a whole
/// folder appeared.
fn created_at(abs: &Path, path: String) -> Vec<VaultEvent> {
    if !abs.is_dir() {
        return vec![VaultEvent::Created { path }];
    }

    files_below(abs)
        .into_iter()
        .map(|rel| VaultEvent::Created {
            path: format!("{path}/{rel}"),
        })
        .collect()
}

/// `Renamed` for the file now at `to`, or one per file when a folder moved.
fn renamed_at(to: &Path, new_path: String, old_path: String) -> Vec<VaultEvent> {
    if !to.is_dir() {
        return vec![VaultEvent::Renamed { new_path, old_path }];
    }

    files_below(to)
        .into_iter()
        .map(|rel| VaultEvent::Renamed {
            new_path: format!("{new_path}/{rel}"),
            old_path: format!("{old_path}/{rel}"),
        })
        .collect()
}

/// Translate a watcher event into vault events. Paths outside `root` are dropped.
///
/// Folder creates and renames expand into one event per contained file, since
/// the watcher reports only the folder itself.
pub fn vault_events_from_notify(root: &Path, event: &notify::Event) -> Vec<VaultEvent> {
    let relative = |path: &PathBuf| vault_relative(root, path).filter(|p| !p.is_empty());

    match event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            match (event.paths.first(), event.paths.get(1)) {
                (Some(from), Some(to)) => match (relative(from), relative(to)) {
                    (Some(old_path), Some(new_path)) => renamed_at(to, new_path, old_path),
                    (Some(path), None) => vec![VaultEvent::Deleted { path }],
                    (None, Some(path)) => created_at(to, path),
                    (None, None) => Vec::new(),
                },
                _ => Vec::new(),
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) | EventKind::Create(_) => event
            .paths
            .iter()
            .filter_map(|abs| relative(abs).map(|path| created_at(abs, path)))
            .flatten()
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) | EventKind::Remove(_) => event
            .paths
            .iter()
            .filter_map(relative)
            .map(|path| VaultEvent::Deleted { path })
            .collect(),
        EventKind::Modify(_) => event
            .paths
            .iter()
            .filter_map(relative)
            .map(|path| VaultEvent::Modified { path })
            .collect(),
        _ => Vec::new(),
    }
}
