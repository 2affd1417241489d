// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-system view used by all file-touching actions
//!
//! Actions never call `std::fs` directly; they go through a [`FileSystem`]
//! so a run can be pointed at an in-memory overlay ([`MemFs`]) instead of
//! real disk. The default view is [`RealFs`].

use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("no such path: {0}")]
    NotFound(PathBuf),
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            FsError::NotFound(path.to_path_buf())
        } else {
            FsError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Narrow file-system surface shared by the real disk and test overlays.
pub trait FileSystem: Send + Sync + fmt::Debug {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn read(&self, path: &Path) -> Result<Vec<u8>, FsError>;
    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), FsError>;
    fn create_dir_all(&self, path: &Path) -> Result<(), FsError>;
    fn remove_file(&self, path: &Path) -> Result<(), FsError>;
    fn remove_dir_all(&self, path: &Path) -> Result<(), FsError>;
    /// Direct children of a directory.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FsError>;
    /// Apply permission bits. No-op where the platform has none.
    fn set_mode(&self, path: &Path, mode: u32) -> Result<(), FsError>;
}

/// The host file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FileSystem for RealFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        std::fs::read(path).map_err(|e| FsError::from_io(path, e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), FsError> {
        std::fs::write(path, contents).map_err(|e| FsError::from_io(path, e))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        std::fs::create_dir_all(path).map_err(|e| FsError::from_io(path, e))
    }

    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        std::fs::remove_file(path).map_err(|e| FsError::from_io(path, e))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), FsError> {
        std::fs::remove_dir_all(path).map_err(|e| FsError::from_io(path, e))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FsError> {
        let mut children = Vec::new();
        for entry in std::fs::read_dir(path).map_err(|e| FsError::from_io(path, e))? {
            let entry = entry.map_err(|e| FsError::from_io(path, e))?;
            children.push(entry.path());
        }
        children.sort();
        Ok(children)
    }

    #[cfg(unix)]
    fn set_mode(&self, path: &Path, mode: u32) -> Result<(), FsError> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .map_err(|e| FsError::from_io(path, e))
    }

    #[cfg(not(unix))]
    fn set_mode(&self, _path: &Path, _mode: u32) -> Result<(), FsError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    modes: BTreeMap<PathBuf, u32>,
}

/// In-memory file system for tests and embedded procedure bundles.
#[derive(Debug, Default)]
pub struct MemFs {
    state: Mutex<MemState>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file (creating parent directories), for test setup.
    pub fn seed_file(&self, path: impl Into<PathBuf>, contents: &[u8]) {
        let path = path.into();
        let mut state = self.state.lock();
        record_ancestors(&mut state.dirs, &path);
        state.files.insert(path, contents.to_vec());
    }

    /// Seed an empty directory.
    pub fn seed_dir(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut state = self.state.lock();
        record_ancestors(&mut state.dirs, &path);
        state.dirs.insert(path);
    }

    /// Mode last applied to a path, if any. Test observability only.
    pub fn mode_of(&self, path: &Path) -> Option<u32> {
        self.state.lock().modes.get(path).copied()
    }
}

fn record_ancestors(dirs: &mut BTreeSet<PathBuf>, path: &Path) {
    let mut ancestor = path.parent();
    while let Some(dir) = ancestor {
        if dir.as_os_str().is_empty() {
            break;
        }
        dirs.insert(dir.to_path_buf());
        ancestor = dir.parent();
    }
}

impl FileSystem for MemFs {
    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.state.lock().dirs.contains(path)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        self.state
            .lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), FsError> {
        let mut state = self.state.lock();
        record_ancestors(&mut state.dirs, path);
        state.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        let mut state = self.state.lock();
        record_ancestors(&mut state.dirs, path);
        state.dirs.insert(path.to_path_buf());
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        let mut state = self.state.lock();
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), FsError> {
        let mut state = self.state.lock();
        if !state.dirs.contains(path) {
            return Err(FsError::NotFound(path.to_path_buf()));
        }
        state.files.retain(|p, _| !p.starts_with(path));
        state.dirs.retain(|p| !p.starts_with(path));
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, FsError> {
        let state = self.state.lock();
        if !state.dirs.contains(path) {
            return Err(FsError::NotFound(path.to_path_buf()));
        }
        let mut children: Vec<PathBuf> = state
            .files
            .keys()
            .chain(state.dirs.iter())
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        children.sort();
        children.dedup();
        Ok(children)
    }

    fn set_mode(&self, path: &Path, mode: u32) -> Result<(), FsError> {
        let mut state = self.state.lock();
        if !state.files.contains_key(path) && !state.dirs.contains(path) {
            return Err(FsError::NotFound(path.to_path_buf()));
        }
        state.modes.insert(path.to_path_buf(), mode);
        Ok(())
    }
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
