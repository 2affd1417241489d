// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path resolution for action fields and sub-procedure lookup

use crate::fs::FileSystem;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,
    #[error("cannot resolve ~: no home directory for this user")]
    NoHome,
    #[error("not found in search paths: {name} (searched {searched:?})")]
    NotFound { name: String, searched: Vec<PathBuf> },
}

/// Resolve a user-supplied path against a working directory.
///
/// Rules, in order: `~/` expands to the user's home directory; absolute
/// paths pass through; anything else joins `workdir`. The result is
/// lexically normalized so it never requires the target to exist.
pub fn resolve_path(input: &str, workdir: &Path) -> Result<PathBuf, PathError> {
    if input.is_empty() {
        return Err(PathError::Empty);
    }
    if let Some(rest) = input.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or(PathError::NoHome)?;
        return Ok(normalize(&home.join(rest)));
    }
    let path = Path::new(input);
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    Ok(normalize(&workdir.join(path)))
}

/// Fold `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Look a relative name up across an ordered list of base directories.
///
/// Returns the first base whose join exists in the file-system view. On a
/// case-insensitive host the name is lower-cased before comparison.
pub fn find_in_search_paths(
    name: &str,
    bases: &[PathBuf],
    fs: &dyn FileSystem,
) -> Result<PathBuf, PathError> {
    if name.is_empty() {
        return Err(PathError::Empty);
    }
    let name = if cfg!(any(windows, target_os = "macos")) {
        name.to_lowercase()
    } else {
        name.to_string()
    };
    for base in bases {
        let candidate = normalize(&base.join(&name));
        if fs.exists(&candidate) {
            return Ok(candidate);
        }
    }
    Err(PathError::NotFound {
        name,
        searched: bases.to_vec(),
    })
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
