// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Copy-path action

use crate::actions::ActionError;
use crate::context::ExecutionContext;
use forge_core::{expand_variables, resolve_path, FileSystem, StepResult};
use forge_procedure::CopyPathAction;
use std::path::Path;

pub(crate) fn execute(
    action: &CopyPathAction,
    ctx: &mut ExecutionContext,
) -> Result<StepResult, ActionError> {
    let source = expand_variables(&action.source, &ctx.results)?;
    let source = resolve_path(&source, &ctx.workdir)?;
    let destination = expand_variables(&action.destination, &ctx.results)?;
    let destination = resolve_path(&destination, &ctx.workdir)?;

    if !ctx.fs.exists(&source) {
        return Err(ActionError::SourceMissing(source));
    }
    if ctx.fs.is_dir(&source) && !action.recursive {
        return Err(ActionError::DirectoryNeedsRecursive(source));
    }
    if ctx.fs.exists(&destination) && !action.overwrite {
        return Err(ActionError::AlreadyExists(destination));
    }

    if ctx.fs.is_dir(&source) {
        copy_tree(ctx.fs.as_ref(), &source, &destination)?;
    } else {
        let bytes = ctx.fs.read(&source)?;
        ctx.fs.write(&destination, &bytes)?;
    }
    if let Some(mode) = action.mode {
        ctx.fs.set_mode(&destination, mode.0)?;
    }
    tracing::debug!(
        source = %source.display(),
        destination = %destination.display(),
        "copied path"
    );
    Ok(StepResult::new())
}

fn copy_tree(fs: &dyn FileSystem, source: &Path, destination: &Path) -> Result<(), ActionError> {
    fs.create_dir_all(destination)?;
    for child in fs.read_dir(source)? {
        let Some(file_name) = child.file_name() else {
            continue;
        };
        let target = destination.join(file_name);
        if fs.is_dir(&child) {
            copy_tree(fs, &child, &target)?;
        } else {
            let bytes = fs.read(&child)?;
            fs.write(&target, &bytes)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "copy_path_tests.rs"]
mod tests;
