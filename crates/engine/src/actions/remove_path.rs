// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remove-path action

use crate::actions::ActionError;
use crate::context::ExecutionContext;
use forge_core::{expand_variables, resolve_path, StepResult};
use forge_procedure::RemovePathAction;

pub(crate) fn execute(
    action: &RemovePathAction,
    ctx: &mut ExecutionContext,
) -> Result<StepResult, ActionError> {
    let path = expand_variables(&action.path, &ctx.results)?;
    let path = resolve_path(&path, &ctx.workdir)?;
    if !ctx.fs.exists(&path) {
        return Err(ActionError::SourceMissing(path));
    }
    if ctx.fs.is_dir(&path) {
        // Conservative rm semantics: directories need an explicit opt-in.
        if !action.recursive {
            return Err(ActionError::DirectoryNeedsRecursive(path));
        }
        ctx.fs.remove_dir_all(&path)?;
    } else {
        ctx.fs.remove_file(&path)?;
    }
    tracing::debug!(path = %path.display(), "removed path");
    Ok(StepResult::new())
}

#[cfg(test)]
#[path = "remove_path_tests.rs"]
mod tests;
