// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Create-file action

use crate::actions::ActionError;
use crate::context::ExecutionContext;
use forge_core::{expand_variables, resolve_path, StepResult};
use forge_procedure::CreateFileAction;

pub(crate) fn execute(
    action: &CreateFileAction,
    ctx: &mut ExecutionContext,
) -> Result<StepResult, ActionError> {
    let path = expand_variables(&action.path, &ctx.results)?;
    let path = resolve_path(&path, &ctx.workdir)?;
    if ctx.fs.exists(&path) && !action.overwrite {
        return Err(ActionError::AlreadyExists(path));
    }
    let contents = expand_variables(&action.contents, &ctx.results)?;
    ctx.fs.write(&path, contents.as_bytes())?;
    if let Some(mode) = action.mode {
        ctx.fs.set_mode(&path, mode.0)?;
    }
    tracing::debug!(path = %path.display(), "created file");
    Ok(StepResult::new())
}

#[cfg(test)]
#[path = "create_file_tests.rs"]
mod tests;
