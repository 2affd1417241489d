// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change-directory action and its generated rollback
//!
//! Execute records the prior working directory under
//! `outputs.previous_dir`; the rollback reads it back from the results
//! record by step index, so no back-reference to the action instance is
//! needed.

use crate::actions::ActionError;
use crate::context::ExecutionContext;
use forge_core::{expand_variables, resolve_path, StepResult};
use forge_procedure::{ChangeDirAction, RestoreDirAction};
use serde_json::Value;
use std::path::PathBuf;

pub(crate) const PREVIOUS_DIR_OUTPUT: &str = "previous_dir";

pub(crate) fn execute(
    action: &ChangeDirAction,
    ctx: &mut ExecutionContext,
) -> Result<StepResult, ActionError> {
    let directory = expand_variables(&action.directory, &ctx.results)?;
    let directory = resolve_path(&directory, &ctx.workdir)?;
    if !ctx.fs.is_dir(&directory) {
        return Err(ActionError::NoSuchDirectory(directory));
    }

    let mut result = StepResult::new();
    result.insert_output(
        PREVIOUS_DIR_OUTPUT,
        Value::String(ctx.workdir.display().to_string()),
    );
    tracing::debug!(from = %ctx.workdir.display(), to = %directory.display(), "cd");
    ctx.workdir = directory;
    Ok(result)
}

pub(crate) fn restore(
    action: &RestoreDirAction,
    ctx: &mut ExecutionContext,
) -> Result<StepResult, ActionError> {
    let previous = ctx
        .results
        .get(action.step_index)
        .and_then(|r| r.outputs.get(PREVIOUS_DIR_OUTPUT))
        .and_then(Value::as_str)
        .ok_or(ActionError::NoPreviousDir(action.step_index))?;
    tracing::debug!(to = previous, "restoring working directory");
    ctx.workdir = PathBuf::from(previous);
    Ok(StepResult::new())
}

#[cfg(test)]
#[path = "change_dir_tests.rs"]
mod tests;
