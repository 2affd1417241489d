// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Edit-file action

use crate::actions::ActionError;
use crate::context::ExecutionContext;
use forge_core::{expand_variables, resolve_path, StepResult};
use forge_procedure::{Edit, EditFileAction};
use regex::Regex;

pub(crate) fn execute(
    action: &EditFileAction,
    ctx: &mut ExecutionContext,
) -> Result<StepResult, ActionError> {
    let target_text = expand_variables(&action.target, &ctx.results)?;
    let target = resolve_path(&target_text, &ctx.workdir)?;
    let original = ctx.fs.read(&target)?;
    let mut buffer = String::from_utf8_lossy(&original).into_owned();

    if let Some(backup) = &action.backup {
        let backup = expand_variables(backup, &ctx.results)?;
        let backup = resolve_path(&backup, &ctx.workdir)?;
        ctx.fs.write(&backup, &original)?;
    }

    for (i, edit) in action.edits.iter().enumerate() {
        buffer = apply_edit(edit, buffer, i + 1, &target_text, ctx)?;
    }

    ctx.fs.write(&target, buffer.as_bytes())?;
    Ok(StepResult::new())
}

/// Edits apply sequentially; replace and delete must match the *current*
/// buffer, not the original file.
fn apply_edit(
    edit: &Edit,
    buffer: String,
    number: usize,
    target: &str,
    ctx: &ExecutionContext,
) -> Result<String, ActionError> {
    if let Some(text) = &edit.append {
        let text = expand_variables(text, &ctx.results)?;
        let mut buffer = buffer;
        buffer.push('\n');
        buffer.push_str(&text);
        return Ok(buffer);
    }

    let (pattern, replacement) = match (&edit.delete, &edit.old) {
        (Some(delete), _) => (delete.clone(), String::new()),
        (None, Some(old)) => (
            old.clone(),
            expand_variables(edit.new.as_deref().unwrap_or_default(), &ctx.results)?,
        ),
        // validation guarantees one kind per edit
        (None, None) => return Ok(buffer),
    };
    let pattern = expand_variables(&pattern, &ctx.results)?;

    if edit.regexp {
        let re = Regex::new(&pattern).map_err(|source| ActionError::EditRegex { number, source })?;
        if !re.is_match(&buffer) {
            return Err(not_found(&pattern, number, target));
        }
        Ok(re.replace_all(&buffer, replacement.as_str()).into_owned())
    } else {
        if !buffer.contains(&pattern) {
            return Err(not_found(&pattern, number, target));
        }
        Ok(buffer.replace(&pattern, &replacement))
    }
}

fn not_found(pattern: &str, number: usize, target: &str) -> ActionError {
    ActionError::EditPatternNotFound {
        pattern: pattern.to_string(),
        number,
        target: target.to_string(),
    }
}

#[cfg(test)]
#[path = "edit_file_tests.rs"]
mod tests;
