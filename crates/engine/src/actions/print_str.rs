// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Print-string action

use crate::actions::ActionError;
use crate::context::ExecutionContext;
use forge_core::{expand_variables, StepResult};
use forge_procedure::PrintStrAction;

pub(crate) fn execute(
    action: &PrintStrAction,
    ctx: &mut ExecutionContext,
) -> Result<StepResult, ActionError> {
    let message = expand_variables(&action.message, &ctx.results)?;
    for line in message.lines() {
        ctx.stdout.write_line(line);
    }
    Ok(StepResult::with_stdout(format!("{message}\n")))
}

#[cfg(test)]
#[path = "print_str_tests.rs"]
mod tests;
