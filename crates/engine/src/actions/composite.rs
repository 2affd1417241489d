// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generated composite action: a sequence of cleanup-capable actions

use crate::actions::{execute_action, ActionError};
use crate::context::ExecutionContext;
use forge_core::StepResult;
use forge_procedure::CompositeAction;

/// Children run in order; the first failure aborts the rest.
pub(crate) async fn execute(
    action: &mut CompositeAction,
    ctx: &mut ExecutionContext,
) -> Result<StepResult, ActionError> {
    let mut combined = StepResult::new();
    for child in &mut action.actions {
        let result = execute_action(child, None, ctx).await?;
        combined.stdout.push_str(&result.stdout);
        combined.stderr.push_str(&result.stderr);
        combined.outputs.extend(result.outputs);
    }
    Ok(combined)
}

#[cfg(test)]
#[path = "composite_tests.rs"]
mod tests;
