// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expect (interactive) action

use crate::actions::ActionError;
use crate::context::ExecutionContext;
use forge_core::{expand_variables, resolve_path, StepResult};
use forge_exec::{ExpectRunner, Interpreter};
use forge_procedure::ExpectAction;
use std::time::Duration;

pub(crate) async fn execute(
    action: &ExpectAction,
    ctx: &mut ExecutionContext,
) -> Result<StepResult, ActionError> {
    let inline = expand_variables(&action.inline, &ctx.results)?;
    let interpreter: Interpreter = match &action.executor {
        Some(token) => token.parse()?,
        None => Interpreter::default(),
    };
    let cwd = match &action.chdir {
        Some(dir) => {
            let dir = expand_variables(dir, &ctx.results)?;
            resolve_path(&dir, &ctx.workdir)?
        }
        None => ctx.workdir.clone(),
    };

    let mut pairs = Vec::with_capacity(action.responses.len());
    for pair in &action.responses {
        pairs.push((
            expand_variables(&pair.prompt, &ctx.results)?,
            expand_variables(&pair.response, &ctx.results)?,
        ));
    }

    let mut runner = ExpectRunner::new(interpreter)
        .inline(inline)
        .responses(pairs)
        .cwd(cwd)
        .sink(ctx.stdout.clone());
    if let Some(seconds) = action.timeout_seconds {
        runner = runner.timeout(Duration::from_secs(seconds));
    }

    let output = runner.run().await?;
    if output.exit_code != 0 {
        return Err(ActionError::ExpectExit {
            exit_code: output.exit_code,
        });
    }
    Ok(StepResult::with_stdout(output.transcript))
}

#[cfg(test)]
#[path = "expect_tests.rs"]
mod tests;
