// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell (inline) action

use crate::actions::ActionError;
use crate::context::ExecutionContext;
use forge_core::{expand_variables, StepResult};
use forge_exec::{Interpreter, ProcessRunner};
use forge_procedure::{BasicAction, OutputFilter, OutputSpec};
use regex::Regex;
use serde_json::Value;

pub(crate) async fn execute(
    action: &BasicAction,
    ctx: &mut ExecutionContext,
) -> Result<StepResult, ActionError> {
    let inline = expand_variables(&action.inline, &ctx.results)?;
    let interpreter: Interpreter = match &action.executor {
        Some(token) => token.parse()?,
        None => Interpreter::default(),
    };

    // Procedure env under step env, step values expanded.
    let mut env = ctx.proc_env.clone();
    for (key, value) in &action.env {
        env.insert(key.clone(), expand_variables(value, &ctx.results)?);
    }

    let output = ProcessRunner::new(interpreter)
        .inline(inline.clone())
        .envs(env)
        .cwd(ctx.workdir.clone())
        .timeout(ctx.exec_timeout)
        .sinks(ctx.stdout.clone(), ctx.stderr.clone())
        .errexit_hint(has_set_directive(&inline))
        .run()
        .await?;

    let mut result = StepResult {
        stdout: output.stdout,
        stderr: output.stderr,
        ..StepResult::default()
    };
    for spec in &action.outputs {
        let value = extract(spec, &result.stdout)?;
        result.insert_output(spec.name.clone(), value);
    }
    Ok(result)
}

/// An explicit `set` directive in the script counts as the author's own
/// error-handling choice; the runner then skips its injected `-e`.
fn has_set_directive(script: &str) -> bool {
    script
        .lines()
        .any(|line| line.trim_start().starts_with("set "))
}

fn extract(spec: &OutputSpec, stdout: &str) -> Result<Value, ActionError> {
    match &spec.filter {
        OutputFilter::Regex(pattern) => {
            let re = Regex::new(pattern).map_err(|source| ActionError::OutputSpecRegex {
                name: spec.name.clone(),
                source,
            })?;
            let caps = re.captures(stdout).ok_or_else(|| ActionError::OutputSpecMiss {
                name: spec.name.clone(),
            })?;
            let matched = caps
                .get(1)
                .or_else(|| caps.get(0))
                .ok_or_else(|| ActionError::OutputSpecMiss {
                    name: spec.name.clone(),
                })?;
            Ok(Value::String(matched.as_str().to_string()))
        }
        OutputFilter::JsonPath(path) => {
            let parsed: Value =
                serde_json::from_str(stdout.trim()).map_err(|source| ActionError::OutputNotJson {
                    name: spec.name.clone(),
                    source,
                })?;
            let mut value = &parsed;
            for key in path.split('.') {
                value = value.get(key).ok_or_else(|| ActionError::OutputSpecMiss {
                    name: spec.name.clone(),
                })?;
            }
            Ok(value.clone())
        }
    }
}

#[cfg(test)]
#[path = "basic_tests.rs"]
mod tests;
