// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-step field templating
//!
//! Runs exactly once per step, strictly between its Validate and
//! Execute. The snapshot the templates see covers the resolved args,
//! step-local vars, and the outputs of every earlier successful step.

use crate::context::ExecutionContext;
use forge_procedure::{render, Action, Step, TemplateError};
use serde_json::{json, Value};

/// Render every templated field of the step's main and cleanup actions.
pub(crate) fn template_step(step: &mut Step, ctx: &ExecutionContext) -> Result<(), TemplateError> {
    let context = snapshot(ctx);
    template_action(&mut step.action, &context)?;
    if let Some(cleanup) = &mut step.cleanup_action {
        template_action(cleanup, &context)?;
    }
    Ok(())
}

/// Context snapshot: `args`, `stepvars`, and completed step results.
fn snapshot(ctx: &ExecutionContext) -> tera::Context {
    let mut steps = serde_json::Map::new();
    for name in ctx.results.names() {
        if let Some(entry) = ctx.results.get_named(name) {
            steps.insert(
                name.to_string(),
                json!({
                    "outputs": entry.outputs,
                    "stdout": entry.stdout,
                    "stderr": entry.stderr,
                }),
            );
        }
    }
    forge_procedure::build_context(&ctx.args, &ctx.step_vars, &Value::Object(steps))
}

fn template_action(action: &mut Action, context: &tera::Context) -> Result<(), TemplateError> {
    match action {
        Action::Basic(a) => {
            t(&mut a.inline, context)?;
            for value in a.env.values_mut() {
                t(value, context)?;
            }
        }
        Action::CreateFile(a) => {
            t(&mut a.path, context)?;
            t(&mut a.contents, context)?;
        }
        Action::RemovePath(a) => t(&mut a.path, context)?,
        Action::CopyPath(a) => {
            t(&mut a.source, context)?;
            t(&mut a.destination, context)?;
        }
        Action::EditFile(a) => {
            t(&mut a.target, context)?;
            t_opt(&mut a.backup, context)?;
            for edit in &mut a.edits {
                t_opt(&mut edit.old, context)?;
                t_opt(&mut edit.new, context)?;
                t_opt(&mut edit.append, context)?;
                t_opt(&mut edit.delete, context)?;
            }
        }
        Action::FetchUri(a) => {
            t(&mut a.uri, context)?;
            t(&mut a.location, context)?;
            t_opt(&mut a.proxy, context)?;
        }
        Action::PrintStr(a) => t(&mut a.message, context)?,
        Action::ChangeDir(a) => t(&mut a.directory, context)?,
        Action::KillProcess(a) => {
            t_opt(&mut a.pid, context)?;
            t_opt(&mut a.name, context)?;
        }
        Action::Expect(a) => {
            t(&mut a.inline, context)?;
            t_opt(&mut a.chdir, context)?;
            for pair in &mut a.responses {
                t(&mut pair.prompt, context)?;
                t(&mut pair.response, context)?;
            }
        }
        Action::SubProcedure(a) => {
            for value in a.args.values_mut() {
                t(value, context)?;
            }
        }
        Action::Composite(a) => {
            for child in &mut a.actions {
                template_action(child, context)?;
            }
        }
        Action::RestoreDir(_) | Action::SubCleanup(_) => {}
    }
    Ok(())
}

fn t(field: &mut String, context: &tera::Context) -> Result<(), TemplateError> {
    *field = render(field, context)?;
    Ok(())
}

fn t_opt(field: &mut Option<String>, context: &tera::Context) -> Result<(), TemplateError> {
    if let Some(text) = field {
        *text = render(text, context)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
