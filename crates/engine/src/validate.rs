// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Phase 1 validation and cleanup resolution
//!
//! Validates every step before anything executes, loads and recursively
//! validates sub-procedures, and installs each step's resolved cleanup
//! action (`cleanup: default` expanded against the main action;
//! sub-procedure steps always get their generated rollback unless the
//! document supplies an explicit cleanup).

use crate::actions::kill_process;
use crate::context::ExecutionContext;
use crate::error::ValidationError;
use forge_core::find_in_search_paths;
use forge_exec::Interpreter;
use forge_procedure::{
    load_file, Action, CleanupSpec, CompositeAction, Edit, Requirements, Step,
    SubProcedureAction,
};
use regex::Regex;
use std::collections::HashMap;

/// Validate all steps of a procedure and resolve their cleanups.
pub fn validate_steps(
    steps: &mut [Step],
    ctx: &ExecutionContext,
) -> Result<(), ValidationError> {
    for (index, step) in steps.iter_mut().enumerate() {
        let name = step.name.clone();
        validate_action(&mut step.action, &name, ctx)?;
        resolve_cleanup(step, index, ctx)?;
    }
    Ok(())
}

/// Check the procedure's host preconditions.
pub(crate) fn check_requirements(requirements: &Requirements) -> Result<(), ValidationError> {
    if !requirements.platforms.is_empty()
        && !requirements
            .platforms
            .iter()
            .any(|p| p == std::env::consts::OS)
    {
        return Err(ValidationError::UnsupportedPlatform {
            os: std::env::consts::OS,
        });
    }
    if requirements.superuser && !is_superuser() {
        return Err(ValidationError::NeedsSuperuser);
    }
    Ok(())
}

#[cfg(unix)]
fn is_superuser() -> bool {
    nix::unistd::Uid::effective().is_root()
}

#[cfg(not(unix))]
fn is_superuser() -> bool {
    false
}

fn resolve_cleanup(
    step: &mut Step,
    index: usize,
    ctx: &ExecutionContext,
) -> Result<(), ValidationError> {
    let resolved = match &step.cleanup {
        CleanupSpec::Unspecified => {
            // Sub-procedure steps always install their generated rollback.
            if matches!(step.action, Action::SubProcedure(_)) {
                step.action.default_cleanup(index)
            } else {
                None
            }
        }
        CleanupSpec::Default => Some(step.action.default_cleanup(index).ok_or_else(|| {
            ValidationError::NoDefaultCleanup {
                step: step.name.clone(),
                kind: step.action.kind(),
            }
        })?),
        CleanupSpec::Explicit(action) => {
            let mut action = (**action).clone();
            if matches!(action, Action::SubProcedure(_)) {
                return Err(ValidationError::Invalid {
                    step: step.name.clone(),
                    message: "a sub-procedure cannot be used as a cleanup".to_string(),
                });
            }
            validate_action(&mut action, &step.name, ctx)?;
            Some(action)
        }
        CleanupSpec::List(actions) => {
            let mut children = Vec::with_capacity(actions.len());
            for action in actions {
                if !action.usable_inside_composite() {
                    return Err(ValidationError::NotComposable {
                        step: step.name.clone(),
                        kind: action.kind(),
                    });
                }
                let mut action = action.clone();
                validate_action(&mut action, &step.name, ctx)?;
                children.push(action);
            }
            Some(Action::Composite(CompositeAction { actions: children }))
        }
    };
    step.cleanup_action = resolved;
    Ok(())
}

fn validate_action(
    action: &mut Action,
    step: &str,
    ctx: &ExecutionContext,
) -> Result<(), ValidationError> {
    match action {
        Action::Basic(a) => {
            non_empty(&a.inline, "inline", step)?;
            let interpreter = parse_executor(a.executor.as_deref(), step)?;
            executor_on_path(interpreter, step)?;
            for spec in &a.outputs {
                match &spec.filter {
                    forge_procedure::OutputFilter::Regex(pattern) => {
                        compile_pattern(pattern, step)?;
                    }
                    forge_procedure::OutputFilter::JsonPath(path) => {
                        non_empty(path, "json_path", step)?;
                    }
                }
            }
        }
        Action::CreateFile(a) => non_empty(&a.path, "create_file", step)?,
        Action::RemovePath(a) => non_empty(&a.path, "remove_path", step)?,
        Action::CopyPath(a) => {
            non_empty(&a.source, "copy_path", step)?;
            non_empty(&a.destination, "to", step)?;
        }
        Action::EditFile(a) => {
            non_empty(&a.target, "edit_file", step)?;
            if a.edits.is_empty() {
                return Err(ValidationError::Invalid {
                    step: step.to_string(),
                    message: "edit_file requires at least one edit".to_string(),
                });
            }
            for edit in &a.edits {
                validate_edit(edit, step)?;
            }
        }
        Action::FetchUri(a) => {
            non_empty(&a.uri, "fetch_uri", step)?;
            non_empty(&a.location, "location", step)?;
            if let Some(proxy) = &a.proxy {
                validate_proxy(proxy, step)?;
            }
            if !has_runtime_ref(&a.location) && !a.overwrite {
                if let Ok(destination) = forge_core::resolve_path(&a.location, &ctx.workdir) {
                    if ctx.fs.exists(&destination) {
                        return Err(ValidationError::DestinationExists {
                            step: step.to_string(),
                            path: destination,
                        });
                    }
                }
            }
        }
        Action::PrintStr(a) => non_empty(&a.message, "print_str", step)?,
        Action::ChangeDir(a) => non_empty(&a.directory, "cd", step)?,
        Action::KillProcess(a) => {
            if a.pid.is_none() && a.name.is_none() {
                return Err(ValidationError::Invalid {
                    step: step.to_string(),
                    message: "kill_process requires a process id or name".to_string(),
                });
            }
            if let Some(pid) = &a.pid {
                if !has_runtime_ref(pid) && kill_process::parse_pid(pid).is_err() {
                    return Err(ValidationError::Invalid {
                        step: step.to_string(),
                        message: format!("kill_process_id must be a positive integer: {pid}"),
                    });
                }
            }
        }
        Action::Expect(a) => {
            non_empty(&a.inline, "expect.inline", step)?;
            parse_executor(a.executor.as_deref(), step)?;
        }
        Action::SubProcedure(a) => validate_sub(a, step, ctx)?,
        Action::Composite(a) => {
            for child in &mut a.actions {
                if !child.usable_inside_composite() {
                    return Err(ValidationError::NotComposable {
                        step: step.to_string(),
                        kind: child.kind(),
                    });
                }
                validate_action(child, step, ctx)?;
            }
        }
        Action::RestoreDir(_) | Action::SubCleanup(_) => {}
    }
    Ok(())
}

fn validate_sub(
    action: &mut SubProcedureAction,
    step: &str,
    ctx: &ExecutionContext,
) -> Result<(), ValidationError> {
    non_empty(&action.ttp, "ttp", step)?;

    let mut bases = vec![ctx.workdir.clone()];
    bases.extend(ctx.search_paths.iter().cloned());
    let path = find_in_search_paths(&action.ttp, &bases, ctx.fs.as_ref()).map_err(|err| {
        ValidationError::Invalid {
            step: step.to_string(),
            message: format!("cannot resolve sub-procedure {}: {err}", action.ttp),
        }
    })?;

    let supplied: HashMap<String, String> = action
        .args
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let (mut child, _args) =
        load_file(&path, ctx.fs.as_ref(), &supplied).map_err(|source| {
            ValidationError::SubLoad {
                step: step.to_string(),
                reference: action.ttp.clone(),
                source: Box::new(source),
            }
        })?;

    if child.has_sub_procedures() {
        return Err(ValidationError::NestedSubProcedure {
            step: step.to_string(),
        });
    }
    check_requirements(&child.requirements)?;

    let child_ctx = ctx.child(child.working_dir.clone(), indexmap::IndexMap::new());
    validate_steps(&mut child.steps, &child_ctx)?;

    action.resolved_path = Some(path);
    action.child = Some(Box::new(child));
    Ok(())
}

fn validate_edit(edit: &Edit, step: &str) -> Result<(), ValidationError> {
    let invalid = |message: String| ValidationError::Invalid {
        step: step.to_string(),
        message,
    };
    if let Some(_text) = &edit.append {
        if edit.old.is_some() || edit.new.is_some() || edit.delete.is_some() || edit.regexp {
            return Err(invalid(
                "append cannot be combined with old, new, delete, or regexp".to_string(),
            ));
        }
        return Ok(());
    }
    if let Some(delete) = &edit.delete {
        if edit.old.is_some() || edit.new.is_some() {
            return Err(invalid("delete cannot be combined with old or new".to_string()));
        }
        if edit.regexp {
            compile_pattern(delete, step)?;
        }
        return Ok(());
    }
    match (&edit.old, &edit.new) {
        (Some(old), Some(_new)) => {
            if edit.regexp {
                compile_pattern(old, step)?;
            }
            Ok(())
        }
        _ => Err(invalid(
            "an edit must be a replace (old+new), an append, or a delete".to_string(),
        )),
    }
}

fn validate_proxy(proxy: &str, step: &str) -> Result<(), ValidationError> {
    if has_runtime_ref(proxy) {
        return Ok(());
    }
    let invalid = |message: String| ValidationError::Invalid {
        step: step.to_string(),
        message,
    };
    let parsed = url::Url::parse(proxy)
        .map_err(|err| invalid(format!("invalid proxy {proxy}: {err}")))?;
    if parsed.scheme().is_empty() || parsed.host_str().is_none() {
        return Err(invalid(format!(
            "proxy must carry a scheme and host: {proxy}"
        )));
    }
    Ok(())
}

fn parse_executor(token: Option<&str>, step: &str) -> Result<Interpreter, ValidationError> {
    match token {
        None => Ok(Interpreter::default()),
        Some(token) => token.parse().map_err(|err: forge_exec::UnknownExecutor| {
            ValidationError::Invalid {
                step: step.to_string(),
                message: err.to_string(),
            }
        }),
    }
}

fn executor_on_path(interpreter: Interpreter, step: &str) -> Result<(), ValidationError> {
    if let Some(program) = interpreter.program() {
        which::which(program).map_err(|_| ValidationError::ExecutorNotFound {
            step: step.to_string(),
            executor: program.to_string(),
        })?;
    }
    Ok(())
}

fn compile_pattern(pattern: &str, step: &str) -> Result<(), ValidationError> {
    Regex::new(pattern).map_err(|source| ValidationError::BadPattern {
        step: step.to_string(),
        pattern: pattern.to_string(),
        source,
    })?;
    Ok(())
}

fn non_empty(value: &str, field: &'static str, step: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyField {
            step: step.to_string(),
            field,
        });
    }
    Ok(())
}

/// Fields carrying runtime `$forge.steps.*` references cannot be checked
/// statically; their checks re-run at execute time after expansion.
fn has_runtime_ref(text: &str) -> bool {
    text.contains("$forge.")
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
