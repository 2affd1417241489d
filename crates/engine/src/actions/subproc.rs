// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sub-procedure action and its generated rollback
//!
//! Execute runs the child procedure's steps in a fresh context that
//! inherits sinks and file-system view from the parent, then retains the
//! executed prefix on the action. The generated cleanup walks that
//! prefix in reverse, which is how a failed sub-procedure still rolls
//! back its successful child steps before the parent's earlier steps.

use crate::actions::ActionError;
use crate::context::ExecutionContext;
use crate::runner::{cleanup_step, execute_steps, WorkdirGuard};
use forge_core::{expand_variables, StepResult};
use forge_procedure::{Action, ChildRun, SubProcedureAction};
use std::collections::HashMap;

pub(crate) async fn execute(
    action: &mut SubProcedureAction,
    ctx: &mut ExecutionContext,
) -> Result<StepResult, ActionError> {
    let path = action
        .resolved_path
        .clone()
        .ok_or(ActionError::ChildNotLoaded)?;

    // Reload with the expanded arg values: references to parent step
    // outputs have their runtime values only now.
    let mut supplied = HashMap::with_capacity(action.args.len());
    for (key, value) in &action.args {
        supplied.insert(key.clone(), expand_variables(value, &ctx.results)?);
    }
    let (mut child, resolved) =
        forge_procedure::load_file(&path, ctx.fs.as_ref(), &supplied).map_err(|source| {
            ActionError::Sub {
                name: action.ttp.clone(),
                source: Box::new(crate::error::RunError::Parse(source)),
            }
        })?;

    if child.has_sub_procedures() {
        return Err(ActionError::Sub {
            name: child.name.clone(),
            source: Box::new(crate::error::RunError::Validation(
                crate::error::ValidationError::NestedSubProcedure {
                    step: action.ttp.clone(),
                },
            )),
        });
    }

    let mut child_ctx = ctx.child(child.working_dir.clone(), resolved);
    child_ctx.proc_env = child.env.clone();
    crate::validate::validate_steps(&mut child.steps, &child_ctx).map_err(|source| {
        ActionError::Sub {
            name: child.name.clone(),
            source: Box::new(crate::error::RunError::Validation(source)),
        }
    })?;
    let mut steps = child.steps.clone();

    tracing::info!(procedure = %child.name, "entering sub-procedure");
    let guard = WorkdirGuard::enter(&child.working_dir).map_err(|source| {
        ActionError::Workdir {
            path: child.working_dir.clone(),
            source,
        }
    })?;
    let (completed, error) = execute_steps(&mut steps, &mut child_ctx).await;
    drop(guard);

    // Child stdout/stderr concatenate in step order into the parent's
    // view of this step.
    let mut aggregate = StepResult::new();
    for entry in child_ctx.results.iter() {
        aggregate.stdout.push_str(&entry.stdout);
        aggregate.stderr.push_str(&entry.stderr);
    }

    action.child_run = Some(ChildRun {
        steps,
        results: child_ctx.results.clone(),
        working_dir: child.working_dir.clone(),
        completed,
    });

    match error {
        None => Ok(aggregate),
        Some(source) => Err(ActionError::Sub {
            name: child.name.clone(),
            source: Box::new(source),
        }),
    }
}

/// The generated sub-procedure cleanup: walk the recorded child steps in
/// reverse and invoke each one's cleanup.
pub(crate) async fn cleanup(
    main: &mut Action,
    ctx: &mut ExecutionContext,
) -> Result<StepResult, ActionError> {
    let Action::SubProcedure(sub) = main else {
        return Err(ActionError::NoChildRun);
    };
    let Some(mut run) = sub.child_run.take() else {
        return Err(ActionError::NoChildRun);
    };

    let mut child_ctx = ctx.child(run.working_dir.clone(), Default::default());
    child_ctx.results = run.results;

    let guard = WorkdirGuard::enter(&run.working_dir).map_err(|source| {
        ActionError::Workdir {
            path: run.working_dir.clone(),
            source,
        }
    })?;
    for index in (0..run.completed).rev() {
        cleanup_step(&mut run.steps, index, &mut child_ctx).await;
    }
    drop(guard);

    // Aggregate cleanup output in walk order.
    let mut aggregate = StepResult::new();
    for index in (0..run.completed).rev() {
        if let Some(cleanup) = child_ctx.results.get(index).and_then(|e| e.cleanup.as_deref()) {
            aggregate.stdout.push_str(&cleanup.stdout);
            aggregate.stderr.push_str(&cleanup.stderr);
        }
    }

    run.results = child_ctx.results;
    sub.child_run = Some(run);
    Ok(aggregate)
}
