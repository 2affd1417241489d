// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine driver: the ordered-rollback state machine
//!
//! Phase 1 validates every step (nothing executes on failure). Phase 2
//! runs steps in document order, templating each one just before it
//! executes. Phase 3 walks cleanups in reverse of successful execution;
//! a failing cleanup is recorded and the walk continues. Phase 4 reports
//! the results record together with the original execution error.

use crate::actions;
use crate::context::ExecutionContext;
use crate::error::RunError;
use crate::template::template_step;
use crate::validate::{check_requirements, validate_steps};
use forge_core::{ResultsRecord, StepResult};
use forge_procedure::{Procedure, Step};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of a run that got past validation.
#[derive(Debug)]
pub struct RunReport {
    /// Per-step results in execution order, cleanup slots populated.
    pub results: ResultsRecord,
    /// The original execution (or templating) error, if any.
    pub error: Option<RunError>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Run a procedure to completion, including its cleanup walk.
///
/// Returns `Err` only for aborts where nothing has executed (failed
/// requirements, validation, or an unenterable working directory);
/// otherwise the report carries the results record and the original
/// error, with cleanups already walked.
pub async fn run_procedure(
    procedure: &Procedure,
    ctx: &mut ExecutionContext,
) -> Result<RunReport, RunError> {
    tracing::info!(procedure = %procedure.name, "starting procedure");
    check_requirements(&procedure.requirements)?;
    ctx.proc_env = procedure.env.clone();

    let mut steps = procedure.steps.clone();
    validate_steps(&mut steps, ctx)?;
    if ctx.dry_run {
        tracing::info!(procedure = %procedure.name, "dry run: validation passed");
        return Ok(RunReport {
            results: ResultsRecord::new(),
            error: None,
        });
    }

    let _guard = WorkdirGuard::enter(&procedure.working_dir).map_err(|source| {
        RunError::Workdir {
            path: procedure.working_dir.clone(),
            source,
        }
    })?;

    let (completed, error) = execute_steps(&mut steps, ctx).await;

    if ctx.no_cleanup {
        tracing::info!("cleanup disabled, skipping the cleanup walk");
    } else {
        if ctx.cleanup_delay > Duration::ZERO {
            tracing::info!(delay = ?ctx.cleanup_delay, "delaying cleanup");
            tokio::time::sleep(ctx.cleanup_delay).await;
        }
        for index in (0..completed).rev() {
            cleanup_step(&mut steps, index, ctx).await;
        }
    }

    match &error {
        None => tracing::info!(procedure = %procedure.name, "procedure completed"),
        Some(err) => {
            tracing::error!(procedure = %procedure.name, error = %err, "procedure failed")
        }
    }
    Ok(RunReport {
        results: ctx.results.clone(),
        error,
    })
}

/// Phase 2: template and execute steps in order.
///
/// Returns the count of successful steps and the error that stopped the
/// run, if any. A failed step whose action demands cleanup-on-failure
/// (sub-procedures) has its own cleanup invoked here, before the caller
/// begins the general walk over the successful prefix.
pub(crate) async fn execute_steps(
    steps: &mut [Step],
    ctx: &mut ExecutionContext,
) -> (usize, Option<RunError>) {
    for index in 0..steps.len() {
        let name = steps[index].name.clone();

        if let Err(source) = template_step(&mut steps[index], ctx) {
            tracing::error!(step = %name, error = %source, "templating failed");
            return (index, Some(RunError::Template { step: name, source }));
        }

        tracing::info!(step = %name, kind = steps[index].action.kind(), "executing step");
        let outcome = {
            let step = &mut steps[index];
            actions::execute_action(&mut step.action, None, ctx).await
        };
        match outcome {
            Ok(result) => {
                ctx.results.record(name, result);
                ctx.step_vars.clear();
            }
            Err(source) => {
                tracing::error!(step = %name, error = %source, "step failed");
                if steps[index].action.should_cleanup_on_failure() {
                    tracing::info!(step = %name, "rolling back the failed step first");
                    cleanup_step(steps, index, ctx).await;
                }
                return (index, Some(RunError::Execution { step: name, source }));
            }
        }
    }
    (steps.len(), None)
}

/// Invoke one step's resolved cleanup.
///
/// Failures are recorded on the step's result and logged; they never
/// stop the walk or mask the run's original error.
pub(crate) async fn cleanup_step(steps: &mut [Step], index: usize, ctx: &mut ExecutionContext) {
    let Some(step) = steps.get_mut(index) else {
        return;
    };
    let Some(mut cleanup) = step.cleanup_action.take() else {
        return;
    };
    let name = step.name.clone();
    tracing::info!(step = %name, kind = cleanup.kind(), "running cleanup");

    let outcome = actions::execute_action(&mut cleanup, Some(&mut step.action), ctx).await;
    step.cleanup_action = Some(cleanup);
    match outcome {
        Ok(result) => ctx.results.set_cleanup(index, result),
        Err(err) => {
            tracing::warn!(step = %name, error = %err, "cleanup failed, continuing walk");
            ctx.results.set_cleanup(
                index,
                StepResult {
                    stderr: format!("cleanup failed: {err}\n"),
                    ..StepResult::default()
                },
            );
        }
    }
}

/// Scoped process-wide working directory change, restored on drop.
pub(crate) struct WorkdirGuard {
    original: PathBuf,
}

impl WorkdirGuard {
    pub(crate) fn enter(dir: &Path) -> io::Result<Self> {
        let original = std::env::current_dir()?;
        std::env::set_current_dir(dir)?;
        Ok(Self { original })
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        if let Err(err) = std::env::set_current_dir(&self.original) {
            tracing::warn!(%err, "failed to restore working directory");
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
