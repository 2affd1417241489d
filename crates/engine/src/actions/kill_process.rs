// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kill-process action

use crate::actions::ActionError;
use crate::context::ExecutionContext;
use forge_core::{expand_variables, StepResult};
use forge_procedure::KillProcessAction;
use sysinfo::{Pid, Signal, System};

pub(crate) fn execute(
    action: &KillProcessAction,
    ctx: &mut ExecutionContext,
) -> Result<StepResult, ActionError> {
    let system = System::new_all();
    let mut result = StepResult::new();

    let targets: Vec<Pid> = if let Some(pid_text) = &action.pid {
        let pid_text = expand_variables(pid_text, &ctx.results)?;
        let pid = parse_pid(&pid_text)?;
        if system.process(pid).is_none() {
            if action.error_on_find_failure {
                return Err(ActionError::ProcessNotFound(pid_text));
            }
            tracing::warn!(pid = %pid_text, "process not found, skipping");
            return Ok(result);
        }
        vec![pid]
    } else if let Some(name) = &action.name {
        let name = expand_variables(name, &ctx.results)?;
        let found: Vec<Pid> = system
            .processes_by_exact_name(&name)
            .map(|p| p.pid())
            .collect();
        if found.is_empty() {
            if action.error_on_find_failure {
                return Err(ActionError::NoProcessMatch(name));
            }
            tracing::warn!(%name, "no matching processes, skipping");
            return Ok(result);
        }
        found
    } else {
        // validation requires one of pid/name
        return Ok(result);
    };

    for pid in targets {
        let delivered = system
            .process(pid)
            .and_then(|p| p.kill_with(Signal::Term))
            .unwrap_or(false);
        if delivered {
            let line = format!("terminated process {pid}");
            ctx.stdout.write_line(&line);
            result.stdout.push_str(&line);
            result.stdout.push('\n');
        } else if action.error_on_kill_failure {
            return Err(ActionError::KillFailed {
                pid: pid.as_u32(),
            });
        } else {
            tracing::warn!(%pid, "failed to signal process");
        }
    }
    Ok(result)
}

pub(crate) fn parse_pid(text: &str) -> Result<Pid, ActionError> {
    match text.trim().parse::<u32>() {
        Ok(pid) if pid > 0 => Ok(Pid::from_u32(pid)),
        _ => Err(ActionError::InvalidPid(text.to_string())),
    }
}

#[cfg(test)]
#[path = "kill_process_tests.rs"]
mod tests;
