// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step parsing: one main action, an optional cleanup

use crate::action::{
    Action, BasicAction, ChangeDirAction, CopyPathAction, CreateFileAction, Edit, EditFileAction,
    ExpectAction, ExpectResponse, FetchUriAction, FileMode, KillProcessAction, OutputSpec,
    PrintStrAction, RemovePathAction, SubProcedureAction,
};
use crate::parser::ParseError;
use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Cleanup as written in the document.
#[derive(Debug, Clone, Default)]
pub enum CleanupSpec {
    /// No `cleanup:` key.
    #[default]
    Unspecified,
    /// The literal string `default`: resolved at validate time by asking
    /// the main action for its generated cleanup.
    Default,
    /// One nested step document.
    Explicit(Box<Action>),
    /// A list of nested step documents, executed as a composite.
    List(Vec<Action>),
}

/// A named unit pairing a main action with an optional cleanup.
#[derive(Debug, Clone)]
pub struct Step {
    pub name: String,
    pub action: Action,
    pub cleanup: CleanupSpec,
    /// Resolved cleanup, installed during validation (explicit cleanups
    /// converted, `default` expanded against the main action).
    pub cleanup_action: Option<Action>,
}

impl Step {
    /// Parse one element of the document's `steps:` list. `number` is
    /// the 1-based position, used in error messages.
    pub fn parse(value: &serde_yaml::Value, number: usize) -> Result<Step, ParseError> {
        let raw: RawStep = serde_yaml::from_value(value.clone()).map_err(|err| {
            ParseError::InvalidStep {
                index: number,
                message: err.to_string(),
            }
        })?;

        let name = raw
            .name
            .clone()
            .ok_or(ParseError::MissingStepName { index: number })?;
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(ParseError::InvalidStepName(name));
        }

        let action = build_action(&raw, number)?;
        let cleanup = parse_cleanup(raw.cleanup.as_ref(), &name)?;

        Ok(Step {
            name,
            action,
            cleanup,
            cleanup_action: None,
        })
    }
}

/// Flat view of a step document. Every action's fields live here; which
/// action the step selects is decided by which selecting key is present.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStep {
    name: Option<String>,

    // inline (shell)
    inline: Option<String>,
    executor: Option<String>,
    #[serde(default)]
    env: IndexMap<String, String>,
    #[serde(default)]
    outputs: Vec<OutputSpec>,

    // create_file
    create_file: Option<String>,
    contents: Option<String>,
    #[serde(default)]
    overwrite: bool,
    mode: Option<FileMode>,

    // remove_path
    remove_path: Option<String>,
    #[serde(default)]
    recursive: bool,

    // copy_path
    copy_path: Option<String>,
    to: Option<String>,

    // edit_file
    edit_file: Option<String>,
    #[serde(default)]
    edits: Vec<Edit>,
    backup_file: Option<String>,

    // fetch_uri
    fetch_uri: Option<String>,
    location: Option<String>,
    proxy: Option<String>,
    #[serde(default)]
    ignore_errors: bool,

    // print_str
    print_str: Option<String>,

    // cd
    cd: Option<String>,

    // kill_process
    #[serde(default, deserialize_with = "de_opt_scalar")]
    kill_process_id: Option<String>,
    kill_process_name: Option<String>,
    #[serde(default)]
    error_on_find_failure: bool,
    #[serde(default)]
    error_on_kill_failure: bool,

    // expect
    expect: Option<RawExpect>,

    // ttp (sub-procedure)
    ttp: Option<String>,
    #[serde(default)]
    args: IndexMap<String, serde_yaml::Value>,

    cleanup: Option<serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExpect {
    inline: String,
    executor: Option<String>,
    #[serde(default)]
    responses: Vec<ExpectResponse>,
    chdir: Option<String>,
    timeout_seconds: Option<u64>,
}

/// Accept YAML scalars (string, int, bool) as text.
fn de_opt_scalar<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Option::<serde_yaml::Value>::deserialize(d)? {
        None => Ok(None),
        Some(value) => scalar_to_string(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom("expected a scalar value")),
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn build_action(raw: &RawStep, number: usize) -> Result<Action, ParseError> {
    let mut selected: Vec<&'static str> = Vec::new();
    if raw.inline.is_some() {
        selected.push("inline");
    }
    if raw.create_file.is_some() {
        selected.push("create_file");
    }
    if raw.remove_path.is_some() {
        selected.push("remove_path");
    }
    if raw.copy_path.is_some() {
        selected.push("copy_path");
    }
    if raw.edit_file.is_some() {
        selected.push("edit_file");
    }
    if raw.fetch_uri.is_some() {
        selected.push("fetch_uri");
    }
    if raw.print_str.is_some() {
        selected.push("print_str");
    }
    if raw.cd.is_some() {
        selected.push("cd");
    }
    if raw.kill_process_id.is_some() || raw.kill_process_name.is_some() {
        selected.push("kill_process");
    }
    if raw.expect.is_some() {
        selected.push("expect");
    }
    if raw.ttp.is_some() {
        selected.push("ttp");
    }

    match selected.len() {
        0 => return Err(ParseError::MissingAction { index: number }),
        1 => {}
        _ => return Err(ParseError::AmbiguousStep { index: number }),
    }

    let action = match selected[0] {
        "inline" => Action::Basic(BasicAction {
            inline: raw.inline.clone().unwrap_or_default(),
            executor: raw.executor.clone(),
            env: raw.env.clone(),
            outputs: raw.outputs.clone(),
        }),
        "create_file" => Action::CreateFile(CreateFileAction {
            path: raw.create_file.clone().unwrap_or_default(),
            contents: raw.contents.clone().unwrap_or_default(),
            overwrite: raw.overwrite,
            mode: raw.mode,
        }),
        "remove_path" => Action::RemovePath(RemovePathAction {
            path: raw.remove_path.clone().unwrap_or_default(),
            recursive: raw.recursive,
        }),
        "copy_path" => Action::CopyPath(CopyPathAction {
            source: raw.copy_path.clone().unwrap_or_default(),
            destination: raw.to.clone().ok_or_else(|| ParseError::InvalidStep {
                index: number,
                message: "copy_path requires a `to` destination".to_string(),
            })?,
            recursive: raw.recursive,
            overwrite: raw.overwrite,
            mode: raw.mode,
        }),
        "edit_file" => Action::EditFile(EditFileAction {
            target: raw.edit_file.clone().unwrap_or_default(),
            backup: raw.backup_file.clone(),
            edits: raw.edits.clone(),
        }),
        "fetch_uri" => Action::FetchUri(FetchUriAction {
            uri: raw.fetch_uri.clone().unwrap_or_default(),
            location: raw.location.clone().ok_or_else(|| ParseError::InvalidStep {
                index: number,
                message: "fetch_uri requires a `location` destination".to_string(),
            })?,
            overwrite: raw.overwrite,
            proxy: raw.proxy.clone(),
            ignore_errors: raw.ignore_errors,
        }),
        "print_str" => Action::PrintStr(PrintStrAction {
            message: raw.print_str.clone().unwrap_or_default(),
        }),
        "cd" => Action::ChangeDir(ChangeDirAction {
            directory: raw.cd.clone().unwrap_or_default(),
        }),
        "kill_process" => Action::KillProcess(KillProcessAction {
            pid: raw.kill_process_id.clone(),
            name: raw.kill_process_name.clone(),
            error_on_find_failure: raw.error_on_find_failure,
            error_on_kill_failure: raw.error_on_kill_failure,
        }),
        "expect" => {
            // checked above: expect.is_some()
            let block = raw.expect.as_ref().ok_or(ParseError::MissingAction {
                index: number,
            })?;
            Action::Expect(ExpectAction {
                inline: block.inline.clone(),
                executor: block.executor.clone(),
                responses: block.responses.clone(),
                chdir: block.chdir.clone(),
                timeout_seconds: block.timeout_seconds,
            })
        }
        "ttp" => {
            let mut args = IndexMap::new();
            for (key, value) in &raw.args {
                let text = scalar_to_string(value).ok_or_else(|| ParseError::InvalidStep {
                    index: number,
                    message: format!("sub-procedure arg {key} must be a scalar"),
                })?;
                args.insert(key.clone(), text);
            }
            Action::SubProcedure(SubProcedureAction {
                ttp: raw.ttp.clone().unwrap_or_default(),
                args,
                resolved_path: None,
                child: None,
                child_run: None,
            })
        }
        _ => return Err(ParseError::MissingAction { index: number }),
    };
    Ok(action)
}

fn parse_cleanup(
    value: Option<&serde_yaml::Value>,
    step_name: &str,
) -> Result<CleanupSpec, ParseError> {
    let Some(value) = value else {
        return Ok(CleanupSpec::Unspecified);
    };
    match value {
        serde_yaml::Value::String(text) if text == "default" => Ok(CleanupSpec::Default),
        serde_yaml::Value::Mapping(_) => {
            let action = parse_cleanup_action(value, step_name)?;
            Ok(CleanupSpec::Explicit(Box::new(action)))
        }
        serde_yaml::Value::Sequence(items) => {
            let mut actions = Vec::with_capacity(items.len());
            for item in items {
                actions.push(parse_cleanup_action(item, step_name)?);
            }
            Ok(CleanupSpec::List(actions))
        }
        other => Err(ParseError::InvalidCleanup {
            step: step_name.to_string(),
            message: format!("expected `default`, a step document, or a list, got {other:?}"),
        }),
    }
}

fn parse_cleanup_action(
    value: &serde_yaml::Value,
    step_name: &str,
) -> Result<Action, ParseError> {
    let raw: RawStep =
        serde_yaml::from_value(value.clone()).map_err(|err| ParseError::InvalidCleanup {
            step: step_name.to_string(),
            message: err.to_string(),
        })?;
    if raw.cleanup.is_some() {
        return Err(ParseError::InvalidCleanup {
            step: step_name.to_string(),
            message: "a cleanup step cannot itself declare a cleanup".to_string(),
        });
    }
    build_action(&raw, 0).map_err(|err| ParseError::InvalidCleanup {
        step: step_name.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
