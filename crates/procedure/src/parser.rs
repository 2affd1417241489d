// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Procedure loading: lint, pre-parse templating, YAML parse
//!
//! Loading runs in stages. The raw text is linted (the `steps:` key must
//! occur exactly once at top level, after `args:`), the `args:` block is
//! parsed on its own so invocation arguments can be resolved, the whole
//! text is rendered through the template engine with those arguments in
//! scope, and only then does `serde_yaml` see the document.

use crate::procedure::{Procedure, Requirements};
use crate::step::Step;
use crate::template::{self, TemplateError};
use forge_core::{ArgError, ArgSpec, FileSystem, FsError};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading a procedure document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read procedure file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: FsError,
    },
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Args(#[from] ArgError),
    #[error("step #{index} has ambiguous type")]
    AmbiguousStep { index: usize },
    #[error("step #{index} has no recognized action type")]
    MissingAction { index: usize },
    #[error("step #{index} is missing a name")]
    MissingStepName { index: usize },
    #[error("invalid step #{index}: {message}")]
    InvalidStep { index: usize, message: String },
    #[error("invalid step name (must not contain whitespace): {0:?}")]
    InvalidStepName(String),
    #[error("duplicate step name: {0}")]
    DuplicateStepName(String),
    #[error("invalid cleanup for step {step}: {message}")]
    InvalidCleanup { step: String, message: String },
    #[error("procedure name must not contain whitespace: {0:?}")]
    InvalidProcedureName(String),
    #[error("mitre mapping requires at least one tactic")]
    EmptyTactics,
    #[error("document must contain exactly one top-level steps key (found {0})")]
    StepsCount(usize),
    #[error("the steps key must come after args")]
    StepsBeforeArgs,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProcedure {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    mitre: Option<crate::procedure::MitreMapping>,
    #[serde(default)]
    env: IndexMap<String, String>,
    #[serde(default)]
    args: Vec<ArgSpec>,
    #[serde(default)]
    requirements: Requirements,
    #[serde(default)]
    steps: Vec<serde_yaml::Value>,
}

/// Load a procedure file: lint, resolve args, render, parse.
///
/// Returns the parsed procedure together with the resolved argument
/// values (the same mapping the execution context should carry).
pub fn load_file(
    path: &Path,
    fs: &dyn FileSystem,
    supplied: &HashMap<String, String>,
) -> Result<(Procedure, IndexMap<String, Value>), ParseError> {
    tracing::debug!(path = %path.display(), "loading procedure");
    let bytes = fs.read(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = String::from_utf8_lossy(&bytes).into_owned();

    lint_raw(&raw)?;
    let specs = extract_arg_specs(&raw)?;
    let resolved = forge_core::resolve_args(&specs, supplied)?;

    let context = template::build_context(&resolved, &HashMap::new(), &json!({}));
    let rendered = template::render(&raw, &context)?;

    let working_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let procedure = parse_rendered(&rendered, working_dir)?;
    Ok((procedure, resolved))
}

/// Parse an already-rendered document into a [`Procedure`].
pub fn parse_rendered(rendered: &str, working_dir: PathBuf) -> Result<Procedure, ParseError> {
    let raw: RawProcedure = serde_yaml::from_str(rendered)?;

    if raw.name.is_empty() || raw.name.contains(char::is_whitespace) {
        return Err(ParseError::InvalidProcedureName(raw.name));
    }
    if let Some(mitre) = &raw.mitre {
        if mitre.tactics.is_empty() {
            return Err(ParseError::EmptyTactics);
        }
    }

    let mut steps = Vec::with_capacity(raw.steps.len());
    let mut names: HashSet<String> = HashSet::with_capacity(raw.steps.len());
    for (i, value) in raw.steps.iter().enumerate() {
        let step = Step::parse(value, i + 1)?;
        if !names.insert(step.name.clone()) {
            return Err(ParseError::DuplicateStepName(step.name));
        }
        steps.push(step);
    }

    Ok(Procedure {
        name: raw.name,
        description: raw.description,
        mitre: raw.mitre,
        env: raw.env,
        args: raw.args,
        requirements: raw.requirements,
        steps,
        working_dir,
    })
}

/// Parse just the `args:` block out of the raw (unrendered) text.
///
/// Runs before templating, so argument specs must not themselves be
/// templated. Extraction is textual: the block from a top-level `args:`
/// line up to the next top-level key.
pub fn extract_arg_specs(raw: &str) -> Result<Vec<ArgSpec>, ParseError> {
    #[derive(Deserialize)]
    struct ArgsOnly {
        #[serde(default)]
        args: Vec<ArgSpec>,
    }

    match extract_top_block(raw, "args:") {
        None => Ok(Vec::new()),
        Some(block) => {
            let parsed: ArgsOnly = serde_yaml::from_str(&block)?;
            Ok(parsed.args)
        }
    }
}

/// Lint the raw document text before any parsing.
fn lint_raw(raw: &str) -> Result<(), ParseError> {
    let mut steps_lines = Vec::new();
    let mut args_line = None;
    for (i, line) in raw.lines().enumerate() {
        if line == "steps:" || line.starts_with("steps: ") {
            steps_lines.push(i);
        }
        if args_line.is_none() && (line == "args:" || line.starts_with("args: ")) {
            args_line = Some(i);
        }
    }
    if steps_lines.len() != 1 {
        return Err(ParseError::StepsCount(steps_lines.len()));
    }
    if let (Some(args), Some(&steps)) = (args_line, steps_lines.first()) {
        if steps < args {
            return Err(ParseError::StepsBeforeArgs);
        }
    }
    Ok(())
}

/// Collect a top-level block: the line starting with `key` plus every
/// following line that is indented, blank, or a comment.
fn extract_top_block(raw: &str, key: &str) -> Option<String> {
    let mut collected: Vec<&str> = Vec::new();
    let mut in_block = false;
    for line in raw.lines() {
        if !in_block {
            if line.starts_with(key) {
                in_block = true;
                collected.push(line);
            }
            continue;
        }
        let continues = line.is_empty()
            || line.starts_with(' ')
            || line.starts_with('\t')
            || line.starts_with('#');
        if continues {
            collected.push(line);
        } else {
            break;
        }
    }
    if collected.is_empty() {
        None
    } else {
        Some(collected.join("\n"))
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
