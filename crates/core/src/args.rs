// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Procedure argument specs and invocation-time resolution

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Errors produced while resolving invocation arguments against specs.
#[derive(Debug, Error)]
pub enum ArgError {
    #[error("invalid argument syntax (expected key=value): {0}")]
    InvalidSyntax(String),
    #[error("duplicate argument spec: {0}")]
    DuplicateName(String),
    #[error("missing required argument: {0}")]
    MissingRequired(String),
    #[error("unknown argument: {0}")]
    Unknown(String),
    #[error("invalid value for argument {name} (expected {expected}): {value}")]
    InvalidValue {
        name: String,
        expected: &'static str,
        value: String,
    },
    #[error("value for argument {name} not in choices {choices:?}: {value}")]
    NotInChoices {
        name: String,
        value: String,
        choices: Vec<String>,
    },
    #[error("invalid default for argument {name}: {message}")]
    InvalidDefault { name: String, message: String },
}

/// Declared type of a procedure argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    #[default]
    String,
    Int,
    Bool,
}

impl ArgType {
    fn name(self) -> &'static str {
        match self {
            ArgType::String => "string",
            ArgType::Int => "int",
            ArgType::Bool => "bool",
        }
    }
}

/// One argument declaration from a procedure document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArgSpec {
    pub name: String,
    #[serde(default, rename = "type")]
    pub arg_type: ArgType,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub required: bool,
    /// When non-empty, the resolved value must render to one of these.
    #[serde(default)]
    pub choices: Vec<String>,
}

impl ArgSpec {
    /// An argument must be supplied when it is flagged required or has no
    /// default to fall back on.
    pub fn is_mandatory(&self) -> bool {
        self.required || self.default.is_none()
    }
}

/// Split a CLI-style `key=value` pair.
pub fn parse_arg_kv(input: &str) -> Result<(String, String), ArgError> {
    match input.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(ArgError::InvalidSyntax(input.to_string())),
    }
}

/// Resolve supplied `key=value` strings against the declared specs.
///
/// Values are parsed per the spec's type, defaults fill gaps, mandatory
/// args with no value fail, and supplying a name with no spec fails.
pub fn resolve_args(
    specs: &[ArgSpec],
    supplied: &HashMap<String, String>,
) -> Result<IndexMap<String, Value>, ArgError> {
    let mut seen: Vec<&str> = Vec::with_capacity(specs.len());
    for spec in specs {
        if seen.contains(&spec.name.as_str()) {
            return Err(ArgError::DuplicateName(spec.name.clone()));
        }
        seen.push(&spec.name);
    }

    for name in supplied.keys() {
        if !specs.iter().any(|s| &s.name == name) {
            return Err(ArgError::Unknown(name.clone()));
        }
    }

    let mut resolved = IndexMap::with_capacity(specs.len());
    for spec in specs {
        let value = match supplied.get(&spec.name) {
            Some(raw) => parse_value(spec, raw)?,
            None if spec.is_mandatory() => {
                return Err(ArgError::MissingRequired(spec.name.clone()));
            }
            None => match &spec.default {
                Some(default) => coerce_default(spec, default)?,
                None => return Err(ArgError::MissingRequired(spec.name.clone())),
            },
        };
        check_choices(spec, &value)?;
        resolved.insert(spec.name.clone(), value);
    }
    Ok(resolved)
}

fn parse_value(spec: &ArgSpec, raw: &str) -> Result<Value, ArgError> {
    match spec.arg_type {
        ArgType::String => Ok(Value::String(raw.to_string())),
        ArgType::Int => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| ArgError::InvalidValue {
                name: spec.name.clone(),
                expected: "int",
                value: raw.to_string(),
            }),
        ArgType::Bool => match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(ArgError::InvalidValue {
                name: spec.name.clone(),
                expected: "bool",
                value: raw.to_string(),
            }),
        },
    }
}

/// Defaults come from YAML so they may already carry the right type; a
/// string default for an int/bool arg is re-parsed.
fn coerce_default(spec: &ArgSpec, default: &Value) -> Result<Value, ArgError> {
    let matches = match spec.arg_type {
        ArgType::String => default.is_string(),
        ArgType::Int => default.is_i64(),
        ArgType::Bool => default.is_boolean(),
    };
    if matches {
        return Ok(default.clone());
    }
    match default {
        Value::String(raw) => parse_value(spec, raw),
        other => Err(ArgError::InvalidDefault {
            name: spec.name.clone(),
            message: format!("expected {}, got {other}", spec.arg_type.name()),
        }),
    }
}

fn check_choices(spec: &ArgSpec, value: &Value) -> Result<(), ArgError> {
    if spec.choices.is_empty() {
        return Ok(());
    }
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if spec.choices.iter().any(|c| c == &rendered) {
        Ok(())
    } else {
        Err(ArgError::NotInChoices {
            name: spec.name.clone(),
            value: rendered,
            choices: spec.choices.clone(),
        })
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
