// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime variable expansion over the results record
//!
//! Replaces `$forge.steps.<name>.outputs.<key>[.<subkey>...]` references
//! inside already-parsed strings with captured step outputs. This is
//! distinct from document templating: it runs inside Execute, against the
//! by-name view of the results record.

use crate::result::ResultsRecord;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static STEP_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$forge\.steps\.([a-zA-Z_][a-zA-Z0-9_-]*)\.outputs\.([a-zA-Z_][a-zA-Z0-9_-]*(?:\.[a-zA-Z_][a-zA-Z0-9_-]*)*)",
    )
    .expect("constant regex pattern is valid")
});

/// Errors raised when a reference cannot be resolved.
#[derive(Debug, Error)]
pub enum ExpandError {
    #[error("no results recorded for step: {0}")]
    UnknownStep(String),
    #[error("step {step} has no output: {key}")]
    UnknownKey { step: String, key: String },
    #[error("failed to render output value: {0}")]
    Render(#[from] serde_json::Error),
}

/// Expand every `$forge.steps.*` reference in `input`.
///
/// String outputs substitute verbatim; structured outputs render as their
/// canonical JSON form. A missing step or key fails the whole expansion.
pub fn expand_variables(input: &str, results: &ResultsRecord) -> Result<String, ExpandError> {
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0;
    for caps in STEP_REF.captures_iter(input) {
        #[allow(clippy::expect_used)]
        let whole = caps.get(0).expect("capture 0 always present");
        let step = &caps[1];
        let key_path = &caps[2];

        let result = results
            .get_named(step)
            .ok_or_else(|| ExpandError::UnknownStep(step.to_string()))?;

        let mut keys = key_path.split('.');
        #[allow(clippy::expect_used)]
        let first = keys.next().expect("regex guarantees one key");
        let mut value = result
            .outputs
            .get(first)
            .ok_or_else(|| ExpandError::UnknownKey {
                step: step.to_string(),
                key: first.to_string(),
            })?;
        for key in keys {
            value = value.get(key).ok_or_else(|| ExpandError::UnknownKey {
                step: step.to_string(),
                key: format!("{first}.{key}"),
            })?;
        }

        out.push_str(&input[cursor..whole.start()]);
        match value {
            Value::String(s) => out.push_str(s),
            other => out.push_str(&serde_json::to_string(other)?),
        }
        cursor = whole.end();
    }
    out.push_str(&input[cursor..]);
    Ok(out)
}

#[cfg(test)]
#[path = "expand_tests.rs"]
mod tests;
