// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-step results and the dual-view results record

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Captured outcome of one step (or one cleanup).
///
/// `outputs` holds the values extracted by output specs; later steps read
/// them back through `$forge.steps.<name>.outputs.<key>` expansion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StepResult {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub outputs: IndexMap<String, Value>,
    /// Result of the step's cleanup, populated during the cleanup walk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<Box<StepResult>>,
}

impl StepResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result whose stdout is already known (print-str, process runs).
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    /// Record a single named output value.
    pub fn insert_output(&mut self, name: impl Into<String>, value: Value) {
        self.outputs.insert(name.into(), value);
    }
}

/// Results of an in-flight run, readable by index and by step name.
///
/// Backed by a single vector; the by-name map stores indices into it, so a
/// write through one view is visible through the other.
#[derive(Debug, Clone, Default)]
pub struct ResultsRecord {
    entries: Vec<StepResult>,
    by_name: HashMap<String, usize>,
}

impl ResultsRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the result for a completed step. Returns its index.
    pub fn record(&mut self, name: impl Into<String>, result: StepResult) -> usize {
        let index = self.entries.len();
        self.entries.push(result);
        self.by_name.insert(name.into(), index);
        index
    }

    pub fn get(&self, index: usize) -> Option<&StepResult> {
        self.entries.get(index)
    }

    pub fn get_named(&self, name: &str) -> Option<&StepResult> {
        self.by_name.get(name).and_then(|&i| self.entries.get(i))
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut StepResult> {
        self.entries.get_mut(index)
    }

    /// Attach a cleanup result to the entry at `index`.
    pub fn set_cleanup(&mut self, index: usize, cleanup: StepResult) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.cleanup = Some(Box::new(cleanup));
        }
    }

    /// Names of recorded steps, in execution order.
    pub fn names(&self) -> Vec<&str> {
        let mut pairs: Vec<(&str, usize)> = self
            .by_name
            .iter()
            .map(|(name, &i)| (name.as_str(), i))
            .collect();
        pairs.sort_by_key(|&(_, i)| i);
        pairs.into_iter().map(|(name, _)| name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepResult> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[StepResult] {
        &self.entries
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
