// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Procedure document model

use crate::step::Step;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// MITRE ATT&CK mapping carried by a procedure.
///
/// When the block is present at all, `tactics` must be non-empty; the
/// loader enforces this.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MitreMapping {
    #[serde(default)]
    pub tactics: Vec<String>,
    #[serde(default)]
    pub techniques: Vec<String>,
    #[serde(default)]
    pub subtechniques: Vec<String>,
}

/// Host preconditions checked before any step runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub superuser: bool,
    /// OS names as reported by `std::env::consts::OS`; empty = any.
    #[serde(default)]
    pub platforms: Vec<String>,
}

/// A parsed TTP: the root document the engine executes.
///
/// Constructed by the loader and immutable during execution; the engine
/// clones the steps into its own run state before templating them.
#[derive(Debug, Clone, Default)]
pub struct Procedure {
    pub name: String,
    pub description: String,
    pub mitre: Option<MitreMapping>,
    /// Top-level environment entries, merged under each shell step's env.
    pub env: IndexMap<String, String>,
    pub args: Vec<forge_core::ArgSpec>,
    pub requirements: Requirements,
    pub steps: Vec<Step>,
    /// Directory containing the procedure file unless overridden.
    pub working_dir: PathBuf,
}

impl Procedure {
    pub fn step_named(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// True when any step invokes another procedure.
    pub fn has_sub_procedures(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.action, crate::Action::SubProcedure(_)))
    }
}

#[cfg(test)]
#[path = "procedure_tests.rs"]
mod tests;
