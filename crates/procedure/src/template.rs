// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text templating over procedure documents and action fields
//!
//! Tera's `{{ ... }}` delimiters never collide with YAML structure, which
//! is what lets the pre-parse pass run over the raw document text before
//! `serde_yaml` sees it. The same engine re-renders declared action
//! fields between a step's Validate and Execute, with prior step outputs
//! in scope.

use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template rendering failed: {0}")]
    Render(#[source] tera::Error),
}

/// Render one template string against a prepared context.
///
/// Unresolved names are hard failures; tera reports them with the
/// variable path, which is exactly what we want surfaced.
pub fn render(template: &str, context: &tera::Context) -> Result<String, TemplateError> {
    // Fast path: nothing template-shaped in the text.
    if !template.contains("{{") && !template.contains("{%") {
        return Ok(template.to_string());
    }
    tera::Tera::one_off(template, context, false).map_err(TemplateError::Render)
}

/// Build the context exposed to templates: `args.*`, `stepvars.*`, and
/// `steps.<name>.outputs.*` (plus stdout/stderr) for completed steps.
pub fn build_context(
    args: &IndexMap<String, Value>,
    step_vars: &HashMap<String, String>,
    steps: &Value,
) -> tera::Context {
    let mut context = tera::Context::new();
    context.insert("args", args);
    context.insert("stepvars", step_vars);
    context.insert("steps", steps);
    context
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
