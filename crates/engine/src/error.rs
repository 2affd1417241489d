// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types

use crate::actions::ActionError;
use forge_procedure::{ParseError, TemplateError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by Phase 1 (validation). Nothing has executed when
/// one of these is returned, so no cleanup is owed.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("step {step}: {field} must not be empty")]
    EmptyField { step: String, field: &'static str },
    #[error("step {step}: executor not found on PATH: {executor}")]
    ExecutorNotFound { step: String, executor: String },
    #[error("step {step}: {message}")]
    Invalid { step: String, message: String },
    #[error("step {step}: invalid pattern {pattern:?}: {source}")]
    BadPattern {
        step: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("step {step} has no default cleanup for action kind {kind}")]
    NoDefaultCleanup { step: String, kind: &'static str },
    #[error("step {step}: action kind {kind} cannot be used inside a cleanup list")]
    NotComposable { step: String, kind: &'static str },
    #[error("step {step}: sub-procedures may not contain sub-procedure steps")]
    NestedSubProcedure { step: String },
    #[error("step {step}: failed to load sub-procedure {reference}: {source}")]
    SubLoad {
        step: String,
        reference: String,
        #[source]
        source: Box<ParseError>,
    },
    #[error("step {step}: destination already exists: {path}")]
    DestinationExists { step: String, path: PathBuf },
    #[error("procedure requires superuser privileges")]
    NeedsSuperuser,
    #[error("procedure does not support this platform: {os}")]
    UnsupportedPlatform { os: &'static str },
}

/// Errors produced by a run that got past validation.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("templating step {step} failed: {source}")]
    Template {
        step: String,
        #[source]
        source: TemplateError,
    },
    #[error("step {step} failed: {source}")]
    Execution {
        step: String,
        #[source]
        source: ActionError,
    },
    #[error("cannot enter working directory {path}: {source}")]
    Workdir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
