// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! forge-procedure: TTP document model and loader.
//!
//! Parses declarative YAML procedure files into [`Procedure`] values:
//! lint rules over the raw text, pre-parse templating (tera), and
//! per-step action parsing with the exactly-one-action-key rule.

mod action;
mod parser;
mod procedure;
mod step;
mod template;

pub use action::{
    Action, BasicAction, ChangeDirAction, ChildRun, CompositeAction, CopyPathAction,
    CreateFileAction, Edit, EditFileAction, ExpectAction, ExpectResponse, FetchUriAction,
    FileMode, KillProcessAction, OutputFilter, OutputSpec, PrintStrAction, RemovePathAction,
    RestoreDirAction, SubCleanupAction, SubProcedureAction,
};
pub use parser::{extract_arg_specs, load_file, parse_rendered, ParseError};
pub use procedure::{MitreMapping, Procedure, Requirements};
pub use step::{CleanupSpec, Step};
pub use template::{build_context, render, TemplateError};
