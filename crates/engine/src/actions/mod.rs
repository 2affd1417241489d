// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action implementations
//!
//! One module per action kind. Dispatch is a match over the
//! [`Action`] sum type; the returned future is boxed because composite
//! and sub-procedure actions recurse back into this dispatcher.

use crate::context::ExecutionContext;
use crate::error::RunError;
use forge_core::{ExpandError, FsError, PathError, StepResult};
use forge_exec::{ExecError, ExpectError, UnknownExecutor};
use forge_procedure::Action;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use thiserror::Error;

pub(crate) mod basic;
pub(crate) mod change_dir;
pub(crate) mod composite;
pub(crate) mod copy_path;
pub(crate) mod create_file;
pub(crate) mod edit_file;
pub(crate) mod expect;
pub(crate) mod fetch_uri;
pub(crate) mod kill_process;
pub(crate) mod print_str;
pub(crate) mod remove_path;
pub(crate) mod subproc;

/// Errors raised while executing a single action.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Expect(#[from] ExpectError),
    #[error("interactive session exited with code {exit_code}")]
    ExpectExit { exit_code: i32 },
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Expand(#[from] ExpandError),
    #[error(transparent)]
    Args(#[from] forge_core::ArgError),
    #[error("{0}")]
    UnknownExecutor(#[from] UnknownExecutor),
    #[error("path already exists (set overwrite to replace it): {0}")]
    AlreadyExists(PathBuf),
    #[error("source path does not exist: {0}")]
    SourceMissing(PathBuf),
    #[error("{0} is a directory (set recursive to remove or copy it)")]
    DirectoryNeedsRecursive(PathBuf),
    #[error("directory does not exist: {0}")]
    NoSuchDirectory(PathBuf),
    #[error("pattern '{pattern}' from edit #{number} was not found in file {target}")]
    EditPatternNotFound {
        pattern: String,
        number: usize,
        target: String,
    },
    #[error("output spec {name} did not match stdout")]
    OutputSpecMiss { name: String },
    #[error("output spec {name}: stdout is not valid JSON: {source}")]
    OutputNotJson {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid regex in output spec {name}: {source}")]
    OutputSpecRegex {
        name: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid regex in edit #{number}: {source}")]
    EditRegex {
        number: usize,
        #[source]
        source: regex::Error,
    },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("GET {uri} returned status {status}")]
    HttpStatus { uri: String, status: u16 },
    #[error("invalid process id: {0}")]
    InvalidPid(String),
    #[error("no such process: {0}")]
    ProcessNotFound(String),
    #[error("failed to signal process {pid}")]
    KillFailed { pid: u32 },
    #[error("no process matches name: {0}")]
    NoProcessMatch(String),
    #[error("previous directory for step index {0} is not recorded")]
    NoPreviousDir(usize),
    #[error("sub-procedure was not loaded during validation")]
    ChildNotLoaded,
    #[error("sub-procedure {name} failed: {source}")]
    Sub {
        name: String,
        #[source]
        source: Box<RunError>,
    },
    #[error("cleanup has no recorded child run to roll back")]
    NoChildRun,
    #[error("failed to enter working directory {path}: {source}")]
    Workdir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) type ActionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<StepResult, ActionError>> + Send + 'a>>;

/// Execute one action against the context.
///
/// `main` is the step's main action; the generated sub-procedure cleanup
/// reads its recorded child run through it. The future is boxed so
/// composite and sub-procedure actions can recurse.
pub(crate) fn execute_action<'a>(
    action: &'a mut Action,
    main: Option<&'a mut Action>,
    ctx: &'a mut ExecutionContext,
) -> ActionFuture<'a> {
    Box::pin(async move {
        tracing::debug!(kind = action.kind(), "executing action");
        match action {
            Action::Basic(a) => basic::execute(a, ctx).await,
            Action::CreateFile(a) => create_file::execute(a, ctx),
            Action::RemovePath(a) => remove_path::execute(a, ctx),
            Action::CopyPath(a) => copy_path::execute(a, ctx),
            Action::EditFile(a) => edit_file::execute(a, ctx),
            Action::FetchUri(a) => fetch_uri::execute(a, ctx).await,
            Action::PrintStr(a) => print_str::execute(a, ctx),
            Action::ChangeDir(a) => change_dir::execute(a, ctx),
            Action::KillProcess(a) => kill_process::execute(a, ctx),
            Action::Expect(a) => expect::execute(a, ctx).await,
            Action::SubProcedure(a) => subproc::execute(a, ctx).await,
            Action::Composite(a) => composite::execute(a, ctx).await,
            Action::RestoreDir(a) => change_dir::restore(a, ctx),
            Action::SubCleanup(_) => {
                let main = main.ok_or(ActionError::NoChildRun)?;
                subproc::cleanup(main, ctx).await
            }
        }
    })
}
