// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests

use crate::context::ExecutionContext;
use forge_core::MemFs;
use forge_exec::{OutputSink, SinkBuffer};
use forge_procedure::{parse_rendered, Procedure, Step};
use std::path::PathBuf;
use std::sync::Arc;

/// Context over an in-memory file system with silent sinks.
pub(crate) fn mem_ctx(workdir: &str) -> (ExecutionContext, Arc<MemFs>) {
    let fs = Arc::new(MemFs::new());
    fs.seed_dir(workdir);
    let ctx = ExecutionContext::new(workdir)
        .fs(fs.clone())
        .sinks(OutputSink::null(), OutputSink::null());
    (ctx, fs)
}

/// Context over an in-memory file system with capturing sinks.
pub(crate) fn capture_ctx(workdir: &str) -> (ExecutionContext, Arc<MemFs>, SinkBuffer, SinkBuffer) {
    let fs = Arc::new(MemFs::new());
    fs.seed_dir(workdir);
    let (stdout, out_buf) = OutputSink::buffer();
    let (stderr, err_buf) = OutputSink::buffer();
    let ctx = ExecutionContext::new(workdir)
        .fs(fs.clone())
        .sinks(stdout, stderr);
    (ctx, fs, out_buf, err_buf)
}

/// Parse a full procedure document rooted at `workdir`.
pub(crate) fn procedure(yaml: &str, workdir: &str) -> Procedure {
    #[allow(clippy::expect_used)]
    parse_rendered(yaml, PathBuf::from(workdir)).expect("test procedure parses")
}

/// Parse a single step document.
pub(crate) fn step(yaml: &str) -> Step {
    #[allow(clippy::expect_used)]
    let value: serde_yaml::Value = serde_yaml::from_str(yaml).expect("test step yaml");
    #[allow(clippy::expect_used)]
    Step::parse(&value, 1).expect("test step parses")
}
