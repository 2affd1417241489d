// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-scoped state shared with every action

use forge_core::{FileSystem, RealFs, ResultsRecord};
use forge_exec::{OutputSink, DEFAULT_EXEC_TIMEOUT};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Configuration and mutable results for one procedure run.
///
/// Built by the caller (CLI or a parent sub-procedure step), owned by the
/// driver for the duration of the run. Actions mutate only the working
/// directory (change-dir), the step-local vars, and — through the engine
/// — the results record.
#[derive(Debug)]
pub struct ExecutionContext {
    pub(crate) workdir: PathBuf,
    pub(crate) stdout: OutputSink,
    pub(crate) stderr: OutputSink,
    pub(crate) args: IndexMap<String, Value>,
    /// Top-level `env:` of the procedure, merged under shell step env.
    pub(crate) proc_env: IndexMap<String, String>,
    pub(crate) step_vars: HashMap<String, String>,
    pub(crate) no_cleanup: bool,
    pub(crate) cleanup_delay: Duration,
    pub(crate) dry_run: bool,
    pub(crate) search_paths: Vec<PathBuf>,
    pub(crate) fs: Arc<dyn FileSystem>,
    pub(crate) exec_timeout: Duration,
    pub(crate) results: ResultsRecord,
}

impl ExecutionContext {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            stdout: OutputSink::host_stdout(),
            stderr: OutputSink::host_stderr(),
            args: IndexMap::new(),
            proc_env: IndexMap::new(),
            step_vars: HashMap::new(),
            no_cleanup: false,
            cleanup_delay: Duration::ZERO,
            dry_run: false,
            search_paths: Vec::new(),
            fs: Arc::new(RealFs),
            exec_timeout: DEFAULT_EXEC_TIMEOUT,
            results: ResultsRecord::new(),
        }
    }

    /// Resolved procedure arguments.
    pub fn args(mut self, args: IndexMap<String, Value>) -> Self {
        self.args = args;
        self
    }

    /// Where live process output gets mirrored.
    pub fn sinks(mut self, stdout: OutputSink, stderr: OutputSink) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    /// Skip the cleanup walk entirely.
    pub fn no_cleanup(mut self, skip: bool) -> Self {
        self.no_cleanup = skip;
        self
    }

    /// Sleep before the cleanup walk begins.
    pub fn cleanup_delay(mut self, delay: Duration) -> Self {
        self.cleanup_delay = delay;
        self
    }

    /// Stop after validation, executing nothing.
    pub fn dry_run(mut self, dry: bool) -> Self {
        self.dry_run = dry;
        self
    }

    /// Directories consulted when a sub-procedure step references
    /// another procedure by relative name.
    pub fn search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    /// File-system view used by all file-touching actions.
    pub fn fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Per-action process timeout (default 100 minutes).
    pub fn exec_timeout(mut self, timeout: Duration) -> Self {
        self.exec_timeout = timeout;
        self
    }

    /// Set one step-local variable, visible to templating as
    /// `stepvars.<name>`.
    pub fn set_step_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.step_vars.insert(name.into(), value.into());
    }

    pub fn working_dir(&self) -> &PathBuf {
        &self.workdir
    }

    pub fn results(&self) -> &ResultsRecord {
        &self.results
    }

    /// Fresh context for a sub-procedure run: sinks, file-system view,
    /// and timeout are inherited; args and results are the child's own.
    pub(crate) fn child(&self, workdir: PathBuf, args: IndexMap<String, Value>) -> Self {
        Self {
            workdir,
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
            args,
            proc_env: IndexMap::new(),
            step_vars: HashMap::new(),
            no_cleanup: self.no_cleanup,
            cleanup_delay: Duration::ZERO,
            dry_run: false,
            search_paths: self.search_paths.clone(),
            fs: self.fs.clone(),
            exec_timeout: self.exec_timeout,
            results: ResultsRecord::new(),
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
