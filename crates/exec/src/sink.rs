// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output sinks the process runner mirrors live output into
//!
//! The runner tees each stream: raw bytes go to an in-memory buffer, and
//! complete lines (trailing newline stripped) go to a sink. The default
//! sinks are the host's standard streams with `[STDOUT] ` / `[STDERR] `
//! prefixes.

use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Shared, line-oriented write target.
#[derive(Clone)]
pub struct OutputSink {
    prefix: &'static str,
    target: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl OutputSink {
    /// Host stdout with the `[STDOUT] ` prefix.
    pub fn host_stdout() -> Self {
        Self {
            prefix: "[STDOUT] ",
            target: Arc::new(Mutex::new(Box::new(std::io::stdout()))),
        }
    }

    /// Host stderr with the `[STDERR] ` prefix.
    pub fn host_stderr() -> Self {
        Self {
            prefix: "[STDERR] ",
            target: Arc::new(Mutex::new(Box::new(std::io::stderr()))),
        }
    }

    /// Sink that drops everything.
    pub fn null() -> Self {
        Self {
            prefix: "",
            target: Arc::new(Mutex::new(Box::new(std::io::sink()))),
        }
    }

    /// In-memory sink plus a handle for reading what was written.
    /// Test observability and sub-procedure aggregation.
    pub fn buffer() -> (Self, SinkBuffer) {
        let shared: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Self {
            prefix: "",
            target: Arc::new(Mutex::new(Box::new(SharedVec(shared.clone())))),
        };
        (sink, SinkBuffer(shared))
    }

    /// Write one line (no trailing newline on `line`).
    ///
    /// Sink writes are best-effort; a broken pipe on the host stream must
    /// not fail the step that produced the output.
    pub fn write_line(&self, line: &str) {
        let mut target = self.target.lock();
        if writeln!(target, "{}{}", self.prefix, line).is_err() {
            tracing::trace!("sink write failed");
        }
        let _ = target.flush();
    }
}

struct SharedVec(Arc<Mutex<Vec<u8>>>);

impl Write for SharedVec {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Read side of [`OutputSink::buffer`].
#[derive(Debug, Clone)]
pub struct SinkBuffer(Arc<Mutex<Vec<u8>>>);

impl SinkBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
