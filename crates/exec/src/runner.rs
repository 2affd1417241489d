// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming process runner
//!
//! Spawns an interpreter, feeds it the inline script on stdin, and drains
//! stdout/stderr concurrently into both in-memory buffers and the
//! configured sinks. The whole run sits under a cancellable timeout; on
//! expiry the child's process group receives the platform's termination
//! signal.

use crate::interpreter::Interpreter;
use crate::sink::OutputSink;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

/// Default per-action timeout (100 minutes).
pub const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(100 * 60);

/// Errors from the process runner.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("inline command for binary executor is empty")]
    EmptyCommand,
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to feed script to {program}: {source}")]
    Stdin {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("process exited with code {exit_code}")]
    NonZeroExit {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    #[error("process timed out after {timeout:?}")]
    Timeout {
        timeout: Duration,
        stdout: String,
        stderr: String,
    },
    #[error("process terminated by signal")]
    Signaled { stdout: String, stderr: String },
    #[error("io error draining process output: {0}")]
    Drain(#[from] io::Error),
}

/// Captured output of a completed run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Builder-style process runner.
///
/// ```ignore
/// use forge_exec::{Interpreter, OutputSink, ProcessRunner};
///
/// # async fn example() -> Result<(), forge_exec::ExecError> {
/// let output = ProcessRunner::new(Interpreter::Bash)
///     .inline("echo hello")
///     .cwd("/tmp")
///     .run()
///     .await?;
/// assert_eq!(output.stdout, "hello\n");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ProcessRunner {
    interpreter: Interpreter,
    inline: String,
    env: IndexMap<String, String>,
    cwd: Option<PathBuf>,
    timeout: Duration,
    stdout_sink: OutputSink,
    stderr_sink: OutputSink,
    errexit_hint: bool,
}

impl ProcessRunner {
    pub fn new(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            inline: String::new(),
            env: IndexMap::new(),
            cwd: None,
            timeout: DEFAULT_EXEC_TIMEOUT,
            stdout_sink: OutputSink::host_stdout(),
            stderr_sink: OutputSink::host_stderr(),
            errexit_hint: false,
        }
    }

    /// The script text fed to the interpreter's stdin (or, for the
    /// `binary` executor, the command line to split and spawn).
    pub fn inline(mut self, script: impl Into<String>) -> Self {
        self.inline = script.into();
        self
    }

    /// Extra environment entries, merged over the process environment.
    pub fn envs(
        mut self,
        vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    pub fn cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.cwd = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn sinks(mut self, stdout: OutputSink, stderr: OutputSink) -> Self {
        self.stdout_sink = stdout;
        self.stderr_sink = stderr;
        self
    }

    /// Tell the runner the script carries its own `set -` error-handling
    /// directive, suppressing the injected abort-on-first-failure flag.
    pub fn errexit_hint(mut self, present: bool) -> Self {
        self.errexit_hint = present;
        self
    }

    /// Run to completion and enforce a zero exit code.
    pub async fn run(self) -> Result<ExecOutput, ExecError> {
        let (command, program, feeds_stdin) = self.build_command()?;
        let timeout = self.timeout;
        let inline = self.inline.clone();
        let output = spawn_and_drain(
            command,
            &program,
            feeds_stdin.then_some(inline),
            timeout,
            self.stdout_sink.clone(),
            self.stderr_sink.clone(),
        )
        .await?;
        if output.exit_code != 0 {
            return Err(ExecError::NonZeroExit {
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }

    fn build_command(&self) -> Result<(Command, String, bool), ExecError> {
        let mut command;
        let program;
        let feeds_stdin;
        match self.interpreter {
            Interpreter::Binary => {
                let mut tokens = self.inline.split_whitespace();
                let head = tokens.next().ok_or(ExecError::EmptyCommand)?;
                command = Command::new(head);
                command.args(tokens);
                program = head.to_string();
                feeds_stdin = false;
            }
            other => {
                // program() is Some for every non-binary variant
                let name = other.token();
                command = Command::new(name);
                if other.is_posix_shell() && !self.errexit_hint {
                    command.arg("-e");
                }
                if other == Interpreter::Powershell {
                    command.args(["-NoProfile", "-NonInteractive", "-Command", "-"]);
                }
                program = name.to_string();
                feeds_stdin = true;
            }
        }
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command
            .stdin(if feeds_stdin {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        Ok((command, program, feeds_stdin))
    }
}

async fn spawn_and_drain(
    mut command: Command,
    program: &str,
    script: Option<String>,
    timeout: Duration,
    stdout_sink: OutputSink,
    stderr_sink: OutputSink,
) -> Result<ExecOutput, ExecError> {
    let mut child = command.spawn().map_err(|source| ExecError::Spawn {
        program: program.to_string(),
        source,
    })?;

    if let Some(script) = script {
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(script.as_bytes())
                .await
                .map_err(|source| ExecError::Stdin {
                    program: program.to_string(),
                    source,
                })?;
            stdin.shutdown().await.map_err(|source| ExecError::Stdin {
                program: program.to_string(),
                source,
            })?;
        }
    }

    let stdout_buf: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    let stderr_buf: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));

    let stdout_task = child.stdout.take().map(|reader| {
        tokio::spawn(drain(reader, stdout_sink, stdout_buf.clone()))
    });
    let stderr_task = child.stderr.take().map(|reader| {
        tokio::spawn(drain(reader, stderr_sink, stderr_buf.clone()))
    });

    let child_pid = child.id();
    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(waited) => waited.map_err(ExecError::Drain)?,
        Err(_) => {
            tracing::warn!(?timeout, "process timed out, terminating process group");
            terminate(child_pid);
            let _ = child.wait().await;
            join_drains(stdout_task, stderr_task).await?;
            return Err(ExecError::Timeout {
                timeout,
                stdout: take_buffer(&stdout_buf),
                stderr: take_buffer(&stderr_buf),
            });
        }
    };

    join_drains(stdout_task, stderr_task).await?;
    let stdout = take_buffer(&stdout_buf);
    let stderr = take_buffer(&stderr_buf);

    match status.code() {
        Some(exit_code) => Ok(ExecOutput {
            stdout,
            stderr,
            exit_code,
        }),
        None => Err(ExecError::Signaled { stdout, stderr }),
    }
}

type DrainTask = Option<tokio::task::JoinHandle<Result<(), io::Error>>>;

async fn join_drains(stdout: DrainTask, stderr: DrainTask) -> Result<(), ExecError> {
    for task in [stdout, stderr].into_iter().flatten() {
        match task.await {
            Ok(result) => result?,
            Err(join) => {
                return Err(ExecError::Drain(io::Error::other(join)));
            }
        }
    }
    Ok(())
}

fn take_buffer(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8_lossy(&buffer.lock()).into_owned()
}

/// Tee one stream: raw bytes into the buffer, complete lines into the sink.
async fn drain(
    mut reader: impl tokio::io::AsyncRead + Unpin,
    sink: OutputSink,
    buffer: Arc<Mutex<Vec<u8>>>,
) -> Result<(), io::Error> {
    let mut chunk = [0u8; 4096];
    let mut pending: Vec<u8> = Vec::new();
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buffer.lock().extend_from_slice(&chunk[..n]);
        pending.extend_from_slice(&chunk[..n]);
        while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line);
            sink.write_line(text.trim_end_matches(['\n', '\r']));
        }
    }
    if !pending.is_empty() {
        sink.write_line(&String::from_utf8_lossy(&pending));
    }
    Ok(())
}

#[cfg(unix)]
fn terminate(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;
    if let Some(pid) = pid {
        if let Err(err) = killpg(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            tracing::warn!(%err, pid, "failed to signal process group");
        }
    }
}

#[cfg(not(unix))]
fn terminate(_pid: Option<u32>) {
    // kill_on_drop covers the child itself on non-unix hosts
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
