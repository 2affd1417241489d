// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pseudo-terminal expect runner
//!
//! Runs a script under a pty and answers its interactive prompts in
//! order. The script is staged into a temporary file so prompt responses
//! are the only input the child reads from the terminal.

use crate::interpreter::Interpreter;
use crate::sink::OutputSink;
use rexpect::process::wait::WaitStatus;
use rexpect::session::spawn_command;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default per-prompt wait.
pub const DEFAULT_PROMPT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ExpectError {
    #[error("inline command for binary executor is empty")]
    EmptyCommand,
    #[error("failed to stage expect script: {0}")]
    Stage(#[from] io::Error),
    #[error("prompt not observed within {timeout:?}: {prompt}")]
    PromptTimeout { prompt: String, timeout: Duration },
    #[error("pty session error: {0}")]
    Pty(#[from] rexpect::error::Error),
    #[error("expect task failed: {0}")]
    Join(String),
}

/// Captured outcome of an expect session.
#[derive(Debug, Clone, Default)]
pub struct ExpectOutput {
    /// Full pty transcript (prompts, echoed responses, script output).
    pub transcript: String,
    pub exit_code: i32,
}

/// Builder for one interactive session.
#[derive(Debug)]
pub struct ExpectRunner {
    interpreter: Interpreter,
    inline: String,
    responses: Vec<(String, String)>,
    cwd: Option<PathBuf>,
    timeout: Duration,
    sink: OutputSink,
}

impl ExpectRunner {
    pub fn new(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            inline: String::new(),
            responses: Vec::new(),
            cwd: None,
            timeout: DEFAULT_PROMPT_TIMEOUT,
            sink: OutputSink::host_stdout(),
        }
    }

    pub fn inline(mut self, script: impl Into<String>) -> Self {
        self.inline = script.into();
        self
    }

    /// Ordered (prompt, response) pairs. Prompts match as substrings of
    /// the child's output.
    pub fn responses(
        mut self,
        pairs: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        self.responses
            .extend(pairs.into_iter().map(|(p, r)| (p.into(), r.into())));
        self
    }

    pub fn cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.cwd = Some(path.into());
        self
    }

    /// Per-prompt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn sink(mut self, sink: OutputSink) -> Self {
        self.sink = sink;
        self
    }

    /// Drive the session to completion. The pty dance is blocking, so it
    /// runs on the blocking pool.
    pub async fn run(self) -> Result<ExpectOutput, ExpectError> {
        tokio::task::spawn_blocking(move || self.run_blocking())
            .await
            .map_err(|join| ExpectError::Join(join.to_string()))?
    }

    fn run_blocking(self) -> Result<ExpectOutput, ExpectError> {
        // Stage the script so the pty input stays reserved for responses.
        let mut staged = None;
        let mut command = match self.interpreter {
            Interpreter::Binary => {
                let mut tokens = self.inline.split_whitespace();
                let head = tokens.next().ok_or(ExpectError::EmptyCommand)?;
                let mut command = std::process::Command::new(head);
                command.args(tokens);
                command
            }
            shell => {
                let mut file = tempfile::NamedTempFile::new()?;
                file.write_all(self.inline.as_bytes())?;
                file.flush()?;
                let mut command = std::process::Command::new(shell.token());
                command.arg(file.path());
                staged = Some(file);
                command
            }
        };
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }

        let timeout_ms = self.timeout.as_millis() as u64;
        let mut session = spawn_command(command, Some(timeout_ms))?;
        let mut transcript = String::new();

        for (prompt, response) in &self.responses {
            match session.exp_string(prompt) {
                Ok(before) => {
                    push_transcript(&mut transcript, &self.sink, &before);
                    push_transcript(&mut transcript, &self.sink, prompt);
                    session.send_line(response)?;
                }
                Err(rexpect::error::Error::Timeout { .. }) => {
                    return Err(ExpectError::PromptTimeout {
                        prompt: prompt.clone(),
                        timeout: self.timeout,
                    });
                }
                Err(other) => return Err(ExpectError::Pty(other)),
            }
        }

        match session.exp_eof() {
            Ok(rest) => push_transcript(&mut transcript, &self.sink, &rest),
            Err(err) => tracing::debug!(%err, "pty drain after last prompt failed"),
        }

        let exit_code = match session.process.wait() {
            Ok(WaitStatus::Exited(_, code)) => code,
            Ok(other) => {
                tracing::debug!(?other, "expect child did not exit normally");
                -1
            }
            Err(err) => {
                tracing::debug!(%err, "pty wait failed");
                -1
            }
        };
        drop(staged);

        Ok(ExpectOutput {
            transcript,
            exit_code,
        })
    }
}

fn push_transcript(transcript: &mut String, sink: &OutputSink, chunk: &str) {
    if chunk.is_empty() {
        return;
    }
    transcript.push_str(chunk);
    for line in chunk.lines() {
        let line = line.trim_end_matches('\r');
        if !line.is_empty() {
            sink.write_line(line);
        }
    }
}

#[cfg(test)]
#[path = "expect_tests.rs"]
mod tests;
