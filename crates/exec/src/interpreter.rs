// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interpreter tokens accepted by the process runner

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown executor: {0}")]
pub struct UnknownExecutor(pub String);

/// How an inline script gets executed.
///
/// Every variant except [`Interpreter::Binary`] names an interpreter that
/// receives the script on stdin. `Binary` means the inline text is an
/// already-prepared command line: it is split on whitespace (first token =
/// program, rest = arguments) and spawned directly. Quoting is not
/// honored in that split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpreter {
    Sh,
    #[default]
    Bash,
    Zsh,
    Powershell,
    Binary,
}

impl Interpreter {
    /// Program name looked up on PATH. `None` for [`Interpreter::Binary`].
    pub fn program(self) -> Option<&'static str> {
        match self {
            Interpreter::Sh => Some("sh"),
            Interpreter::Bash => Some("bash"),
            Interpreter::Zsh => Some("zsh"),
            Interpreter::Powershell => Some("powershell"),
            Interpreter::Binary => None,
        }
    }

    /// POSIX shells get "abort on first failing command" injected.
    pub fn is_posix_shell(self) -> bool {
        matches!(self, Interpreter::Sh | Interpreter::Bash | Interpreter::Zsh)
    }

    pub fn token(self) -> &'static str {
        match self {
            Interpreter::Sh => "sh",
            Interpreter::Bash => "bash",
            Interpreter::Zsh => "zsh",
            Interpreter::Powershell => "powershell",
            Interpreter::Binary => "binary",
        }
    }
}

impl fmt::Display for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Interpreter {
    type Err = UnknownExecutor;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "sh" => Ok(Interpreter::Sh),
            "bash" => Ok(Interpreter::Bash),
            "zsh" => Ok(Interpreter::Zsh),
            "powershell" | "pwsh" => Ok(Interpreter::Powershell),
            "binary" => Ok(Interpreter::Binary),
            other => Err(UnknownExecutor(other.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod tests;
