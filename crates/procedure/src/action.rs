// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polymorphic step actions
//!
//! One variant per action-selecting document key, plus the two generated
//! kinds: [`CompositeAction`] (explicit cleanup lists and the edit-file
//! default cleanup) and the back-referencing rollback actions
//! ([`RestoreDirAction`], [`SubCleanupAction`]) that store a step index
//! instead of sharing ownership with their parent action.

use forge_core::ResultsRecord;
use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// File permission bits parsed from a document.
///
/// Integers are read as octal digits (`mode: 644` means `0o644`), string
/// forms accept an optional `0o` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMode(pub u32);

impl<'de> Deserialize<'de> for FileMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ModeVisitor;

        impl de::Visitor<'_> for ModeVisitor {
            type Value = FileMode;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("octal file mode (int or string)")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<FileMode, E> {
                parse_octal(&v.to_string()).map(FileMode).ok_or_else(|| {
                    E::custom(format!("invalid octal file mode: {v}"))
                })
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<FileMode, E> {
                if v < 0 {
                    return Err(E::custom(format!("invalid octal file mode: {v}")));
                }
                self.visit_u64(v as u64)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<FileMode, E> {
                parse_octal(v).map(FileMode).ok_or_else(|| {
                    E::custom(format!("invalid octal file mode: {v}"))
                })
            }
        }

        deserializer.deserialize_any(ModeVisitor)
    }
}

impl Serialize for FileMode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0o{:o}", self.0))
    }
}

fn parse_octal(text: &str) -> Option<u32> {
    let digits = text.strip_prefix("0o").unwrap_or(text);
    u32::from_str_radix(digits, 8).ok()
}

/// Named extraction rule applied to a shell step's stdout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputSpec {
    pub name: String,
    #[serde(flatten)]
    pub filter: OutputFilter,
}

/// How an output value is pulled out of stdout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFilter {
    /// Regex applied to stdout; the first capture group wins, otherwise
    /// the whole match.
    Regex(String),
    /// Dotted path into stdout parsed as JSON.
    JsonPath(String),
}

/// Shell (inline) action.
#[derive(Debug, Clone, Default)]
pub struct BasicAction {
    pub inline: String,
    pub executor: Option<String>,
    pub env: IndexMap<String, String>,
    pub outputs: Vec<OutputSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateFileAction {
    pub path: String,
    pub contents: String,
    pub overwrite: bool,
    pub mode: Option<FileMode>,
}

#[derive(Debug, Clone, Default)]
pub struct RemovePathAction {
    pub path: String,
    pub recursive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CopyPathAction {
    pub source: String,
    pub destination: String,
    pub recursive: bool,
    pub overwrite: bool,
    pub mode: Option<FileMode>,
}

/// One edit applied by the edit-file action. Exactly one kind per entry:
/// replace (`old`+`new`), `append`, or `delete`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Edit {
    #[serde(default)]
    pub old: Option<String>,
    #[serde(default)]
    pub new: Option<String>,
    #[serde(default)]
    pub append: Option<String>,
    #[serde(default)]
    pub delete: Option<String>,
    #[serde(default)]
    pub regexp: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EditFileAction {
    pub target: String,
    pub backup: Option<String>,
    pub edits: Vec<Edit>,
}

#[derive(Debug, Clone, Default)]
pub struct FetchUriAction {
    pub uri: String,
    pub location: String,
    pub overwrite: bool,
    pub proxy: Option<String>,
    pub ignore_errors: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PrintStrAction {
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChangeDirAction {
    pub directory: String,
}

#[derive(Debug, Clone, Default)]
pub struct KillProcessAction {
    /// Numeric PID, kept as text until execute so step-output references
    /// can flow through it.
    pub pid: Option<String>,
    pub name: Option<String>,
    pub error_on_find_failure: bool,
    pub error_on_kill_failure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExpectResponse {
    pub prompt: String,
    pub response: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExpectAction {
    pub inline: String,
    pub executor: Option<String>,
    pub responses: Vec<ExpectResponse>,
    pub chdir: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Recorded execution of a sub-procedure's child steps, retained on the
/// action so the generated cleanup can walk the successful prefix even
/// when the sub-procedure as a whole failed.
#[derive(Debug, Clone)]
pub struct ChildRun {
    pub steps: Vec<crate::Step>,
    pub results: ResultsRecord,
    pub working_dir: PathBuf,
    /// Count of child steps that executed successfully.
    pub completed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SubProcedureAction {
    /// Procedure reference, resolved through the search paths.
    pub ttp: String,
    pub args: IndexMap<String, String>,
    /// Where the reference resolved to (validate time). Execute reloads
    /// from here so arg values carrying step-output references render
    /// with their runtime values.
    pub resolved_path: Option<PathBuf>,
    /// Loaded and validated child document (validate time).
    pub child: Option<Box<crate::Procedure>>,
    /// Executed prefix (execute time).
    pub child_run: Option<ChildRun>,
}

/// Generated sequence of cleanup-capable actions.
#[derive(Debug, Clone, Default)]
pub struct CompositeAction {
    pub actions: Vec<Action>,
}

/// Generated rollback for a change-directory step. Reads the remembered
/// prior directory out of the results record at execute time instead of
/// holding a reference to its parent action.
#[derive(Debug, Clone, Copy)]
pub struct RestoreDirAction {
    pub step_index: usize,
}

/// Generated rollback for a sub-procedure step. The engine resolves the
/// recorded [`ChildRun`] off the step's main action when this runs.
#[derive(Debug, Clone, Copy)]
pub struct SubCleanupAction {
    pub step_index: usize,
}

/// Every executable action kind.
#[derive(Debug, Clone)]
pub enum Action {
    Basic(BasicAction),
    CreateFile(CreateFileAction),
    RemovePath(RemovePathAction),
    CopyPath(CopyPathAction),
    EditFile(EditFileAction),
    FetchUri(FetchUriAction),
    PrintStr(PrintStrAction),
    ChangeDir(ChangeDirAction),
    KillProcess(KillProcessAction),
    Expect(ExpectAction),
    SubProcedure(SubProcedureAction),
    Composite(CompositeAction),
    RestoreDir(RestoreDirAction),
    SubCleanup(SubCleanupAction),
}

impl Action {
    /// Document-facing kind name, for errors and tracing.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Basic(_) => "inline",
            Action::CreateFile(_) => "create_file",
            Action::RemovePath(_) => "remove_path",
            Action::CopyPath(_) => "copy_path",
            Action::EditFile(_) => "edit_file",
            Action::FetchUri(_) => "fetch_uri",
            Action::PrintStr(_) => "print_str",
            Action::ChangeDir(_) => "cd",
            Action::KillProcess(_) => "kill_process",
            Action::Expect(_) => "expect",
            Action::SubProcedure(_) => "ttp",
            Action::Composite(_) => "composite",
            Action::RestoreDir(_) => "restore_dir",
            Action::SubCleanup(_) => "sub_cleanup",
        }
    }

    /// Whether the action may appear inside a generated composite.
    pub fn usable_inside_composite(&self) -> bool {
        matches!(
            self,
            Action::RemovePath(_) | Action::CopyPath(_) | Action::PrintStr(_)
        )
    }

    /// Whether a failed execute still owes its own cleanup before the
    /// general walk. Only sub-procedures: their successful child prefix
    /// must be rolled back.
    pub fn should_cleanup_on_failure(&self) -> bool {
        matches!(self, Action::SubProcedure(_))
    }

    /// The action generated for `cleanup: default`, if the kind has one.
    pub fn default_cleanup(&self, step_index: usize) -> Option<Action> {
        match self {
            Action::CreateFile(a) => Some(Action::RemovePath(RemovePathAction {
                path: a.path.clone(),
                recursive: false,
            })),
            Action::CopyPath(a) => Some(Action::RemovePath(RemovePathAction {
                path: a.destination.clone(),
                recursive: a.recursive,
            })),
            Action::EditFile(a) => {
                let backup = a.backup.clone()?;
                Some(Action::Composite(CompositeAction {
                    actions: vec![
                        Action::CopyPath(CopyPathAction {
                            source: backup.clone(),
                            destination: a.target.clone(),
                            recursive: false,
                            overwrite: true,
                            mode: None,
                        }),
                        Action::RemovePath(RemovePathAction {
                            path: backup,
                            recursive: false,
                        }),
                    ],
                }))
            }
            Action::ChangeDir(_) => Some(Action::RestoreDir(RestoreDirAction { step_index })),
            Action::SubProcedure(_) => Some(Action::SubCleanup(SubCleanupAction { step_index })),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
