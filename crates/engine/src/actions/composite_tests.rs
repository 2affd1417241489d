// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::capture_ctx;
use forge_core::FileSystem;
use forge_procedure::{Action, PrintStrAction, RemovePathAction};
use std::path::Path;

fn print(message: &str) -> Action {
    Action::PrintStr(PrintStrAction {
        message: message.to_string(),
    })
}

fn remove(path: &str) -> Action {
    Action::RemovePath(RemovePathAction {
        path: path.to_string(),
        recursive: false,
    })
}

#[tokio::test]
async fn children_run_in_order_and_outputs_concatenate() {
    let (mut ctx, fs, out, _err) = capture_ctx("/work");
    fs.seed_file("/work/a.txt", b"");
    let mut composite = CompositeAction {
        actions: vec![print("first"), remove("a.txt"), print("second")],
    };
    let result = execute(&mut composite, &mut ctx).await.unwrap();
    assert_eq!(result.stdout, "first\nsecond\n");
    assert_eq!(out.lines(), vec!["first", "second"]);
    assert!(!fs.exists(Path::new("/work/a.txt")));
}

#[tokio::test]
async fn first_failure_aborts_the_rest() {
    let (mut ctx, fs, out, _err) = capture_ctx("/work");
    let mut composite = CompositeAction {
        actions: vec![print("before"), remove("ghost.txt"), print("after")],
    };
    let err = execute(&mut composite, &mut ctx).await.unwrap_err();
    assert!(matches!(err, ActionError::SourceMissing(_)));
    assert_eq!(out.lines(), vec!["before"]);
    let _ = fs;
}
