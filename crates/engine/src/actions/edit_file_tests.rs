// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::mem_ctx;
use forge_core::FileSystem;
use forge_procedure::Edit;
use std::path::Path;

fn replace(old: &str, new: &str) -> Edit {
    Edit {
        old: Some(old.to_string()),
        new: Some(new.to_string()),
        ..Edit::default()
    }
}

fn action(target: &str, edits: Vec<Edit>) -> EditFileAction {
    EditFileAction {
        target: target.to_string(),
        backup: None,
        edits,
    }
}

#[test]
fn applies_replacements_in_order() {
    let (mut ctx, fs) = mem_ctx("/work");
    fs.seed_file("/work/conf", b"foo\nanother");
    execute(
        &action("conf", vec![replace("foo", "yolo"), replace("another", "one")]),
        &mut ctx,
    )
    .unwrap();
    assert_eq!(fs.read(Path::new("/work/conf")).unwrap(), b"yolo\none");
}

#[test]
fn replace_matches_the_current_buffer_not_the_original() {
    let (mut ctx, fs) = mem_ctx("/work");
    fs.seed_file("/work/conf", b"aaa");
    // second edit matches text produced by the first
    execute(
        &action("conf", vec![replace("aaa", "bbb"), replace("bbb", "ccc")]),
        &mut ctx,
    )
    .unwrap();
    assert_eq!(fs.read(Path::new("/work/conf")).unwrap(), b"ccc");
}

#[test]
fn identity_replace_is_idempotent() {
    let (mut ctx, fs) = mem_ctx("/work");
    fs.seed_file("/work/conf", b"stable text");
    let edits = vec![replace("stable", "stable")];
    execute(&action("conf", edits.clone()), &mut ctx).unwrap();
    execute(&action("conf", edits), &mut ctx).unwrap();
    assert_eq!(fs.read(Path::new("/work/conf")).unwrap(), b"stable text");
}

#[test]
fn unmatched_pattern_fails_with_the_exact_message() {
    let (mut ctx, fs) = mem_ctx("/work");
    fs.seed_file("/tmp/a.txt", b"contents");
    let err = execute(
        &action("/tmp/a.txt", vec![replace("ghost", "x")]),
        &mut ctx,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "pattern 'ghost' from edit #1 was not found in file /tmp/a.txt"
    );
}

#[test]
fn edit_numbers_are_one_based_in_errors() {
    let (mut ctx, fs) = mem_ctx("/work");
    fs.seed_file("/work/conf", b"first");
    let err = execute(
        &action("conf", vec![replace("first", "1st"), replace("ghost", "x")]),
        &mut ctx,
    )
    .unwrap_err();
    assert!(err.to_string().contains("from edit #2"));
}

#[test]
fn regexp_replace_uses_regex_semantics() {
    let (mut ctx, fs) = mem_ctx("/work");
    fs.seed_file("/work/conf", b"port=1111\nport=2222");
    let edit = Edit {
        old: Some(r"port=\d+".to_string()),
        new: Some("port=9999".to_string()),
        regexp: true,
        ..Edit::default()
    };
    execute(&action("conf", vec![edit]), &mut ctx).unwrap();
    assert_eq!(
        fs.read(Path::new("/work/conf")).unwrap(),
        b"port=9999\nport=9999"
    );
}

#[test]
fn delete_removes_every_occurrence() {
    let (mut ctx, fs) = mem_ctx("/work");
    fs.seed_file("/work/conf", b"keep DEBUG keep DEBUG");
    let edit = Edit {
        delete: Some("DEBUG".to_string()),
        ..Edit::default()
    };
    execute(&action("conf", vec![edit]), &mut ctx).unwrap();
    assert_eq!(fs.read(Path::new("/work/conf")).unwrap(), b"keep  keep ");
}

#[test]
fn append_adds_newline_then_text() {
    let (mut ctx, fs) = mem_ctx("/work");
    fs.seed_file("/work/conf", b"line1");
    let edit = Edit {
        append: Some("line2".to_string()),
        ..Edit::default()
    };
    execute(&action("conf", vec![edit]), &mut ctx).unwrap();
    assert_eq!(fs.read(Path::new("/work/conf")).unwrap(), b"line1\nline2");
}

#[test]
fn backup_receives_original_bytes_before_edits() {
    let (mut ctx, fs) = mem_ctx("/work");
    fs.seed_file("/work/conf", b"foo\nanother");
    let mut action = action("conf", vec![replace("foo", "yolo")]);
    action.backup = Some("/tmp/conf.bak".to_string());
    execute(&action, &mut ctx).unwrap();
    assert_eq!(fs.read(Path::new("/work/conf")).unwrap(), b"yolo\nanother");
    assert_eq!(
        fs.read(Path::new("/tmp/conf.bak")).unwrap(),
        b"foo\nanother"
    );
}

#[test]
fn missing_target_fails() {
    let (mut ctx, _fs) = mem_ctx("/work");
    let err = execute(&action("ghost", vec![replace("a", "b")]), &mut ctx).unwrap_err();
    assert!(matches!(err, ActionError::Fs(_)));
}
