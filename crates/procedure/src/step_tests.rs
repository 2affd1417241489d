// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::parser::ParseError;

fn value(yaml: &str) -> serde_yaml::Value {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn minimal_inline_step_parses() {
    let step = Step::parse(&value("name: probe\ninline: whoami"), 1).unwrap();
    assert_eq!(step.name, "probe");
    match step.action {
        Action::Basic(basic) => {
            assert_eq!(basic.inline, "whoami");
            assert!(basic.executor.is_none());
        }
        other => panic!("expected Basic, got: {other:?}"),
    }
    assert!(matches!(step.cleanup, CleanupSpec::Unspecified));
    assert!(step.cleanup_action.is_none());
}

#[test]
fn two_action_keys_are_ambiguous() {
    let err = Step::parse(&value("name: bad\ninline: ls\nprint_str: hi"), 2).unwrap_err();
    assert_eq!(err.to_string(), "step #2 has ambiguous type");
}

#[test]
fn kill_pair_counts_as_one_action() {
    let step = Step::parse(
        &value("name: reap\nkill_process_id: 42\nkill_process_name: beacon"),
        1,
    )
    .unwrap();
    match step.action {
        Action::KillProcess(kill) => {
            assert_eq!(kill.pid.as_deref(), Some("42"));
            assert_eq!(kill.name.as_deref(), Some("beacon"));
        }
        other => panic!("expected KillProcess, got: {other:?}"),
    }
}

#[test]
fn step_without_action_key_is_rejected() {
    let err = Step::parse(&value("name: empty"), 3).unwrap_err();
    assert_eq!(err.to_string(), "step #3 has no recognized action type");
}

#[test]
fn step_without_name_is_rejected() {
    let err = Step::parse(&value("inline: ls"), 1).unwrap_err();
    assert!(matches!(err, ParseError::MissingStepName { index: 1 }));
}

#[test]
fn whitespace_in_step_name_is_rejected() {
    let err = Step::parse(&value("name: two words\ninline: ls"), 1).unwrap_err();
    assert!(matches!(err, ParseError::InvalidStepName(_)));
}

#[test]
fn unknown_step_key_is_rejected() {
    let err = Step::parse(&value("name: x\ninline: ls\nbogus: 1"), 1).unwrap_err();
    assert!(matches!(err, ParseError::InvalidStep { index: 1, .. }));
}

#[test]
fn copy_path_requires_destination() {
    let err = Step::parse(&value("name: cp\ncopy_path: /src"), 1).unwrap_err();
    assert!(matches!(err, ParseError::InvalidStep { .. }));
}

#[test]
fn copy_path_full_form() {
    let step = Step::parse(
        &value("name: cp\ncopy_path: /src\nto: /dst\nrecursive: true\noverwrite: true"),
        1,
    )
    .unwrap();
    match step.action {
        Action::CopyPath(copy) => {
            assert_eq!(copy.source, "/src");
            assert_eq!(copy.destination, "/dst");
            assert!(copy.recursive);
            assert!(copy.overwrite);
        }
        other => panic!("expected CopyPath, got: {other:?}"),
    }
}

#[test]
fn create_file_with_mode_and_contents() {
    let step = Step::parse(
        &value("name: drop\ncreate_file: /tmp/f\ncontents: payload\nmode: 600"),
        1,
    )
    .unwrap();
    match step.action {
        Action::CreateFile(create) => {
            assert_eq!(create.path, "/tmp/f");
            assert_eq!(create.contents, "payload");
            assert_eq!(create.mode, Some(FileMode(0o600)));
            assert!(!create.overwrite);
        }
        other => panic!("expected CreateFile, got: {other:?}"),
    }
}

#[test]
fn edit_file_collects_edits_and_backup() {
    let yaml = r"
name: patch
edit_file: /etc/conf
backup_file: /tmp/conf.bak
edits:
  - old: foo
    new: bar
  - append: trailer
";
    let step = Step::parse(&value(yaml), 1).unwrap();
    match step.action {
        Action::EditFile(edit) => {
            assert_eq!(edit.target, "/etc/conf");
            assert_eq!(edit.backup.as_deref(), Some("/tmp/conf.bak"));
            assert_eq!(edit.edits.len(), 2);
            assert_eq!(edit.edits[0].old.as_deref(), Some("foo"));
            assert_eq!(edit.edits[1].append.as_deref(), Some("trailer"));
        }
        other => panic!("expected EditFile, got: {other:?}"),
    }
}

#[test]
fn expect_block_parses_responses_in_order() {
    let yaml = r"
name: interactive
expect:
  inline: ./setup.sh
  responses:
    - prompt: 'Continue?'
      response: yes
    - prompt: 'Password:'
      response: hunter2
  timeout_seconds: 30
";
    let step = Step::parse(&value(yaml), 1).unwrap();
    match step.action {
        Action::Expect(expect) => {
            assert_eq!(expect.inline, "./setup.sh");
            assert_eq!(expect.responses.len(), 2);
            assert_eq!(expect.responses[0].prompt, "Continue?");
            assert_eq!(expect.timeout_seconds, Some(30));
        }
        other => panic!("expected Expect, got: {other:?}"),
    }
}

#[test]
fn ttp_step_converts_scalar_args() {
    let yaml = r"
name: nested
ttp: helpers/drop.yaml
args:
  target: /tmp/x
  count: 3
  force: true
";
    let step = Step::parse(&value(yaml), 1).unwrap();
    match step.action {
        Action::SubProcedure(sub) => {
            assert_eq!(sub.ttp, "helpers/drop.yaml");
            assert_eq!(sub.args["target"], "/tmp/x");
            assert_eq!(sub.args["count"], "3");
            assert_eq!(sub.args["force"], "true");
        }
        other => panic!("expected SubProcedure, got: {other:?}"),
    }
}

// =============================================================================
// Cleanup specifiers
// =============================================================================

#[test]
fn cleanup_default_literal() {
    let step = Step::parse(&value("name: drop\ncreate_file: /tmp/f\ncleanup: default"), 1)
        .unwrap();
    assert!(matches!(step.cleanup, CleanupSpec::Default));
}

#[test]
fn cleanup_nested_step_document() {
    let yaml = "name: drop\ncreate_file: /tmp/f\ncleanup:\n  inline: rm -f /tmp/f";
    let step = Step::parse(&value(yaml), 1).unwrap();
    match step.cleanup {
        CleanupSpec::Explicit(action) => assert!(matches!(*action, Action::Basic(_))),
        other => panic!("expected Explicit, got: {other:?}"),
    }
}

#[test]
fn cleanup_list_of_step_documents() {
    let yaml = r"
name: drop
create_file: /tmp/f
cleanup:
  - remove_path: /tmp/f
  - print_str: removed
";
    let step = Step::parse(&value(yaml), 1).unwrap();
    match step.cleanup {
        CleanupSpec::List(actions) => {
            assert_eq!(actions.len(), 2);
            assert!(matches!(actions[0], Action::RemovePath(_)));
            assert!(matches!(actions[1], Action::PrintStr(_)));
        }
        other => panic!("expected List, got: {other:?}"),
    }
}

#[test]
fn cleanup_cannot_nest_cleanup() {
    let yaml = "name: drop\ncreate_file: /tmp/f\ncleanup:\n  remove_path: /tmp/f\n  cleanup: default";
    let err = Step::parse(&value(yaml), 1).unwrap_err();
    assert!(matches!(err, ParseError::InvalidCleanup { .. }));
}

#[test]
fn cleanup_other_scalar_is_invalid() {
    let err = Step::parse(&value("name: x\ninline: ls\ncleanup: nonsense"), 1).unwrap_err();
    assert!(matches!(err, ParseError::InvalidCleanup { .. }));
}
