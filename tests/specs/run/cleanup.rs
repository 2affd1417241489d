//! `forge run`: rollback ordering and the no-cleanup flag

use crate::prelude::*;

const REVERSE_TTP: &str = "\
name: reverse
steps:
  - name: one
    print_str: A
    cleanup:
      print_str: undo-one
  - name: two
    print_str: B
    cleanup:
      print_str: undo-two
";

#[test]
fn cleanups_run_in_reverse_order() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(dir.path(), "reverse.yaml", REVERSE_TTP);

    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output),
        vec![
            "[STDOUT] A",
            "[STDOUT] B",
            "[STDOUT] undo-two",
            "[STDOUT] undo-one"
        ]
    );
}

#[test]
fn no_cleanup_leaves_side_effects_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let dropped = dir.path().join("dropped.txt");
    let ttp = write_ttp(
        dir.path(),
        "keep.yaml",
        &format!(
            "name: keep\nsteps:\n  - name: drop\n    create_file: {}\n    contents: payload\n    cleanup: default\n",
            dropped.display()
        ),
    );

    let output = forge().arg("run").arg(&ttp).arg("--no-cleanup").output().unwrap();
    assert!(output.status.success());
    assert_eq!(std::fs::read_to_string(&dropped).unwrap(), "payload");
}

#[test]
fn default_cleanup_removes_created_files() {
    let dir = tempfile::tempdir().unwrap();
    let dropped = dir.path().join("dropped.txt");
    let ttp = write_ttp(
        dir.path(),
        "drop.yaml",
        &format!(
            "name: dropper\nsteps:\n  - name: drop\n    create_file: {}\n    contents: payload\n    cleanup: default\n",
            dropped.display()
        ),
    );

    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(output.status.success());
    assert!(!dropped.exists());
}

#[test]
fn failure_still_cleans_the_executed_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let dropped = dir.path().join("dropped.txt");
    let ttp = write_ttp(
        dir.path(),
        "partial.yaml",
        &format!(
            "name: partial\nsteps:\n  - name: drop\n    create_file: {}\n    contents: payload\n    cleanup: default\n  - name: boom\n    inline: 'false'\n",
            dropped.display()
        ),
    );

    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(!output.status.success());
    assert!(!dropped.exists());
}
