//! `forge run`: sub-procedures and working-directory rollback

use crate::prelude::*;

#[test]
fn relative_sub_procedure_composes_output_and_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    write_ttp(
        dir.path(),
        "child.yaml",
        "\
name: child
steps:
  - name: e
    print_str: E
    cleanup:
      print_str: undo-e
  - name: c
    print_str: C
    cleanup:
      print_str: undo-c
",
    );
    let parent = write_ttp(
        dir.path(),
        "parent.yaml",
        "\
name: parent
steps:
  - name: a
    print_str: A
  - name: b
    print_str: B
  - name: d
    print_str: D
  - name: nested
    ttp: child.yaml
",
    );

    let output = forge().arg("run").arg(&parent).output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output),
        vec![
            "[STDOUT] A",
            "[STDOUT] B",
            "[STDOUT] D",
            "[STDOUT] E",
            "[STDOUT] C",
            "[STDOUT] undo-c",
            "[STDOUT] undo-e"
        ]
    );
}

#[test]
fn search_path_flag_resolves_sub_procedures() {
    let dir = tempfile::tempdir().unwrap();
    let library = dir.path().join("library");
    std::fs::create_dir(&library).unwrap();
    write_ttp(
        &library,
        "helper.yaml",
        "name: helper\nsteps:\n  - name: say\n    print_str: from-library\n",
    );
    let parent = write_ttp(
        dir.path(),
        "parent.yaml",
        "name: parent\nsteps:\n  - name: nested\n    ttp: helper.yaml\n",
    );

    let output = forge()
        .arg("run")
        .arg(&parent)
        .arg("--search-path")
        .arg(&library)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout_lines(&output).contains(&"[STDOUT] from-library".to_string()));
}

#[test]
fn nested_sub_procedures_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_ttp(
        dir.path(),
        "leaf.yaml",
        "name: leaf\nsteps:\n  - name: say\n    print_str: leaf\n",
    );
    write_ttp(
        dir.path(),
        "middle.yaml",
        "name: middle\nsteps:\n  - name: deeper\n    ttp: leaf.yaml\n",
    );
    let parent = write_ttp(
        dir.path(),
        "parent.yaml",
        "name: parent\nsteps:\n  - name: nested\n    ttp: middle.yaml\n",
    );

    let output = forge().arg("run").arg(&parent).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("may not contain sub-procedure steps"),
        "stderr: {stderr}"
    );
}

#[test]
fn change_directory_applies_to_later_steps_and_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().canonicalize().unwrap();
    std::fs::create_dir(base.join("sub")).unwrap();
    let ttp = write_ttp(
        &base,
        "mover.yaml",
        "\
name: mover
steps:
  - name: enter
    cd: sub
    cleanup: default
  - name: where
    inline: pwd
",
    );

    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(output.status.success());
    assert!(
        stdout_lines(&output)
            .contains(&format!("[STDOUT] {}", base.join("sub").display())),
        "stdout: {:?}",
        stdout_lines(&output)
    );
}
