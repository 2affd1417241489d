//! `forge run`: execution, arguments, and parse failures

use crate::prelude::*;

#[test]
fn home_expansion_round_trips_through_the_shell() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(
        dir.path(),
        "home.yaml",
        "name: home_probe\nsteps:\n  - name: show\n    inline: echo -n $HOME\n",
    );

    let home = dirs::home_dir().unwrap();
    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert!(
        lines.contains(&format!("[STDOUT] {}", home.display())),
        "stdout was: {lines:?}"
    );
}

#[test]
fn process_output_is_mirrored_with_stream_prefixes() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(
        dir.path(),
        "streams.yaml",
        "name: streams\nsteps:\n  - name: both\n    inline: \"echo out-line\\necho err-line 1>&2\"\n",
    );

    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(output.status.success());
    assert!(stdout_lines(&output).contains(&"[STDOUT] out-line".to_string()));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[STDERR] err-line"), "stderr was: {stderr}");
}

#[test]
fn args_render_into_the_procedure() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(
        dir.path(),
        "args.yaml",
        "name: argy\nargs:\n  - name: target\nsteps:\n  - name: say\n    print_str: 'target={{args.target}}'\n",
    );

    let output = forge()
        .arg("run")
        .arg(&ttp)
        .args(["--arg", "target=10.1.2.3"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout_lines(&output).contains(&"[STDOUT] target=10.1.2.3".to_string()));
}

#[test]
fn missing_required_arg_fails_before_execution() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran.txt");
    let ttp = write_ttp(
        dir.path(),
        "required.yaml",
        &format!(
            "name: argy\nargs:\n  - name: target\nsteps:\n  - name: mark\n    create_file: {}\n    contents: ran\n",
            marker.display()
        ),
    );

    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(!output.status.success());
    assert!(!marker.exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing required argument"), "stderr: {stderr}");
}

#[test]
fn ambiguous_step_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(
        dir.path(),
        "ambiguous.yaml",
        "name: ambiguous\nsteps:\n  - name: both\n    inline: ls\n    print_str: hi\n",
    );

    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("step #1 has ambiguous type"),
        "stderr: {stderr}"
    );
}

#[test]
fn failing_step_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let ttp = write_ttp(
        dir.path(),
        "fails.yaml",
        "name: fails\nsteps:\n  - name: boom\n    inline: exit 9\n",
    );

    let output = forge().arg("run").arg(&ttp).output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn dry_run_validates_without_executing() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran.txt");
    let ttp = write_ttp(
        dir.path(),
        "dry.yaml",
        &format!(
            "name: dry\nsteps:\n  - name: mark\n    create_file: {}\n    contents: ran\n",
            marker.display()
        ),
    );

    let output = forge().arg("run").arg(&ttp).arg("--dry-run").output().unwrap();
    assert!(output.status.success());
    assert!(!marker.exists());
    assert!(stdout_lines(&output).contains(&"dry: validation passed".to_string()));
}

#[test]
fn missing_file_reports_a_load_error() {
    let output = forge().arg("run").arg("/nonexistent/ttp.yaml").output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load"), "stderr: {stderr}");
}
