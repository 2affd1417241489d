//! Shared helpers for CLI specs

use std::path::{Path, PathBuf};

/// The forge binary, ready to configure.
pub fn forge() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("forge").unwrap()
}

/// Write a TTP file into the test directory.
pub fn write_ttp(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Lines of captured stdout.
pub fn stdout_lines(output: &std::process::Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}
