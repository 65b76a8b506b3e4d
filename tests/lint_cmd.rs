use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn cargo_bin() -> Command { Command::cargo_bin("bfdbg").unwrap() }

fn program_file(content: &str) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();
    tf
}

#[test]
fn lint_strips_comments_without_executing() {
    let tf = program_file("add two: ++ then print .\n[-] done, bye\n");
    cargo_bin()
        .arg("lint").arg(tf.path())
        .assert()
        .success()
        .stdout("++.[-],\n");
}

#[test]
fn lint_rejects_unbalanced_program() {
    let tf = program_file("[[]");
    cargo_bin()
        .arg("lint").arg(tf.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unmatched bracket '['"));
}

#[test]
fn top_level_help_lists_subcommands() {
    cargo_bin()
        .arg("--help")
        .assert()
        .success()
        .stderr(predicate::str::contains("lint").and(predicate::str::contains("debug")));
}

#[test]
fn no_subcommand_is_usage_error() {
    cargo_bin()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}
