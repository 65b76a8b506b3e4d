use assert_cmd::Command;
use predicates::prelude::*;
use std::time::Duration;

fn debugger() -> Command {
    let mut cmd = Command::cargo_bin("bfdbg").unwrap();
    cmd.timeout(Duration::from_secs(5)).env_remove("BFDBG_MODE").arg("debug");
    cmd
}

#[test]
fn breakpoint_then_print_then_quit() {
    debugger()
        .arg("tests/programs/hello.bf")
        .write_stdin("break 94\nrun\nprint 0\ncontinue\nquit\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Breakpoint #1 at position 94")
            .and(predicate::str::contains("Running program: tests/programs/hello.bf"))
            .and(predicate::str::contains("Hello Worl\nBreakpoint hit at position 94"))
            .and(predicate::str::contains("$0 = 0 (0x00000000)"))
            .and(predicate::str::contains("Program exited")));
}

#[test]
fn watchpoint_reports_address_value_and_condition() {
    let tf = {
        use std::io::Write;
        let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
        write!(tf, "++>>+<<<++++++++++++++++>>>").unwrap();
        tf
    };
    debugger()
        .write_stdin(format!("file {}\nwatch -1>5\nrun\np -1\n", tf.path().display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("Watchpoint #1: $-1 > 5")
            .and(predicate::str::contains("Watchpoint hit at position 14: $-1 = 6 (> 5)"))
            .and(predicate::str::contains("$-1 = 6 (0x00000006)")));
}

#[test]
fn protocol_faults_are_recovered() {
    debugger()
        .write_stdin("frobnicate\nnext\nbreak\nbreak nope\n\nclear 4\nhelp\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Undefined command: \"frobnicate\".")
            .and(predicate::str::contains("Program is not running!"))
            .and(predicate::str::contains("Usage: break <pos>"))
            .and(predicate::str::contains("Breakpoint must be a non-negative integer!"))
            .and(predicate::str::contains("A breakpoint does not exist at position 4"))
            .and(predicate::str::contains("r, run -- Run the program")));
}

#[test]
fn run_without_program_is_not_fatal() {
    debugger()
        .write_stdin("run\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No program loaded!"));
}

#[test]
fn declined_quit_keeps_session() {
    debugger()
        .write_stdin("q\nn\ninfo\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Program: <none> (no program)"));
}

#[test]
fn unbalanced_program_ends_session_with_error() {
    let tf = {
        use std::io::Write;
        let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
        write!(tf, "+]").unwrap();
        tf
    };
    debugger()
        .arg(tf.path())
        .write_stdin("run\ninfo\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Parse error: unmatched bracket ']' at instruction 1")
            .and(predicate::str::contains("  +]\n   ^")))
        .stdout(predicate::str::contains("Program:").not());
}

#[test]
fn bare_mode_shows_confirmation_questions() {
    let tf = {
        use std::io::Write;
        let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
        write!(tf, "++++").unwrap();
        tf
    };
    debugger()
        .arg("--bare")
        .arg(tf.path())
        .write_stdin("b 2\nrun\nrun\nn\nnext\ninfo\nquit\ny\n")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Program is already running, do you want to start from the beginning (y/n)? ",
        )
        .and(predicate::str::contains("Are you sure you want to quit (y/n)? ")))
        .stdout(predicate::str::contains("Position 3 of 4, pointer at $0, 3 steps"));
}

#[test]
fn fatal_fault_in_session_is_reported_once() {
    let tf = {
        use std::io::Write;
        let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
        write!(tf, "+[<+]").unwrap();
        tf
    };
    let out = debugger()
        .env_remove("RUST_LOG")
        .arg("--bare")
        .arg(tf.path())
        .write_stdin("run\n")
        .output()
        .expect("run bfdbg");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert_eq!(stderr.lines().count(), 1, "stderr was: {stderr:?}");
    assert!(!stderr.contains('\x1b'));
    assert!(stderr.contains("pointer out of bounds"));
}

#[test]
fn editor_on_non_tty_is_error_exit_1() {
    Command::cargo_bin("bfdbg").unwrap()
        .arg("debug")
        .arg("--editor")
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("stdin is not a TTY"));
}

#[test]
fn invalid_mode_env_is_rejected() {
    Command::cargo_bin("bfdbg").unwrap()
        .env("BFDBG_MODE", "fancy")
        .arg("debug")
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid BFDBG_MODE value"));
}

#[test]
fn bare_flag_overrides_env() {
    Command::cargo_bin("bfdbg").unwrap()
        .env("BFDBG_MODE", "editor")
        .arg("debug")
        .arg("--bare")
        .write_stdin("help\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("List of commands:"));
}
