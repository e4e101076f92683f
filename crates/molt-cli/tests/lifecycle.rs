//! End-to-end lifecycle tests against the real `molt` binary.
//!
//! Each test runs the binary as a child process and checks what a parent
//! shell would observe: exit status, terminating signal, stdout and the
//! log lines on stderr.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, ChildStdout, Command, Output, Stdio};
use std::time::{Duration, Instant};

fn molt() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_molt"));
    cmd.env("RUST_LOG", "warn")
        .env_remove("MOLT_TRAP_SIGNALS")
        .env_remove("MOLT_RESTART_FAILURE_CODE")
        .env_remove("MOLT_EXECUTABLE");
    cmd
}

fn run(args: &[&str]) -> Output {
    molt().args(args).output().expect("failed to run molt")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn started_pids(lines: &[String]) -> Vec<u32> {
    lines
        .iter()
        .filter_map(|l| l.strip_prefix("started pid="))
        .map(|pid| pid.parse().expect("pid is a number"))
        .collect()
}

/// Read stdout lines until `ready` appears, returning everything read.
fn wait_ready(stdout: &mut BufReader<ChildStdout>) -> Vec<String> {
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        let n = stdout.read_line(&mut line).expect("read stdout");
        assert!(n > 0, "molt exited before becoming ready: {:?}", lines);
        let line = line.trim_end().to_string();
        let ready = line == "ready";
        lines.push(line);
        if ready {
            return lines;
        }
    }
}

fn send(child: &Child, signal: i32) {
    let rc = unsafe { libc::kill(child.id() as libc::pid_t, signal) };
    assert_eq!(rc, 0, "kill failed");
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::process::ExitStatus {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().expect("try_wait") {
            return status;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("molt did not exit within {:?}", timeout);
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn no_behavior_exits_normally() {
    let output = run(&[]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(started_pids(&stdout_lines(&output)).len(), 1);
}

#[test]
fn terminate_uses_configured_exit_code() {
    let output = run(&["--behavior", "terminate", "--exit-code", "7"]);
    assert_eq!(output.status.code(), Some(7));
}

#[test]
fn terminate_defaults_to_zero() {
    let output = run(&["--behavior", "terminate"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn restart_replaces_process_in_place() {
    let output = run(&[
        "--behavior",
        "restart",
        "--state-file",
        "new.json",
        "--with-state=old.json",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let lines = stdout_lines(&output);
    let pids = started_pids(&lines);
    assert_eq!(pids.len(), 2, "expected exactly one restart: {:?}", lines);
    assert_eq!(pids[0], pids[1], "restart must keep the process id");
    assert!(lines.contains(&"respawned state=new.json".to_string()));
}

#[test]
fn restart_logs_rebuilt_arguments() {
    let output = run(&[
        "--behavior",
        "restart",
        "--state-file",
        "new.json",
        "--with-state=old.json",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let stderr = stderr_text(&output);
    let line = stderr
        .lines()
        .find(|l| l.contains("Restarting process in place"))
        .unwrap_or_else(|| panic!("no restart warning in stderr: {stderr}"));
    assert!(line.contains("WARN"), "{line}");
    assert!(line.contains("\"--state-file\", \"new.json\""), "{line}");
    assert!(line.contains("\"--no-spawn\", \"--with-state=new.json\"]"), "{line}");
    assert!(!line.contains("old.json"), "{line}");
}

#[test]
fn restart_without_state_file_drops_old_state() {
    let output = run(&["--behavior", "restart", "--with-state=old.json"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_lines(&output).contains(&"respawned state=-".to_string()));
}

#[test]
fn respawned_instance_never_restarts_again() {
    let output = run(&["--behavior", "restart", "--no-spawn"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(started_pids(&stdout_lines(&output)).len(), 1);
}

#[test]
fn failed_restart_exits_with_failure_code() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[lifecycle]\nexecutable = \"/nonexistent/molt\"\nrestart_failure_code = 3"
    )
    .unwrap();

    let output = run(&[
        "--behavior",
        "restart",
        "--config",
        file.path().to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(started_pids(&stdout_lines(&output)).len(), 1);

    let stderr = stderr_text(&output);
    assert!(stderr.contains("Restart failed"), "{stderr}");
    assert!(stderr.contains("error="), "{stderr}");
    assert!(stderr.contains("exit_code=3"), "{stderr}");
}

#[test]
fn failed_restart_from_env_defaults_to_one() {
    let output = molt()
        .env("MOLT_EXECUTABLE", "/nonexistent/molt")
        .args(["--behavior", "restart"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let stderr = stderr_text(&output);
    assert!(stderr.contains("Restart failed"), "{stderr}");
    assert!(stderr.contains("error="), "{stderr}");
    assert!(stderr.contains("/nonexistent/molt"), "{stderr}");
}

#[test]
fn sigterm_triggers_terminate() {
    let mut child = molt()
        .args(["--behavior", "terminate", "--exit-code", "9", "--wait-for-signal"])
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    let mut stdout = BufReader::new(child.stdout.take().unwrap());
    wait_ready(&mut stdout);

    send(&child, libc::SIGTERM);
    let status = wait_with_timeout(&mut child, Duration::from_secs(10));
    assert_eq!(status.code(), Some(9));
}

#[test]
fn signal_without_behavior_keeps_default_disposition() {
    let mut child = molt()
        .args(["--wait-for-signal"])
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    let mut stdout = BufReader::new(child.stdout.take().unwrap());
    wait_ready(&mut stdout);

    send(&child, libc::SIGTERM);
    let status = wait_with_timeout(&mut child, Duration::from_secs(10));
    assert_eq!(status.code(), None);
    assert_eq!(status.signal(), Some(libc::SIGTERM));
}

#[test]
fn sigint_triggers_restart() {
    let mut child = molt()
        .args([
            "--behavior",
            "restart",
            "--state-file",
            "after.json",
            "--wait-for-signal",
        ])
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    let mut stdout = BufReader::new(child.stdout.take().unwrap());
    let first = wait_ready(&mut stdout);

    send(&child, libc::SIGINT);
    let second = wait_ready(&mut stdout);

    assert_eq!(started_pids(&first), started_pids(&second));
    assert_eq!(started_pids(&second), vec![child.id()]);
    assert!(second.contains(&"respawned state=after.json".to_string()));

    // The respawned instance has no behavior set.
    send(&child, libc::SIGTERM);
    let status = wait_with_timeout(&mut child, Duration::from_secs(10));
    assert_eq!(status.signal(), Some(libc::SIGTERM));
}
