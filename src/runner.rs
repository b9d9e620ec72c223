use anyhow::{Context, Result};
use std::process::{Command, Output, Stdio};

/// Run a command and capture its raw output
pub fn output(cmd: &str, args: &[&str]) -> Result<Output> {
    log::trace!("exec: {cmd} {}", args.join(" "));
    Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))
}

/// Run a command and capture output
pub fn run_capture(cmd: &str, args: &[&str]) -> Result<String> {
    let output = output(cmd, args)?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("{} {} failed: {}", cmd, args.join(" "), stderr.trim())
    }
}

/// Run a command, failing with its stderr when it exits non-zero
pub fn run_checked(cmd: &str, args: &[&str]) -> Result<()> {
    run_capture(cmd, args).map(|_| ())
}

/// Run a command silently, returning success/failure
pub fn run_quiet(cmd: &str, args: &[&str]) -> bool {
    Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run a shell command line through `sh -c`
pub fn run_shell(command: &str) -> Result<String> {
    run_capture("sh", &["-c", command])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_shell_captures_stdout() {
        assert_eq!(run_shell("echo hello").unwrap(), "hello");
    }

    #[test]
    fn test_run_shell_reports_stderr() {
        let err = run_shell("echo boom >&2; exit 3").unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_run_quiet_reports_status() {
        assert!(run_quiet("sh", &["-c", "exit 0"]));
        assert!(!run_quiet("sh", &["-c", "exit 1"]));
        assert!(!run_quiet("definitely-not-a-real-command-xyz", &[]));
    }
}
