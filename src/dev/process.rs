use serde::Serialize;
use std::{path::Path, process::Stdio, time::Duration, time::Instant};
use tokio::{process::Command, time::timeout};
use tracing::debug;

use crate::error::WorkbenchError;
use crate::utils::logging::truncate_chars;

/// Captured result of one child process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed (timeout or signal).
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub duration_ms: u64,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Runs `program args..` with piped output, killing it once `limit` elapses.
///
/// stdout and stderr are each cut to `max_output_chars` characters.
pub async fn run_process(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    limit: Duration,
    max_output_chars: usize,
) -> Result<ProcessOutput, WorkbenchError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let start = Instant::now();
    let child = cmd.spawn()?;
    let result = timeout(limit, child.wait_with_output()).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    let output = match result {
        Ok(output) => output?,
        Err(_) => {
            debug!(program, limit_ms = limit.as_millis() as u64, "process timed out");
            return Ok(ProcessOutput {
                stdout: String::new(),
                stderr: format!("timed out after {}s", limit.as_secs()),
                exit_code: None,
                timed_out: true,
                duration_ms,
            });
        }
    };

    Ok(ProcessOutput {
        stdout: truncate_chars(&String::from_utf8_lossy(&output.stdout), max_output_chars),
        stderr: truncate_chars(&String::from_utf8_lossy(&output.stderr), max_output_chars),
        exit_code: output.status.code(),
        timed_out: false,
        duration_ms,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_output_and_exit_code() {
        let out = run_process(
            "sh",
            &["-c", "echo out; echo err >&2; exit 3"],
            None,
            Duration::from_secs(5),
            1000,
        )
        .await
        .expect("run sh");

        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
        assert_eq!(out.exit_code, Some(3));
        assert!(!out.success());
    }

    #[tokio::test]
    async fn timeout_is_flagged() {
        let out = run_process("sh", &["-c", "sleep 5"], None, Duration::from_millis(200), 1000)
            .await
            .expect("run sh");

        assert!(out.timed_out);
        assert_eq!(out.exit_code, None);
        assert!(out.duration_ms < 5000);
    }

    #[tokio::test]
    async fn output_is_truncated() {
        let out = run_process("sh", &["-c", "printf abcdefghij"], None, Duration::from_secs(5), 4)
            .await
            .expect("run sh");

        assert_eq!(out.stdout, "abcd…[truncated]");
    }
}
