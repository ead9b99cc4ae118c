use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

use super::process::{ProcessOutput, run_process};
use crate::config::DevConfig;
use crate::error::WorkbenchError;

#[derive(Debug, Clone, Deserialize)]
pub struct TerminalRequest {
    pub command: String,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

/// Runs `<shell> -c <command>` under the configured timeout.
pub async fn run_shell(cfg: &DevConfig, req: &TerminalRequest) -> Result<ProcessOutput, WorkbenchError> {
    if !cfg.enable_terminal {
        return Err(WorkbenchError::FeatureDisabled("terminal"));
    }
    let command = req.command.trim();
    if command.is_empty() {
        return Err(WorkbenchError::Validation("command must not be empty".to_string()));
    }

    let cwd = req.cwd.as_ref().or(cfg.working_dir.as_ref());
    if let Some(dir) = cwd
        && !dir.is_dir()
    {
        return Err(WorkbenchError::Validation(format!(
            "cwd {} is not a directory",
            dir.display()
        )));
    }

    let out = run_process(
        &cfg.shell,
        &["-c", command],
        cwd.map(PathBuf::as_path),
        cfg.terminal_timeout(),
        cfg.max_output_chars,
    )
    .await?;

    info!(
        exit_code = ?out.exit_code,
        timed_out = out.timed_out,
        duration_ms = out.duration_ms,
        "terminal command finished"
    );
    Ok(out)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn enabled() -> DevConfig {
        DevConfig {
            enable_terminal: true,
            ..DevConfig::default()
        }
    }

    fn request(command: &str) -> TerminalRequest {
        TerminalRequest {
            command: command.to_string(),
            cwd: None,
        }
    }

    #[tokio::test]
    async fn disabled_by_default() {
        let err = run_shell(&DevConfig::default(), &request("echo hi"))
            .await
            .expect_err("disabled");
        assert!(matches!(err, WorkbenchError::FeatureDisabled("terminal")));
    }

    #[tokio::test]
    async fn blank_command_and_missing_cwd_are_rejected() {
        let err = run_shell(&enabled(), &request("   ")).await.expect_err("blank");
        assert!(matches!(err, WorkbenchError::Validation(_)));

        let req = TerminalRequest {
            command: "pwd".to_string(),
            cwd: Some(PathBuf::from("/definitely/not/here")),
        };
        let err = run_shell(&enabled(), &req).await.expect_err("bad cwd");
        assert!(matches!(err, WorkbenchError::Validation(_)));
    }

    #[tokio::test]
    async fn runs_in_requested_cwd() {
        let dir = std::env::temp_dir();
        let req = TerminalRequest {
            command: "pwd".to_string(),
            cwd: Some(dir.clone()),
        };
        let out = run_shell(&enabled(), &req).await.expect("run");
        assert!(out.success());
        let reported = PathBuf::from(out.stdout.trim());
        assert_eq!(
            reported.canonicalize().ok(),
            dir.canonicalize().ok()
        );
    }
}
