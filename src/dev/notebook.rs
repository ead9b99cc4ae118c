use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

use super::process::run_process;
use crate::config::DevConfig;
use crate::error::WorkbenchError;

#[derive(Debug, Clone, Deserialize)]
pub struct NotebookCell {
    pub source: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotebookRequest {
    pub cells: Vec<NotebookCell>,
    /// Defaults to `true`.
    #[serde(default)]
    pub stop_on_error: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    Ok,
    Error,
    TimedOut,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellResult {
    pub index: usize,
    pub status: CellStatus,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl CellResult {
    fn skipped(index: usize) -> Self {
        Self {
            index,
            status: CellStatus::Skipped,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            duration_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotebookOutput {
    /// True when every cell finished with exit code 0.
    pub ok: bool,
    pub cells: Vec<CellResult>,
    pub duration_ms: u64,
}

/// Runs each cell as `<kernel..> <source>`, one process per cell, in order.
pub async fn execute_notebook(
    cfg: &DevConfig,
    req: &NotebookRequest,
) -> Result<NotebookOutput, WorkbenchError> {
    if !cfg.enable_notebook {
        return Err(WorkbenchError::FeatureDisabled("notebook"));
    }
    if req.cells.is_empty() {
        return Err(WorkbenchError::Validation("cells must not be empty".to_string()));
    }
    let Some((program, kernel_args)) = cfg.notebook_kernel.split_first() else {
        return Err(WorkbenchError::UnexpectedError(
            "notebook kernel command is empty".to_string(),
        ));
    };
    let stop_on_error = req.stop_on_error.unwrap_or(true);

    let start = Instant::now();
    let mut cells = Vec::with_capacity(req.cells.len());
    let mut failed = false;

    for (index, cell) in req.cells.iter().enumerate() {
        if failed && stop_on_error {
            cells.push(CellResult::skipped(index));
            continue;
        }

        let mut args: Vec<&str> = kernel_args.iter().map(String::as_str).collect();
        args.push(cell.source.as_str());

        let result = match run_process(
            program,
            &args,
            cfg.working_dir.as_deref(),
            cfg.notebook_timeout(),
            cfg.max_output_chars,
        )
        .await
        {
            Ok(out) => CellResult {
                index,
                status: if out.timed_out {
                    CellStatus::TimedOut
                } else if out.success() {
                    CellStatus::Ok
                } else {
                    CellStatus::Error
                },
                stdout: out.stdout,
                stderr: out.stderr,
                exit_code: out.exit_code,
                duration_ms: out.duration_ms,
            },
            // Kernel missing or not executable.
            Err(WorkbenchError::IoError(e)) => CellResult {
                index,
                status: CellStatus::Error,
                stdout: String::new(),
                stderr: format!("failed to start kernel {program}: {e}"),
                exit_code: None,
                duration_ms: 0,
            },
            Err(other) => return Err(other),
        };

        failed |= result.status != CellStatus::Ok;
        cells.push(result);
    }

    let ok = cells.iter().all(|c| c.status == CellStatus::Ok);
    let duration_ms = start.elapsed().as_millis() as u64;
    info!(cells = cells.len(), ok, duration_ms, "notebook executed");

    Ok(NotebookOutput {
        ok,
        cells,
        duration_ms,
    })
}
