use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Terminal and notebook execution. Both are off unless enabled explicitly.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DevConfig {
    /// TOML: `dev.enable_terminal`. Default: `false`.
    #[serde(default)]
    pub enable_terminal: bool,

    /// Shell used as `<shell> -c <command>`.
    /// TOML: `dev.shell`. Default: `sh`.
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Working directory when the request names none.
    /// TOML: `dev.working_dir`.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// TOML: `dev.terminal_timeout_secs`. Default: `30`.
    #[serde(default = "default_terminal_timeout_secs")]
    pub terminal_timeout_secs: u64,

    /// TOML: `dev.enable_notebook`. Default: `false`.
    #[serde(default)]
    pub enable_notebook: bool,

    /// Program and leading args; the cell source is appended as the last argument.
    /// TOML: `dev.notebook_kernel`. Default: `["python3", "-c"]`.
    #[serde(default = "default_notebook_kernel")]
    pub notebook_kernel: Vec<String>,

    /// Per-cell timeout.
    /// TOML: `dev.notebook_timeout_secs`. Default: `60`.
    #[serde(default = "default_notebook_timeout_secs")]
    pub notebook_timeout_secs: u64,

    /// stdout/stderr are cut to this many characters each.
    /// TOML: `dev.max_output_chars`. Default: `50000`.
    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            enable_terminal: false,
            shell: default_shell(),
            working_dir: None,
            terminal_timeout_secs: default_terminal_timeout_secs(),
            enable_notebook: false,
            notebook_kernel: default_notebook_kernel(),
            notebook_timeout_secs: default_notebook_timeout_secs(),
            max_output_chars: default_max_output_chars(),
        }
    }
}

impl DevConfig {
    pub fn terminal_timeout(&self) -> Duration {
        Duration::from_secs(self.terminal_timeout_secs.max(1))
    }

    pub fn notebook_timeout(&self) -> Duration {
        Duration::from_secs(self.notebook_timeout_secs.max(1))
    }
}

fn default_shell() -> String {
    "sh".to_string()
}

fn default_terminal_timeout_secs() -> u64 {
    30
}

fn default_notebook_kernel() -> Vec<String> {
    vec!["python3".to_string(), "-c".to_string()]
}

fn default_notebook_timeout_secs() -> u64 {
    60
}

fn default_max_output_chars() -> usize {
    50_000
}
