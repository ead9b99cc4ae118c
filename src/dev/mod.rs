//! Dev utilities: shell commands and notebook cells run as child processes.
//! Both are off unless enabled in the `dev` config table.

mod notebook;
mod process;
mod terminal;

pub use notebook::{
    CellResult, CellStatus, NotebookCell, NotebookOutput, NotebookRequest, execute_notebook,
};
pub use process::{ProcessOutput, run_process};
pub use terminal::{TerminalRequest, run_shell};
