mod workbench;

pub use workbench::{ApiErrorBody, ApiErrorObject, WorkbenchError};
