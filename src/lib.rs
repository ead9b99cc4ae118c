pub mod cache;
pub mod config;
pub mod db;
pub mod dev;
pub mod error;
pub mod mcp;
pub mod providers;
pub mod server;
pub(crate) mod utils;

pub use error::WorkbenchError;
