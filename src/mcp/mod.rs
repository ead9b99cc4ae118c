//! MCP tool-server registry: catalog lookup and install resolution.
//!
//! Installed servers are stored records only; nothing here launches them.

mod catalog;

pub use catalog::{
    Catalog, CatalogEntry, CatalogSource, InstallRequest, McpRegistry, builtin_catalog,
};
