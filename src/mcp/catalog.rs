use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc};
use tracing::info;

use crate::cache::{CacheLayer, CacheTier};
use crate::config::RegistryConfig;
use crate::db::McpServerCreate;
use crate::error::WorkbenchError;
use crate::providers::success_bytes;

const CATALOG_CACHE_KEY: &str = "mcp:catalog";

/// One installable MCP server as advertised by a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables the server expects; values are placeholders.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    Builtin,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub servers: Vec<CatalogEntry>,
    #[serde(default = "remote_source")]
    pub source: CatalogSource,
}

fn remote_source() -> CatalogSource {
    CatalogSource::Remote
}

impl Catalog {
    pub fn find(&self, name: &str) -> Option<&CatalogEntry> {
        self.servers.iter().find(|s| s.name == name)
    }
}

fn entry(name: &str, description: &str, command: &str, args: &[&str], env: &[&str]) -> CatalogEntry {
    CatalogEntry {
        name: name.to_string(),
        description: Some(description.to_string()),
        command: Some(command.to_string()),
        args: args.iter().map(|a| (*a).to_string()).collect(),
        env: env
            .iter()
            .map(|k| ((*k).to_string(), String::new()))
            .collect(),
        extra: BTreeMap::new(),
    }
}

/// Common reference servers, used when no remote registry is configured.
pub fn builtin_catalog() -> Catalog {
    Catalog {
        servers: vec![
            entry(
                "filesystem",
                "Read and write files under allowed directories",
                "npx",
                &["-y", "@modelcontextprotocol/server-filesystem"],
                &[],
            ),
            entry(
                "fetch",
                "Fetch web pages and convert them to markdown",
                "uvx",
                &["mcp-server-fetch"],
                &[],
            ),
            entry(
                "git",
                "Inspect and operate on local git repositories",
                "uvx",
                &["mcp-server-git"],
                &[],
            ),
            entry(
                "github",
                "GitHub repositories, issues and pull requests",
                "npx",
                &["-y", "@modelcontextprotocol/server-github"],
                &["GITHUB_PERSONAL_ACCESS_TOKEN"],
            ),
            entry(
                "memory",
                "Knowledge-graph based persistent memory",
                "npx",
                &["-y", "@modelcontextprotocol/server-memory"],
                &[],
            ),
        ],
        source: CatalogSource::Builtin,
    }
}

/// Install request for `POST /api/registry/installed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallRequest {
    pub name: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Clone)]
pub struct McpRegistry {
    http: reqwest::Client,
    cfg: Arc<RegistryConfig>,
    cache: CacheLayer,
}

impl McpRegistry {
    pub fn new(http: reqwest::Client, cfg: Arc<RegistryConfig>, cache: CacheLayer) -> Self {
        Self { http, cfg, cache }
    }

    /// Remote catalog through the long cache tier, or the built-in one.
    pub async fn catalog(&self) -> Result<Catalog, WorkbenchError> {
        let Some(url) = self.cfg.url.clone() else {
            return Ok(builtin_catalog());
        };

        self.cache
            .get_or_compute(CacheTier::Long, CATALOG_CACHE_KEY, || async move {
                let resp = self
                    .http
                    .get(url.clone())
                    .timeout(self.cfg.timeout())
                    .send()
                    .await?;
                let body = success_bytes("mcp-registry", resp).await?;
                let mut catalog: Catalog = serde_json::from_slice(&body)?;
                catalog.source = CatalogSource::Remote;
                info!(url = %url, servers = catalog.servers.len(), "MCP catalog fetched");
                Ok(catalog)
            })
            .await
    }

    /// Fills `command`/`args` from the catalog entry of the same name when omitted.
    pub async fn resolve_install(
        &self,
        req: InstallRequest,
    ) -> Result<McpServerCreate, WorkbenchError> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(WorkbenchError::Validation("name must not be empty".to_string()));
        }

        let command = req.command.filter(|c| !c.trim().is_empty());
        let (command, args, source) = match command {
            Some(command) => (command, req.args.unwrap_or_default(), None),
            None => {
                let catalog = self.catalog().await?;
                let Some(found) = catalog.find(&name) else {
                    return Err(WorkbenchError::Validation(format!(
                        "unknown MCP server {name:?}; provide a command"
                    )));
                };
                let Some(command) = found.command.clone() else {
                    return Err(WorkbenchError::Validation(format!(
                        "catalog entry {name:?} has no command; provide one"
                    )));
                };
                let source = match catalog.source {
                    CatalogSource::Builtin => "builtin".to_string(),
                    CatalogSource::Remote => self
                        .cfg
                        .url
                        .as_ref()
                        .map_or_else(|| "remote".to_string(), ToString::to_string),
                };
                (
                    command,
                    req.args.unwrap_or_else(|| found.args.clone()),
                    Some(source),
                )
            }
        };

        Ok(McpServerCreate {
            name,
            command,
            args,
            env: req.env,
            source,
            enabled: req.enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    fn builtin_registry() -> McpRegistry {
        McpRegistry::new(
            reqwest::Client::new(),
            Arc::new(RegistryConfig::default()),
            CacheLayer::new(&CacheConfig::default()),
        )
    }

    fn install(name: &str, command: Option<&str>) -> InstallRequest {
        InstallRequest {
            name: name.to_string(),
            command: command.map(str::to_string),
            args: None,
            env: BTreeMap::new(),
            enabled: true,
        }
    }

    #[test]
    fn builtin_catalog_has_reference_servers() {
        let catalog = builtin_catalog();
        for name in ["filesystem", "fetch", "git", "github", "memory"] {
            assert!(catalog.find(name).is_some(), "{name}");
        }
        assert_eq!(catalog.source, CatalogSource::Builtin);
    }

    #[tokio::test]
    async fn install_defaults_from_catalog() {
        let create = builtin_registry()
            .resolve_install(install("memory", None))
            .await
            .expect("resolve");
        assert_eq!(create.command, "npx");
        assert_eq!(create.args, vec!["-y", "@modelcontextprotocol/server-memory"]);
        assert_eq!(create.source.as_deref(), Some("builtin"));
    }

    #[tokio::test]
    async fn unknown_name_requires_command() {
        let registry = builtin_registry();
        let err = registry
            .resolve_install(install("weather", None))
            .await
            .expect_err("unknown");
        assert!(matches!(err, WorkbenchError::Validation(_)));

        let create = registry
            .resolve_install(install("weather", Some("./weather-mcp")))
            .await
            .expect("explicit command");
        assert_eq!(create.command, "./weather-mcp");
        assert!(create.args.is_empty());
        assert_eq!(create.source, None);
    }
}
