use crate::db::{DbMcpServer, McpServerPatch, RecordCreate, RecordPatch, RecordRef};
use crate::error::WorkbenchError;
use crate::mcp::{Catalog, InstallRequest};
use crate::server::extract::{ValidPath, Validate, ValidJson, require_non_blank};
use crate::server::router::WorkbenchState;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch},
};
use tracing::info;

impl Validate for InstallRequest {
    fn validate(&self) -> Result<(), WorkbenchError> {
        require_non_blank("name", &self.name)
    }
}

impl Validate for McpServerPatch {
    fn validate(&self) -> Result<(), WorkbenchError> {
        match &self.command {
            Some(command) => require_non_blank("command", command),
            None => Ok(()),
        }
    }
}

pub fn router() -> Router<WorkbenchState> {
    Router::new()
        .route("/api/registry", get(catalog))
        .route(
            "/api/registry/installed",
            get(list_installed).post(install),
        )
        .route(
            "/api/registry/installed/{id}",
            patch(update_installed).delete(uninstall),
        )
}

async fn catalog(State(state): State<WorkbenchState>) -> Result<Json<Catalog>, WorkbenchError> {
    Ok(Json(state.registry.catalog().await?))
}

async fn list_installed(
    State(state): State<WorkbenchState>,
) -> Result<Json<Vec<DbMcpServer>>, WorkbenchError> {
    Ok(Json(state.db.list_mcp_servers().await?))
}

async fn install(
    State(state): State<WorkbenchState>,
    ValidJson(body): ValidJson<InstallRequest>,
) -> Result<(StatusCode, Json<DbMcpServer>), WorkbenchError> {
    let create = state.registry.resolve_install(body).await?;
    let name = create.name.clone();
    let id = state.db.create(RecordCreate::McpServer(create)).await?;
    info!(server_id = id, name = %name, "MCP server installed");
    Ok((StatusCode::CREATED, Json(state.db.get_mcp_server(id).await?)))
}

async fn update_installed(
    State(state): State<WorkbenchState>,
    ValidPath(id): ValidPath<i64>,
    ValidJson(patch): ValidJson<McpServerPatch>,
) -> Result<Json<DbMcpServer>, WorkbenchError> {
    state.db.patch(RecordPatch::McpServer { id, patch }).await?;
    Ok(Json(state.db.get_mcp_server(id).await?))
}

async fn uninstall(
    State(state): State<WorkbenchState>,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode, WorkbenchError> {
    state.db.delete(RecordRef::McpServer(id)).await?;
    info!(server_id = id, "MCP server uninstalled");
    Ok(StatusCode::NO_CONTENT)
}
