use crate::db::{
    DatasetCreate, DatasetPatch, DatasetSummary, DbDataset, RecordCreate, RecordPatch, RecordRef,
};
use crate::error::WorkbenchError;
use crate::server::extract::{ValidPath, Validate, ValidJson, require_non_blank};
use crate::server::router::WorkbenchState;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use tracing::info;

impl Validate for DatasetCreate {
    fn validate(&self) -> Result<(), WorkbenchError> {
        require_non_blank("name", &self.name)
    }
}

impl Validate for DatasetPatch {
    fn validate(&self) -> Result<(), WorkbenchError> {
        match &self.name {
            Some(name) => require_non_blank("name", name),
            None => Ok(()),
        }
    }
}

pub fn router() -> Router<WorkbenchState> {
    Router::new()
        .route("/api/datasets", get(list_datasets).post(create_dataset))
        .route(
            "/api/datasets/{id}",
            get(get_dataset).patch(update_dataset).delete(delete_dataset),
        )
}

async fn list_datasets(
    State(state): State<WorkbenchState>,
) -> Result<Json<Vec<DatasetSummary>>, WorkbenchError> {
    Ok(Json(state.db.list_datasets().await?))
}

async fn create_dataset(
    State(state): State<WorkbenchState>,
    ValidJson(mut body): ValidJson<DatasetCreate>,
) -> Result<(StatusCode, Json<DbDataset>), WorkbenchError> {
    body.name = body.name.trim().to_string();
    let rows = body.records.len();
    let id = state.db.create(RecordCreate::Dataset(body)).await?;
    info!(dataset_id = id, rows, "dataset created");
    Ok((StatusCode::CREATED, Json(state.db.get_dataset(id).await?)))
}

async fn get_dataset(
    State(state): State<WorkbenchState>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<DbDataset>, WorkbenchError> {
    Ok(Json(state.db.get_dataset(id).await?))
}

async fn update_dataset(
    State(state): State<WorkbenchState>,
    ValidPath(id): ValidPath<i64>,
    ValidJson(patch): ValidJson<DatasetPatch>,
) -> Result<Json<DbDataset>, WorkbenchError> {
    state.db.patch(RecordPatch::Dataset { id, patch }).await?;
    Ok(Json(state.db.get_dataset(id).await?))
}

async fn delete_dataset(
    State(state): State<WorkbenchState>,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode, WorkbenchError> {
    state.db.delete(RecordRef::Dataset(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
