use crate::db::{DbFeedback, FeedbackCreate, RecordCreate};
use crate::error::WorkbenchError;
use crate::server::extract::{Validate, ValidJson};
use crate::server::router::WorkbenchState;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

impl Validate for FeedbackCreate {
    fn validate(&self) -> Result<(), WorkbenchError> {
        if !matches!(self.rating, -1 | 1) {
            return Err(WorkbenchError::Validation(
                "rating must be -1 or 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn router() -> Router<WorkbenchState> {
    Router::new().route("/api/feedback", get(list_feedback).post(submit_feedback))
}

async fn list_feedback(
    State(state): State<WorkbenchState>,
) -> Result<Json<Vec<DbFeedback>>, WorkbenchError> {
    Ok(Json(state.db.list_feedback().await?))
}

async fn submit_feedback(
    State(state): State<WorkbenchState>,
    ValidJson(body): ValidJson<FeedbackCreate>,
) -> Result<(StatusCode, Json<DbFeedback>), WorkbenchError> {
    let id = state.db.create(RecordCreate::Feedback(body)).await?;
    Ok((StatusCode::CREATED, Json(state.db.get_feedback(id).await?)))
}
