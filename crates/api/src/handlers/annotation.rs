//! Handlers for dataset annotation jobs.

use adaptlabel_core::types::DbId;
use adaptlabel_pipeline::queue::JobStatus;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::AppResult;
use crate::handlers::dataset::load_owned_dataset;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/datasets/{id}/annotate
///
/// Queues a job that annotates every image of the dataset without
/// annotations and returns at once. A second trigger while a job for the
/// same dataset is queued or running is rejected with 409.
pub async fn trigger(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<JobStatus>>)> {
    load_owned_dataset(&state.pool, id, &user).await?;
    state.queue.submit(id).await?;

    tracing::info!(dataset_id = id, user_id = user.user_id, "Annotation requested");
    let status = state.queue.status(id).await;
    Ok((StatusCode::ACCEPTED, Json(DataResponse::new(status))))
}

/// GET /api/v1/datasets/{id}/annotate/status
pub async fn status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<JobStatus>>> {
    load_owned_dataset(&state.pool, id, &user).await?;
    Ok(Json(DataResponse::new(state.queue.status(id).await)))
}
