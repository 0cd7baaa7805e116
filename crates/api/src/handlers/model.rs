//! Handlers for the standard model catalog.

use adaptlabel_core::class_filter::ClassNames;
use axum::extract::State;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/models/available-classes
///
/// Class table of the standard detector, used to pick `classes_to_annotate`.
pub async fn available_classes(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<DataResponse<ClassNames>>> {
    let classes = state.resolver.available_classes().await?;
    Ok(Json(DataResponse::new(classes)))
}
