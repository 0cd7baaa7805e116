//! Route definitions for the `/custom-models` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::custom_model;
use crate::routes::UPLOAD_BODY_LIMIT;
use crate::state::AppState;

/// Routes mounted at `/custom-models`.
///
/// ```text
/// GET    /                                  -> list
/// POST   /                                  -> upload
/// DELETE /{id}                              -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(custom_model::list)
                .post(custom_model::upload)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/{id}", delete(custom_model::delete))
}
