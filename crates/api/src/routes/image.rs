//! Route definitions for the `/images` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::image;
use crate::state::AppState;

/// Routes mounted at `/images`.
///
/// ```text
/// GET    /{id}                              -> get_by_id
/// DELETE /{id}                              -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(image::get_by_id).delete(image::delete))
}
