//! Route definitions for the `/models` catalog.

use axum::routing::get;
use axum::Router;

use crate::handlers::model;
use crate::state::AppState;

/// Routes mounted at `/models`.
///
/// ```text
/// GET    /available-classes                 -> available_classes
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/available-classes", get(model::available_classes))
}
