//! Route definitions for the `/datasets` resource.
//!
//! Also nests image upload, annotation job and export routes under
//! `/datasets/{id}/...`.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{annotation, dataset, export, image};
use crate::routes::UPLOAD_BODY_LIMIT;
use crate::state::AppState;

/// Routes mounted at `/datasets`.
///
/// ```text
/// GET    /                                  -> list
/// POST   /                                  -> create
/// GET    /{id}                              -> get_by_id
/// PUT    /{id}                              -> update
/// DELETE /{id}                              -> delete
/// POST   /{id}/images                       -> image::upload
/// POST   /{id}/annotate                     -> annotation::trigger
/// GET    /{id}/annotate/status              -> annotation::status
/// GET    /{id}/export/{format}              -> export::export
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dataset::list).post(dataset::create))
        .route(
            "/{id}",
            get(dataset::get_by_id)
                .put(dataset::update)
                .delete(dataset::delete),
        )
        .route(
            "/{id}/images",
            post(image::upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/{id}/annotate", post(annotation::trigger))
        .route("/{id}/annotate/status", get(annotation::status))
        .route("/{id}/export/{format}", get(export::export))
}
