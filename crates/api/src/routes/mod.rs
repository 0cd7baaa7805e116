pub mod custom_model;
pub mod dataset;
pub mod health;
pub mod image;
pub mod model;

use axum::Router;

use crate::state::AppState;

/// Largest accepted multipart body (image batches and model weights).
pub const UPLOAD_BODY_LIMIT: usize = 512 * 1024 * 1024;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /models/available-classes                        standard detector classes
///
/// /datasets                                        list, create
/// /datasets/{id}                                   get, update, delete
/// /datasets/{id}/images                            upload images (multipart)
/// /datasets/{id}/annotate                          queue annotation job (POST)
/// /datasets/{id}/annotate/status                   job status (GET)
/// /datasets/{id}/export/{format}                   download archive (GET)
///
/// /images/{id}                                     get, delete
///
/// /custom-models                                   list, upload (multipart)
/// /custom-models/{id}                              delete
/// ```
///
/// Every route requires a Bearer token.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/models", model::router())
        .nest("/datasets", dataset::router())
        .nest("/images", image::router())
        .nest("/custom-models", custom_model::router())
}
