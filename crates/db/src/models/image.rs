//! Image models and DTOs.

use adaptlabel_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::annotation::Annotation;

/// A row from the `images` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Image {
    pub id: DbId,
    pub dataset_id: DbId,
    pub file_name: String,
    /// Path relative to the upload root: `{dataset_id}/{file_name}`.
    pub file_path: String,
    pub created_at: Timestamp,
}

/// Input for registering an uploaded image.
#[derive(Debug, Deserialize)]
pub struct CreateImage {
    pub dataset_id: DbId,
    pub file_name: String,
    pub file_path: String,
}

/// An image together with its stored annotations.
#[derive(Debug, Serialize)]
pub struct ImageWithAnnotations {
    #[serde(flatten)]
    pub image: Image,
    pub annotations: Vec<Annotation>,
}
