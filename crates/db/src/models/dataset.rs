//! Dataset models and DTOs.

use adaptlabel_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::image::ImageWithAnnotations;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `datasets` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Dataset {
    pub id: DbId,
    pub owner_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub annotation_type: String,
    /// Standard model tag or decimal custom model id. `None` means the
    /// default model for `annotation_type`.
    pub model_id: Option<String>,
    pub classes_to_annotate: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for creating a dataset.
#[derive(Debug, Deserialize)]
pub struct CreateDataset {
    pub name: String,
    pub description: Option<String>,
    /// Defaults to `detection`.
    pub annotation_type: Option<String>,
    pub model_id: Option<String>,
    pub classes_to_annotate: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Update DTO
// ---------------------------------------------------------------------------

/// Input for updating a dataset's configuration (all fields optional).
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDataset {
    pub name: Option<String>,
    pub description: Option<String>,
    pub annotation_type: Option<String>,
    pub model_id: Option<String>,
    pub classes_to_annotate: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A dataset with its images and their annotations.
#[derive(Debug, Serialize)]
pub struct DatasetDetail {
    #[serde(flatten)]
    pub dataset: Dataset,
    pub images: Vec<ImageWithAnnotations>,
}
