//! Custom model models and DTOs.

use adaptlabel_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `custom_models` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomModel {
    pub id: DbId,
    pub owner_id: DbId,
    pub name: String,
    /// `detection` or `segmentation`.
    pub model_type: String,
    /// Path relative to the models root: `{owner_id}/{file_name}`.
    pub file_path: String,
    pub created_at: Timestamp,
}

/// Input for registering uploaded weights.
#[derive(Debug, Deserialize)]
pub struct CreateCustomModel {
    pub name: String,
    pub model_type: String,
    pub file_path: String,
}
