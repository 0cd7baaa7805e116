//! Annotation models and DTOs.
//!
//! Geometry is stored as JSONB and decoded into the typed
//! [`Geometry`](adaptlabel_core::annotation::Geometry) union on read, so a row
//! that fails validation never reaches callers as an untyped blob.

use adaptlabel_core::annotation::{AnnotationType, Geometry};
use adaptlabel_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `annotations` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Annotation {
    pub id: DbId,
    pub image_id: DbId,
    pub annotation_type: String,
    pub class_label: String,
    pub confidence: f64,
    pub geometry: Json<Geometry>,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// A normalized annotation ready to be persisted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewAnnotation {
    pub annotation_type: AnnotationType,
    pub class_label: String,
    pub confidence: f64,
    pub geometry: Geometry,
}
