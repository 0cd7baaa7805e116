//! Repository for the `annotations` table.
//!
//! Writes validate every annotation against its type before touching the
//! database, so malformed geometry never gets stored.

use adaptlabel_core::annotation::{validate_annotation, validate_confidence};
use adaptlabel_core::error::CoreError;
use adaptlabel_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::models::annotation::{Annotation, NewAnnotation};

/// Column list for annotations queries.
const COLUMNS: &str = "id, image_id, annotation_type, class_label, confidence, geometry, created_at";

/// Failure to persist a batch of annotations.
#[derive(Debug, thiserror::Error)]
pub enum AnnotationWriteError {
    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Provides storage for model-produced annotations.
pub struct AnnotationRepo;

impl AnnotationRepo {
    /// Check a batch without writing it.
    pub fn validate(annotations: &[NewAnnotation]) -> Result<(), CoreError> {
        for ann in annotations {
            if ann.class_label.trim().is_empty() {
                return Err(CoreError::Validation("class_label must not be empty".into()));
            }
            validate_confidence(ann.confidence)?;
            validate_annotation(ann.annotation_type, &ann.geometry)?;
        }
        Ok(())
    }

    /// Insert a batch of annotations for one image on the given connection.
    ///
    /// Call with a transaction (`&mut *tx`) to make the batch atomic.
    /// Returns the number of rows written.
    pub async fn insert_batch(
        conn: &mut PgConnection,
        image_id: DbId,
        annotations: &[NewAnnotation],
    ) -> Result<u64, AnnotationWriteError> {
        Self::validate(annotations)?;

        let mut written = 0;
        for ann in annotations {
            let result = sqlx::query(
                "INSERT INTO annotations
                    (image_id, annotation_type, class_label, confidence, geometry)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(image_id)
            .bind(ann.annotation_type.as_str())
            .bind(&ann.class_label)
            .bind(ann.confidence)
            .bind(Json(&ann.geometry))
            .execute(&mut *conn)
            .await?;
            written += result.rows_affected();
        }
        Ok(written)
    }

    /// List the annotations of one image.
    pub async fn list_by_image(
        pool: &PgPool,
        image_id: DbId,
    ) -> Result<Vec<Annotation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotations
             WHERE image_id = $1
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(image_id)
            .fetch_all(pool)
            .await
    }

    /// List every annotation of a dataset, ordered by image then id.
    pub async fn list_by_dataset(
        pool: &PgPool,
        dataset_id: DbId,
    ) -> Result<Vec<Annotation>, sqlx::Error> {
        sqlx::query_as::<_, Annotation>(
            "SELECT a.id, a.image_id, a.annotation_type, a.class_label, a.confidence,
                    a.geometry, a.created_at
             FROM annotations a
             JOIN images i ON i.id = a.image_id
             WHERE i.dataset_id = $1
             ORDER BY a.image_id ASC, a.id ASC",
        )
        .bind(dataset_id)
        .fetch_all(pool)
        .await
    }

    /// Count the annotations of a dataset.
    pub async fn count_by_dataset(pool: &PgPool, dataset_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM annotations a
             JOIN images i ON i.id = a.image_id
             WHERE i.dataset_id = $1",
        )
        .bind(dataset_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
