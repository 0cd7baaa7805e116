//! Repository for the `datasets` table.

use adaptlabel_core::types::DbId;
use sqlx::PgPool;

use crate::models::dataset::{CreateDataset, Dataset, UpdateDataset};

/// Column list for datasets queries.
const COLUMNS: &str = "id, owner_id, name, description, annotation_type, model_id, \
    classes_to_annotate, created_at, updated_at";

/// Provides CRUD operations for datasets.
pub struct DatasetRepo;

impl DatasetRepo {
    /// Insert a new dataset owned by `owner_id`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateDataset,
    ) -> Result<Dataset, sqlx::Error> {
        let query = format!(
            "INSERT INTO datasets
                (owner_id, name, description, annotation_type, model_id, classes_to_annotate)
             VALUES ($1, $2, $3, COALESCE($4, 'detection'), $5, COALESCE($6, '{{}}'::TEXT[]))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dataset>(&query)
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.annotation_type)
            .bind(&input.model_id)
            .bind(&input.classes_to_annotate)
            .fetch_one(pool)
            .await
    }

    /// Find a dataset by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Dataset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM datasets WHERE id = $1");
        sqlx::query_as::<_, Dataset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's datasets, newest first.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Dataset>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM datasets
             WHERE owner_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Dataset>(&query)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update a dataset. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDataset,
    ) -> Result<Option<Dataset>, sqlx::Error> {
        let query = format!(
            "UPDATE datasets SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                annotation_type = COALESCE($4, annotation_type),
                model_id = COALESCE($5, model_id),
                classes_to_annotate = COALESCE($6, classes_to_annotate)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dataset>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.annotation_type)
            .bind(&input.model_id)
            .bind(&input.classes_to_annotate)
            .fetch_optional(pool)
            .await
    }

    /// Delete a dataset. Images and annotations cascade.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM datasets WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
