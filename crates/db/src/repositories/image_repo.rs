//! Repository for the `images` table.

use std::collections::HashMap;

use adaptlabel_core::types::DbId;
use sqlx::PgPool;

use crate::models::image::{CreateImage, Image, ImageWithAnnotations};

use super::AnnotationRepo;

/// Column list for images queries.
const COLUMNS: &str = "id, dataset_id, file_name, file_path, created_at";

/// Provides CRUD operations for dataset images.
pub struct ImageRepo;

impl ImageRepo {
    /// Insert a new image row, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateImage) -> Result<Image, sqlx::Error> {
        let query = format!(
            "INSERT INTO images (dataset_id, file_name, file_path)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Image>(&query)
            .bind(input.dataset_id)
            .bind(&input.file_name)
            .bind(&input.file_path)
            .fetch_one(pool)
            .await
    }

    /// Find an image by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Image>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM images WHERE id = $1");
        sqlx::query_as::<_, Image>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether any image already occupies `file_path`.
    pub async fn exists_by_path(pool: &PgPool, file_path: &str) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM images WHERE file_path = $1)")
            .bind(file_path)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// List all images of a dataset in upload order.
    pub async fn list_by_dataset(
        pool: &PgPool,
        dataset_id: DbId,
    ) -> Result<Vec<Image>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM images
             WHERE dataset_id = $1
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, Image>(&query)
            .bind(dataset_id)
            .fetch_all(pool)
            .await
    }

    /// Images of a dataset that have no annotations yet, in id order.
    pub async fn list_unannotated(
        pool: &PgPool,
        dataset_id: DbId,
    ) -> Result<Vec<Image>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM images i
             WHERE i.dataset_id = $1
               AND NOT EXISTS (SELECT 1 FROM annotations a WHERE a.image_id = i.id)
             ORDER BY i.id ASC"
        );
        sqlx::query_as::<_, Image>(&query)
            .bind(dataset_id)
            .fetch_all(pool)
            .await
    }

    /// All images of a dataset with their annotations attached.
    pub async fn list_with_annotations(
        pool: &PgPool,
        dataset_id: DbId,
    ) -> Result<Vec<ImageWithAnnotations>, sqlx::Error> {
        let images = Self::list_by_dataset(pool, dataset_id).await?;
        let mut by_image: HashMap<DbId, Vec<_>> = HashMap::new();
        for ann in AnnotationRepo::list_by_dataset(pool, dataset_id).await? {
            by_image.entry(ann.image_id).or_default().push(ann);
        }

        Ok(images
            .into_iter()
            .map(|image| ImageWithAnnotations {
                annotations: by_image.remove(&image.id).unwrap_or_default(),
                image,
            })
            .collect())
    }

    /// Delete an image. Its annotations cascade.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
