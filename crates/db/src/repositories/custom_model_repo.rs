//! Repository for the `custom_models` table.

use adaptlabel_core::types::DbId;
use sqlx::PgPool;

use crate::models::custom_model::{CreateCustomModel, CustomModel};

/// Column list for custom_models queries.
const COLUMNS: &str = "id, owner_id, name, model_type, file_path, created_at";

/// Provides CRUD operations for user-uploaded models.
pub struct CustomModelRepo;

impl CustomModelRepo {
    /// Insert a new custom model owned by `owner_id`.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateCustomModel,
    ) -> Result<CustomModel, sqlx::Error> {
        let query = format!(
            "INSERT INTO custom_models (owner_id, name, model_type, file_path)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CustomModel>(&query)
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.model_type)
            .bind(&input.file_path)
            .fetch_one(pool)
            .await
    }

    /// Find a custom model only if it belongs to `owner_id`.
    ///
    /// Foreign and missing models are indistinguishable to the caller.
    pub async fn find_for_owner(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
    ) -> Result<Option<CustomModel>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM custom_models WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, CustomModel>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's custom models, newest first.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Vec<CustomModel>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM custom_models
             WHERE owner_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, CustomModel>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a custom model. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM custom_models WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
