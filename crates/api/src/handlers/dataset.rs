//! Handlers for the `/datasets` resource.

use adaptlabel_core::annotation::AnnotationType;
use adaptlabel_core::error::CoreError;
use adaptlabel_core::model::ModelSelector;
use adaptlabel_core::types::DbId;
use adaptlabel_db::models::dataset::{CreateDataset, Dataset, DatasetDetail, UpdateDataset};
use adaptlabel_db::repositories::{CustomModelRepo, DatasetRepo, ImageRepo};
use adaptlabel_db::DbPool;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::storage;

/// Load a dataset the caller owns.
///
/// A missing dataset is 404, someone else's is 403.
pub(crate) async fn load_owned_dataset(
    pool: &DbPool,
    id: DbId,
    user: &AuthUser,
) -> AppResult<Dataset> {
    let dataset = DatasetRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Dataset",
            id,
        }))?;
    if dataset.owner_id != user.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not have access to this dataset".into(),
        )));
    }
    Ok(dataset)
}

/// Check the configurable fields of a create or update request.
///
/// A custom model reference must point at one of the caller's own models.
async fn validate_config(
    pool: &DbPool,
    user: &AuthUser,
    name: Option<&str>,
    annotation_type: Option<&str>,
    model_id: Option<&str>,
) -> AppResult<()> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err(CoreError::Validation("Dataset name must not be empty".into()).into());
    }
    if let Some(annotation_type) = annotation_type {
        AnnotationType::from_str(annotation_type)?;
    }
    if let Some(reference) = model_id.filter(|m| !m.trim().is_empty()) {
        if let ModelSelector::Custom(id) = ModelSelector::parse(reference)? {
            CustomModelRepo::find_for_owner(pool, id, user.user_id)
                .await?
                .ok_or(AppError::Core(CoreError::NotFound {
                    entity: "CustomModel",
                    id,
                }))?;
        }
    }
    Ok(())
}

/// POST /api/v1/datasets
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateDataset>,
) -> AppResult<(StatusCode, Json<DataResponse<Dataset>>)> {
    validate_config(
        &state.pool,
        &user,
        Some(&input.name),
        input.annotation_type.as_deref(),
        input.model_id.as_deref(),
    )
    .await?;

    let dataset = DatasetRepo::create(&state.pool, user.user_id, &input).await?;
    tracing::info!(dataset_id = dataset.id, user_id = user.user_id, "Dataset created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(dataset))))
}

/// GET /api/v1/datasets
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Dataset>>>> {
    let datasets =
        DatasetRepo::list_by_owner(&state.pool, user.user_id, params.limit(), params.offset())
            .await?;
    Ok(Json(DataResponse::new(datasets)))
}

/// GET /api/v1/datasets/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DatasetDetail>>> {
    let dataset = load_owned_dataset(&state.pool, id, &user).await?;
    let images = ImageRepo::list_with_annotations(&state.pool, id).await?;
    Ok(Json(DataResponse::new(DatasetDetail { dataset, images })))
}

/// PUT /api/v1/datasets/{id}
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDataset>,
) -> AppResult<Json<DataResponse<Dataset>>> {
    load_owned_dataset(&state.pool, id, &user).await?;
    validate_config(
        &state.pool,
        &user,
        input.name.as_deref(),
        input.annotation_type.as_deref(),
        input.model_id.as_deref(),
    )
    .await?;

    let dataset = DatasetRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Dataset",
            id,
        }))?;
    Ok(Json(DataResponse::new(dataset)))
}

/// DELETE /api/v1/datasets/{id}
///
/// Images and annotations cascade in the database; the upload directory is
/// removed afterwards.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    load_owned_dataset(&state.pool, id, &user).await?;

    if !DatasetRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Dataset",
            id,
        }));
    }
    storage::remove_dir(&storage::dataset_dir(&state.config.upload_root, id)).await;
    state.queue.forget(id).await;

    tracing::info!(dataset_id = id, user_id = user.user_id, "Dataset deleted");
    Ok(StatusCode::NO_CONTENT)
}
