//! Handlers for dataset images.

use std::collections::HashSet;

use adaptlabel_core::error::CoreError;
use adaptlabel_core::naming::validate_image_file;
use adaptlabel_core::types::DbId;
use adaptlabel_db::models::image::{CreateImage, Image, ImageWithAnnotations};
use adaptlabel_db::repositories::{AnnotationRepo, ImageRepo};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::handlers::dataset::load_owned_dataset;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::storage;

/// Multipart field carrying image files. May repeat.
const FILES_FIELD: &str = "files";

/// Load an image whose dataset the caller owns.
async fn load_owned_image(state: &AppState, id: DbId, user: &AuthUser) -> AppResult<Image> {
    let image = ImageRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Image", id }))?;
    load_owned_dataset(&state.pool, image.dataset_id, user).await?;
    Ok(image)
}

/// POST /api/v1/datasets/{id}/images
///
/// Every file is validated before anything is written, so a bad file name
/// rejects the whole upload.
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    Path(dataset_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<Image>>>)> {
    load_owned_dataset(&state.pool, dataset_id, &user).await?;

    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .ok_or_else(|| AppError::BadRequest("Uploaded file has no file name".into()))?
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        files.push((file_name, data.to_vec()));
    }

    if files.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Missing required '{FILES_FIELD}' field"
        )));
    }

    let mut seen = HashSet::new();
    for (file_name, _) in &files {
        validate_image_file(file_name)?;
        if !seen.insert(file_name.as_str()) {
            return Err(CoreError::Validation(format!("Duplicate file '{file_name}' in upload")).into());
        }
        let relative = storage::image_relative_path(dataset_id, file_name);
        if ImageRepo::exists_by_path(&state.pool, &relative).await? {
            return Err(CoreError::Conflict(format!(
                "Image '{file_name}' already exists in this dataset"
            ))
            .into());
        }
    }

    let mut images = Vec::with_capacity(files.len());
    for (file_name, data) in files {
        let relative = storage::image_relative_path(dataset_id, &file_name);
        let path = state.config.upload_root.join(&relative);
        storage::write_file(&path, &data).await?;

        let input = CreateImage {
            dataset_id,
            file_name,
            file_path: relative,
        };
        match ImageRepo::create(&state.pool, &input).await {
            Ok(image) => images.push(image),
            Err(e) => {
                storage::remove_file(&path).await;
                return Err(e.into());
            }
        }
    }

    tracing::info!(dataset_id, count = images.len(), "Images uploaded");
    Ok((StatusCode::CREATED, Json(DataResponse::new(images))))
}

/// GET /api/v1/images/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ImageWithAnnotations>>> {
    let image = load_owned_image(&state, id, &user).await?;
    let annotations = AnnotationRepo::list_by_image(&state.pool, id).await?;
    Ok(Json(DataResponse::new(ImageWithAnnotations { image, annotations })))
}

/// DELETE /api/v1/images/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let image = load_owned_image(&state, id, &user).await?;
    if !ImageRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Image", id }));
    }
    storage::remove_file(&state.config.upload_root.join(&image.file_path)).await;

    tracing::info!(image_id = id, dataset_id = image.dataset_id, "Image deleted");
    Ok(StatusCode::NO_CONTENT)
}
