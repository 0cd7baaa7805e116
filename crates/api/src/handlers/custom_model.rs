//! Handlers for user-uploaded custom models.
//!
//! Ownership failures answer 404 so a caller cannot probe for other users'
//! models.

use adaptlabel_core::annotation::AnnotationType;
use adaptlabel_core::error::CoreError;
use adaptlabel_core::naming::validate_weights_file;
use adaptlabel_core::types::DbId;
use adaptlabel_db::models::custom_model::{CreateCustomModel, CustomModel};
use adaptlabel_db::repositories::CustomModelRepo;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::storage;

fn text_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(e.to_string())
}

/// POST /api/v1/custom-models
///
/// Multipart form with `name`, `model_type` (`detection` | `segmentation`)
/// and `file` (`.pt` / `.pth`).
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<CustomModel>>)> {
    let mut name: Option<String> = None;
    let mut model_type: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(text_error)? {
        match field.name().unwrap_or("") {
            "name" => name = Some(field.text().await.map_err(text_error)?),
            "model_type" => model_type = Some(field.text().await.map_err(text_error)?),
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(text_error)?;
                file = Some((file_name, data.to_vec()));
            }
            _ => {} // ignore unknown fields
        }
    }

    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing required 'name' field".into()))?;
    let model_type =
        model_type.ok_or_else(|| AppError::BadRequest("Missing required 'model_type' field".into()))?;
    let model_type = AnnotationType::from_str(model_type.trim())?;
    let (file_name, data) =
        file.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    validate_weights_file(&file_name)?;

    let relative = storage::weights_relative_path(user.user_id, &file_name);
    let path = state.config.models_root.join(&relative);
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(CoreError::Conflict(format!("A model file named '{file_name}' already exists")).into());
    }
    storage::write_file(&path, &data).await?;

    let input = CreateCustomModel {
        name,
        model_type: model_type.as_str().to_string(),
        file_path: relative,
    };
    let model = match CustomModelRepo::create(&state.pool, user.user_id, &input).await {
        Ok(model) => model,
        Err(e) => {
            storage::remove_file(&path).await;
            return Err(e.into());
        }
    };

    tracing::info!(model_id = model.id, user_id = user.user_id, model_type = %model.model_type, "Custom model uploaded");
    Ok((StatusCode::CREATED, Json(DataResponse::new(model))))
}

/// GET /api/v1/custom-models
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<CustomModel>>>> {
    let models = CustomModelRepo::list_by_owner(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse::new(models)))
}

/// DELETE /api/v1/custom-models/{id}
///
/// Removes the row, the weights file and any loaded copy in the cache.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let not_found = || AppError::Core(CoreError::NotFound { entity: "CustomModel", id });
    let model = CustomModelRepo::find_for_owner(&state.pool, id, user.user_id)
        .await?
        .ok_or_else(not_found)?;

    if !CustomModelRepo::delete(&state.pool, id).await? {
        return Err(not_found());
    }
    let path = state.config.models_root.join(&model.file_path);
    storage::remove_file(&path).await;
    state.resolver.evict_custom_model(&path).await;

    tracing::info!(model_id = id, user_id = user.user_id, "Custom model deleted");
    Ok(StatusCode::NO_CONTENT)
}
