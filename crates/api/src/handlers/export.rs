//! Dataset export handler.

use adaptlabel_core::annotation::AnnotationType;
use adaptlabel_core::error::CoreError;
use adaptlabel_core::export::{export_dataset, ExportAnnotation, ExportDataset, ExportFormat, ExportImage};
use adaptlabel_core::naming::export_archive_name;
use adaptlabel_core::types::DbId;
use adaptlabel_db::models::image::ImageWithAnnotations;
use adaptlabel_db::repositories::ImageRepo;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

use crate::error::{AppError, AppResult};
use crate::handlers::dataset::load_owned_dataset;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

fn to_export_image(
    upload_root: &std::path::Path,
    item: ImageWithAnnotations,
) -> Result<ExportImage, CoreError> {
    let annotations = item
        .annotations
        .into_iter()
        .map(|a| {
            Ok(ExportAnnotation {
                annotation_type: AnnotationType::from_str(&a.annotation_type)?,
                class_label: a.class_label,
                confidence: a.confidence,
                geometry: a.geometry.0,
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    Ok(ExportImage {
        path: upload_root.join(&item.image.file_path),
        file_name: item.image.file_name,
        annotations,
    })
}

/// GET /api/v1/datasets/{id}/export/{format}
///
/// Responds with a zip archive. Image headers are read on the blocking
/// pool.
pub async fn export(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, format)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let format = ExportFormat::from_str(&format)?;
    let dataset = load_owned_dataset(&state.pool, id, &user).await?;

    let images = ImageRepo::list_with_annotations(&state.pool, id)
        .await?
        .into_iter()
        .map(|item| to_export_image(&state.config.upload_root, item))
        .collect::<Result<Vec<_>, _>>()?;

    let filename = export_archive_name(&dataset.name, format.as_str());
    let export = ExportDataset {
        name: dataset.name,
        images,
    };
    let archive = tokio::task::spawn_blocking(move || export_dataset(&export, format))
        .await
        .map_err(|e| AppError::InternalError(format!("Export task failed: {e}")))??;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        archive,
    ))
}
