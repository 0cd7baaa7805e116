//! Persistence seam for annotation jobs.

use std::future::Future;
use std::path::PathBuf;

use adaptlabel_core::annotation::AnnotationType;
use adaptlabel_core::error::CoreError;
use adaptlabel_core::model::ModelSelector;
use adaptlabel_core::types::DbId;
use adaptlabel_db::models::annotation::NewAnnotation;
use adaptlabel_db::models::custom_model::CustomModel;
use adaptlabel_db::repositories::{
    AnnotationRepo, AnnotationWriteError, CustomModelRepo, DatasetRepo, ImageRepo,
};
use sqlx::PgPool;

use crate::resolver::CustomModelSource;

/// What a job needs to know about its dataset.
#[derive(Debug, Clone)]
pub struct JobDataset {
    pub id: DbId,
    pub owner_id: DbId,
    pub annotation_type: AnnotationType,
    pub model: ModelSelector,
    pub classes_to_annotate: Vec<String>,
}

/// An image waiting for annotation.
#[derive(Debug, Clone)]
pub struct JobImage {
    pub id: DbId,
    pub file_name: String,
    /// Location on disk (upload root already applied).
    pub path: PathBuf,
}

/// Storage operations used by the job runner.
pub trait AnnotationStore: CustomModelSource {
    fn load_job_dataset(
        &self,
        dataset_id: DbId,
    ) -> impl Future<Output = Result<JobDataset, CoreError>> + Send;

    /// Images of the dataset that have no annotations, in id order.
    fn unannotated_images(
        &self,
        dataset_id: DbId,
    ) -> impl Future<Output = Result<Vec<JobImage>, CoreError>> + Send;

    /// Persist one image's annotations atomically. Returns rows written.
    fn save_image_annotations(
        &self,
        image_id: DbId,
        annotations: &[NewAnnotation],
    ) -> impl Future<Output = Result<u64, CoreError>> + Send;
}

fn db_error(e: sqlx::Error) -> CoreError {
    CoreError::Internal(format!("Database error: {e}"))
}

/// PostgreSQL-backed store. Every call takes its own connection from the pool.
#[derive(Clone)]
pub struct PgAnnotationStore {
    pool: PgPool,
    upload_root: PathBuf,
}

impl PgAnnotationStore {
    pub fn new(pool: PgPool, upload_root: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            upload_root: upload_root.into(),
        }
    }
}

impl CustomModelSource for PgAnnotationStore {
    async fn find_custom_model(
        &self,
        id: DbId,
        owner_id: DbId,
    ) -> Result<Option<CustomModel>, CoreError> {
        CustomModelRepo::find_for_owner(&self.pool, id, owner_id)
            .await
            .map_err(db_error)
    }
}

impl AnnotationStore for PgAnnotationStore {
    async fn load_job_dataset(&self, dataset_id: DbId) -> Result<JobDataset, CoreError> {
        let dataset = DatasetRepo::find_by_id(&self.pool, dataset_id)
            .await
            .map_err(db_error)?
            .ok_or(CoreError::NotFound {
                entity: "Dataset",
                id: dataset_id,
            })?;

        let annotation_type = AnnotationType::from_str(&dataset.annotation_type)?;
        let model = ModelSelector::for_dataset(dataset.model_id.as_deref(), annotation_type)?;

        Ok(JobDataset {
            id: dataset.id,
            owner_id: dataset.owner_id,
            annotation_type,
            model,
            classes_to_annotate: dataset.classes_to_annotate,
        })
    }

    async fn unannotated_images(&self, dataset_id: DbId) -> Result<Vec<JobImage>, CoreError> {
        let images = ImageRepo::list_unannotated(&self.pool, dataset_id)
            .await
            .map_err(db_error)?;
        Ok(images
            .into_iter()
            .map(|img| JobImage {
                id: img.id,
                path: self.upload_root.join(&img.file_path),
                file_name: img.file_name,
            })
            .collect())
    }

    async fn save_image_annotations(
        &self,
        image_id: DbId,
        annotations: &[NewAnnotation],
    ) -> Result<u64, CoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let written = AnnotationRepo::insert_batch(&mut tx, image_id, annotations)
            .await
            .map_err(|e| match e {
                AnnotationWriteError::Invalid(e) => e,
                AnnotationWriteError::Database(e) => db_error(e),
            })?;
        tx.commit().await.map_err(db_error)?;
        Ok(written)
    }
}
