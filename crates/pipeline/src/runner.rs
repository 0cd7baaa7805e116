//! Whole-dataset annotation job.
//!
//! A job annotates every image of a dataset that has no annotations yet.
//! Images are processed one at a time and each image's annotations are
//! committed on their own, so one bad image never affects the rest. Images
//! that fail stay unannotated and are picked up again by the next job.

use std::sync::Arc;

use adaptlabel_core::class_filter::resolve_class_indices;
use adaptlabel_core::error::CoreError;
use adaptlabel_core::types::{DbId, Timestamp};
use adaptlabel_inference::ModelLoader;
use chrono::Utc;
use serde::Serialize;

use crate::controller::annotate_image;
use crate::resolver::ModelResolver;
use crate::store::{AnnotationStore, JobImage};

/// An image the job did not annotate, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageOutcome {
    pub image_id: DbId,
    pub file_name: String,
    pub reason: String,
}

impl ImageOutcome {
    fn new(image: &JobImage, reason: impl Into<String>) -> Self {
        Self {
            image_id: image.id,
            file_name: image.file_name.clone(),
            reason: reason.into(),
        }
    }
}

/// Aggregate result of one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub dataset_id: DbId,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    /// Images selected for annotation.
    pub images_total: usize,
    pub succeeded: usize,
    pub annotations_created: u64,
    /// Images whose file is missing on disk.
    pub skipped: Vec<ImageOutcome>,
    /// Images whose inference or persistence failed.
    pub failed: Vec<ImageOutcome>,
    /// Set when the job could not run at all.
    pub error: Option<String>,
}

impl JobReport {
    fn new(dataset_id: DbId, started_at: Timestamp) -> Self {
        Self {
            dataset_id,
            started_at,
            finished_at: started_at,
            images_total: 0,
            succeeded: 0,
            annotations_created: 0,
            skipped: Vec::new(),
            failed: Vec::new(),
            error: None,
        }
    }

    /// A report for a job that failed before touching any image.
    pub fn aborted(dataset_id: DbId, started_at: Timestamp, error: &CoreError) -> Self {
        Self {
            finished_at: Utc::now(),
            error: Some(error.to_string()),
            ..Self::new(dataset_id, started_at)
        }
    }
}

/// Runs annotation jobs against a store with a shared model resolver.
pub struct JobRunner<L: ModelLoader, S> {
    resolver: Arc<ModelResolver<L>>,
    store: Arc<S>,
}

impl<L: ModelLoader, S: AnnotationStore> JobRunner<L, S> {
    pub fn new(resolver: Arc<ModelResolver<L>>, store: Arc<S>) -> Self {
        Self { resolver, store }
    }

    /// Annotate every unannotated image of `dataset_id`.
    ///
    /// Fails only when the dataset, its model or its image list cannot be
    /// obtained. Per-image problems are recorded in the report.
    pub async fn run(&self, dataset_id: DbId) -> Result<JobReport, CoreError> {
        let mut report = JobReport::new(dataset_id, Utc::now());

        let dataset = self.store.load_job_dataset(dataset_id).await?;
        let model = self
            .resolver
            .resolve(&dataset.model, dataset.owner_id, &*self.store)
            .await?;
        let classes = resolve_class_indices(Some(dataset.classes_to_annotate.as_slice()), &model.class_names);
        let images = self.store.unannotated_images(dataset_id).await?;
        report.images_total = images.len();

        tracing::info!(
            dataset_id,
            images = images.len(),
            mode = ?model.mode,
            filtered = classes.is_some(),
            "Annotation job started"
        );

        for image in &images {
            if !tokio::fs::try_exists(&image.path).await.unwrap_or(false) {
                tracing::warn!(dataset_id, image_id = image.id, path = %image.path.display(), "Image file missing, skipping");
                report.skipped.push(ImageOutcome::new(image, "file not found on disk"));
                continue;
            }

            let annotations = match annotate_image(&model, &image.path, classes.clone()).await {
                Ok(annotations) => annotations,
                Err(e) => {
                    tracing::warn!(dataset_id, image_id = image.id, error = %e, "Inference failed for image");
                    report.failed.push(ImageOutcome::new(image, e.to_string()));
                    continue;
                }
            };

            if annotations.is_empty() {
                tracing::debug!(dataset_id, image_id = image.id, "No objects found");
                report.succeeded += 1;
                continue;
            }

            match self.store.save_image_annotations(image.id, &annotations).await {
                Ok(written) => {
                    tracing::debug!(dataset_id, image_id = image.id, written, "Annotations saved");
                    report.succeeded += 1;
                    report.annotations_created += written;
                }
                Err(e) => {
                    tracing::error!(dataset_id, image_id = image.id, error = %e, "Failed to save annotations");
                    report.failed.push(ImageOutcome::new(image, e.to_string()));
                }
            }
        }

        report.finished_at = Utc::now();
        tracing::info!(
            dataset_id,
            succeeded = report.succeeded,
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            annotations = report.annotations_created,
            "Annotation job finished"
        );
        Ok(report)
    }
}
