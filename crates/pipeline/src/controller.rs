//! Per-image pipeline: one inference pass, or detection followed by
//! box-prompted segmentation.

use std::path::Path;

use adaptlabel_core::annotation::CenterBox;
use adaptlabel_core::error::CoreError;
use adaptlabel_core::model::PipelineMode;
use adaptlabel_db::models::annotation::NewAnnotation;
use adaptlabel_inference::{
    DetectedObject, InferenceCapability, InferenceRequest, InferenceTask, ObjectShape,
};

use crate::normalizer::normalize;
use crate::resolver::ResolvedModel;

/// Annotate one image with a resolved model.
///
/// `classes` is the class-index filter from
/// [`resolve_class_indices`](adaptlabel_core::class_filter::resolve_class_indices).
/// An empty filter matches nothing, so no inference is run.
pub async fn annotate_image<M: InferenceCapability>(
    model: &ResolvedModel<M>,
    image_path: &Path,
    classes: Option<Vec<u32>>,
) -> Result<Vec<NewAnnotation>, CoreError> {
    if classes.as_ref().is_some_and(Vec::is_empty) {
        return Ok(Vec::new());
    }
    let target = model.mode.output_type();

    let objects = match model.mode {
        PipelineMode::Detection => {
            let request = InferenceRequest::new(image_path, InferenceTask::Detect).with_classes(classes);
            predict(&*model.primary, &request).await?
        }
        PipelineMode::Segmentation => {
            let request = InferenceRequest::new(image_path, InferenceTask::Segment).with_classes(classes);
            predict(&*model.primary, &request).await?
        }
        PipelineMode::BoxPrompted => {
            let detector = model.detector.as_deref().ok_or_else(|| {
                CoreError::Internal("box-prompted pipeline has no detector".into())
            })?;
            box_prompted(detector, &*model.primary, image_path, classes).await?
        }
    };

    normalize(&objects, &model.class_names, target)
}

async fn predict<M: InferenceCapability>(
    model: &M,
    request: &InferenceRequest,
) -> Result<Vec<DetectedObject>, CoreError> {
    model
        .predict(request)
        .await
        .map(|out| out.objects)
        .map_err(|e| e.into_pipeline_error())
}

/// Detect, then segment with the detections as prompts, then carry each
/// detection's class and confidence over to the mask at the same position.
async fn box_prompted<M: InferenceCapability>(
    detector: &M,
    segmenter: &M,
    image_path: &Path,
    classes: Option<Vec<u32>>,
) -> Result<Vec<DetectedObject>, CoreError> {
    let detect = InferenceRequest::new(image_path, InferenceTask::Detect).with_classes(classes);
    let detections = predict(detector, &detect).await?;

    let prompts = detections
        .iter()
        .map(|d| match d.shape {
            ObjectShape::Box { x, y, width, height } => Ok(CenterBox { x, y, width, height }),
            ObjectShape::Polygon { .. } => Err(CoreError::Pipeline(
                "detector returned a polygon where a box was expected".into(),
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if prompts.is_empty() {
        tracing::debug!(image = %image_path.display(), "No detections, skipping segmentation");
        return Ok(Vec::new());
    }

    let segment = InferenceRequest::new(image_path, InferenceTask::PromptedSegment).with_prompts(prompts);
    let masks = predict(segmenter, &segment).await?;

    if masks.len() != detections.len() {
        return Err(CoreError::Pipeline(format!(
            "segmentation returned {} masks for {} prompts",
            masks.len(),
            detections.len()
        )));
    }

    Ok(detections
        .into_iter()
        .zip(masks)
        .map(|(det, mask)| DetectedObject {
            class_index: det.class_index,
            confidence: det.confidence,
            shape: mask.shape,
        })
        .collect())
}
