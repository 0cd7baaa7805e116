//! Model selectors and pipeline modes.
//!
//! A dataset refers to its model by a string: either one of the standard
//! tags shipped with the platform, or the decimal id of a user-uploaded
//! custom model. The selector decides which inference pipeline runs.

use serde::Serialize;

use crate::annotation::AnnotationType;
use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Standard models
// ---------------------------------------------------------------------------

/// Tag of the standard detection model.
pub const TAG_YOLO_DETECTION: &str = "yolov8n_det";

/// Tag of the standard segmentation model.
pub const TAG_YOLO_SEGMENTATION: &str = "yolov8n_seg";

/// Tag of the box-prompted segmentation pipeline.
pub const TAG_SAM: &str = "sam";

/// Pre-loaded, process-lifetime inference models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StandardModel {
    YoloDetection,
    YoloSegmentation,
    /// Segment-anything, prompted with boxes from [`StandardModel::YoloDetection`].
    Sam,
}

impl StandardModel {
    pub const ALL: [StandardModel; 3] = [Self::YoloDetection, Self::YoloSegmentation, Self::Sam];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::YoloDetection => TAG_YOLO_DETECTION,
            Self::YoloSegmentation => TAG_YOLO_SEGMENTATION,
            Self::Sam => TAG_SAM,
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.tag() == tag)
    }

    /// The pipeline this model drives.
    pub fn mode(&self) -> PipelineMode {
        match self {
            Self::YoloDetection => PipelineMode::Detection,
            Self::YoloSegmentation => PipelineMode::Segmentation,
            Self::Sam => PipelineMode::BoxPrompted,
        }
    }

    /// Default standard model for a dataset that names no model.
    pub fn default_for(annotation_type: AnnotationType) -> Self {
        match annotation_type {
            AnnotationType::Detection => Self::YoloDetection,
            AnnotationType::Segmentation => Self::YoloSegmentation,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline mode
// ---------------------------------------------------------------------------

/// How inference is run for an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// Single detection pass producing boxes.
    Detection,
    /// Single segmentation pass producing polygons.
    Segmentation,
    /// Detection pass whose boxes prompt a segmentation pass.
    BoxPrompted,
}

impl PipelineMode {
    /// Annotation type recorded for this mode's output.
    pub fn output_type(&self) -> AnnotationType {
        match self {
            Self::Detection => AnnotationType::Detection,
            Self::Segmentation | Self::BoxPrompted => AnnotationType::Segmentation,
        }
    }

    /// Mode for a custom model of the declared type.
    pub fn for_custom(declared: AnnotationType) -> Self {
        match declared {
            AnnotationType::Detection => Self::Detection,
            AnnotationType::Segmentation => Self::Segmentation,
        }
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// A dataset's model reference, parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSelector {
    Standard(StandardModel),
    Custom(DbId),
}

impl ModelSelector {
    /// Parse a stored model reference.
    pub fn parse(reference: &str) -> Result<Self, CoreError> {
        let reference = reference.trim();
        if let Some(standard) = StandardModel::from_tag(reference) {
            return Ok(Self::Standard(standard));
        }
        match reference.parse::<DbId>() {
            Ok(id) if id > 0 => Ok(Self::Custom(id)),
            _ => Err(CoreError::Validation(format!(
                "Unknown model '{reference}'. Use one of {TAG_YOLO_DETECTION}, \
                 {TAG_YOLO_SEGMENTATION}, {TAG_SAM} or a custom model id"
            ))),
        }
    }

    /// Resolve a dataset's optional model reference, defaulting by annotation type.
    pub fn for_dataset(
        reference: Option<&str>,
        annotation_type: AnnotationType,
    ) -> Result<Self, CoreError> {
        match reference.map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) => Self::parse(r),
            None => Ok(Self::Standard(StandardModel::default_for(annotation_type))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_standard_tags() {
        assert_eq!(
            ModelSelector::parse("yolov8n_det").unwrap(),
            ModelSelector::Standard(StandardModel::YoloDetection)
        );
        assert_eq!(
            ModelSelector::parse("sam").unwrap(),
            ModelSelector::Standard(StandardModel::Sam)
        );
    }

    #[test]
    fn parses_custom_ids() {
        assert_eq!(ModelSelector::parse(" 42 ").unwrap(), ModelSelector::Custom(42));
    }

    #[test]
    fn rejects_garbage_and_non_positive_ids() {
        assert_matches!(ModelSelector::parse("resnet"), Err(CoreError::Validation(_)));
        assert_matches!(ModelSelector::parse("0"), Err(CoreError::Validation(_)));
        assert_matches!(ModelSelector::parse("-3"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn dataset_without_model_defaults_by_type() {
        assert_eq!(
            ModelSelector::for_dataset(None, AnnotationType::Segmentation).unwrap(),
            ModelSelector::Standard(StandardModel::YoloSegmentation)
        );
        assert_eq!(
            ModelSelector::for_dataset(Some("  "), AnnotationType::Detection).unwrap(),
            ModelSelector::Standard(StandardModel::YoloDetection)
        );
    }

    #[test]
    fn sam_records_segmentation() {
        assert_eq!(StandardModel::Sam.mode(), PipelineMode::BoxPrompted);
        assert_eq!(PipelineMode::BoxPrompted.output_type(), AnnotationType::Segmentation);
    }
}
