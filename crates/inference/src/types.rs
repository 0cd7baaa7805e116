//! Wire types exchanged with the inference sidecar.

use std::path::PathBuf;

use adaptlabel_core::annotation::CenterBox;
use adaptlabel_core::class_filter::ClassNames;
use serde::{Deserialize, Serialize};

/// What the model is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceTask {
    /// Boxes.
    Detect,
    /// Polygons.
    Segment,
    /// Polygons, one per prompt box, in prompt order.
    PromptedSegment,
}

/// One inference call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceRequest {
    pub image_path: PathBuf,
    pub task: InferenceTask,
    /// Restrict output to these class indices. `None` means all classes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<u32>>,
    /// Box prompts for [`InferenceTask::PromptedSegment`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prompts: Vec<CenterBox>,
}

impl InferenceRequest {
    pub fn new(image_path: impl Into<PathBuf>, task: InferenceTask) -> Self {
        Self {
            image_path: image_path.into(),
            task,
            classes: None,
            prompts: Vec::new(),
        }
    }

    pub fn with_classes(mut self, classes: Option<Vec<u32>>) -> Self {
        self.classes = classes;
        self
    }

    pub fn with_prompts(mut self, prompts: Vec<CenterBox>) -> Self {
        self.prompts = prompts;
        self
    }
}

/// Shape of one detected object, in normalized image coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectShape {
    Box {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Polygon {
        points: Vec<[f64; 2]>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub class_index: u32,
    pub confidence: f64,
    pub shape: ObjectShape,
}

/// Result of one inference call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceOutput {
    #[serde(default)]
    pub class_names: ClassNames,
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
}

impl InferenceOutput {
    /// Boxes of all box-shaped objects, in output order.
    pub fn boxes(&self) -> Vec<CenterBox> {
        self.objects
            .iter()
            .filter_map(|o| match o.shape {
                ObjectShape::Box { x, y, width, height } => Some(CenterBox { x, y, width, height }),
                ObjectShape::Polygon { .. } => None,
            })
            .collect()
    }
}
