//! In-memory fakes shared by the pipeline unit tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adaptlabel_core::annotation::AnnotationType;
use adaptlabel_core::class_filter::ClassNames;
use adaptlabel_core::error::CoreError;
use adaptlabel_core::model::{ModelSelector, StandardModel};
use adaptlabel_core::types::DbId;
use adaptlabel_db::models::annotation::NewAnnotation;
use adaptlabel_db::models::custom_model::CustomModel;
use adaptlabel_inference::{
    DetectedObject, InferenceCapability, InferenceError, InferenceOutput, InferenceRequest,
    InferenceTask, ModelLoader, ObjectShape,
};

use crate::resolver::CustomModelSource;
use crate::store::{AnnotationStore, JobDataset, JobImage};

pub const TRIANGLE: &[[f64; 2]] = &[[0.1, 0.1], [0.5, 0.1], [0.3, 0.4]];

pub fn boxed(class_index: u32, confidence: f64, x: f64, y: f64, width: f64, height: f64) -> DetectedObject {
    DetectedObject {
        class_index,
        confidence,
        shape: ObjectShape::Box { x, y, width, height },
    }
}

pub fn polygon(class_index: u32, confidence: f64, points: &[[f64; 2]]) -> DetectedObject {
    DetectedObject {
        class_index,
        confidence,
        shape: ObjectShape::Polygon {
            points: points.to_vec(),
        },
    }
}

pub fn custom_model(id: DbId, owner_id: DbId, model_type: &str, file_path: &str) -> CustomModel {
    CustomModel {
        id,
        owner_id,
        name: format!("model-{id}"),
        model_type: model_type.to_string(),
        file_path: file_path.to_string(),
        created_at: chrono::Utc::now(),
    }
}

fn default_class_names() -> ClassNames {
    [(0, "person"), (15, "cat"), (16, "dog")]
        .into_iter()
        .map(|(i, n)| (i, n.to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Loader and model
// ---------------------------------------------------------------------------

#[derive(Default)]
struct LoaderState {
    responses: HashMap<InferenceTask, Vec<DetectedObject>>,
    requests: Vec<InferenceRequest>,
    failing_images: HashSet<String>,
    failing_paths: HashSet<PathBuf>,
    standard_loads: usize,
    loaded_paths: Vec<PathBuf>,
}

/// Scripted loader. Every model it hands out shares its state, so responses
/// and failures can be changed after models are loaded.
#[derive(Clone, Default)]
pub struct FakeLoader {
    state: Arc<Mutex<LoaderState>>,
    load_delay: Duration,
}

impl FakeLoader {
    /// Delay every load, standard or custom.
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Objects returned for every request of `task`.
    pub fn respond(&self, task: InferenceTask, objects: Vec<DetectedObject>) {
        self.state.lock().unwrap().responses.insert(task, objects);
    }

    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Fail inference on any image with this file name.
    pub fn fail_image(&self, file_name: &str) {
        self.state.lock().unwrap().failing_images.insert(file_name.to_string());
    }

    pub fn heal_image(&self, file_name: &str) {
        self.state.lock().unwrap().failing_images.remove(file_name);
    }

    /// Fail loading weights from this path.
    pub fn fail_path(&self, path: impl AsRef<Path>) {
        self.state.lock().unwrap().failing_paths.insert(path.as_ref().to_path_buf());
    }

    pub fn heal_path(&self, path: impl AsRef<Path>) {
        self.state.lock().unwrap().failing_paths.remove(path.as_ref());
    }

    pub fn standard_loads(&self) -> usize {
        self.state.lock().unwrap().standard_loads
    }

    /// Attempted weight loads, including failed ones.
    pub fn weight_loads(&self) -> usize {
        self.state.lock().unwrap().loaded_paths.len()
    }

    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().loaded_paths.clone()
    }

    async fn delay(&self) {
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
    }

    fn model(&self) -> FakeModel {
        FakeModel {
            state: Arc::clone(&self.state),
            class_names: default_class_names(),
        }
    }
}

impl ModelLoader for FakeLoader {
    type Model = FakeModel;

    async fn load_standard(&self, _model: StandardModel) -> Result<FakeModel, InferenceError> {
        self.delay().await;
        self.state.lock().unwrap().standard_loads += 1;
        Ok(self.model())
    }

    async fn load_weights(&self, path: &Path) -> Result<FakeModel, InferenceError> {
        self.delay().await;
        let failing = {
            let mut state = self.state.lock().unwrap();
            state.loaded_paths.push(path.to_path_buf());
            state.failing_paths.contains(path)
        };
        if failing {
            return Err(InferenceError::WeightsMissing(path.display().to_string()));
        }
        Ok(self.model())
    }
}

pub struct FakeModel {
    state: Arc<Mutex<LoaderState>>,
    class_names: ClassNames,
}

impl InferenceCapability for FakeModel {
    fn class_names(&self) -> &ClassNames {
        &self.class_names
    }

    async fn predict(&self, request: &InferenceRequest) -> Result<InferenceOutput, InferenceError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());

        let file_name = request
            .image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if state.failing_images.contains(&file_name) {
            return Err(InferenceError::Api {
                status: 500,
                body: format!("cannot read {file_name}"),
            });
        }

        Ok(InferenceOutput {
            class_names: self.class_names.clone(),
            objects: state.responses.get(&request.task).cloned().unwrap_or_default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Custom model source
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeSource {
    models: Vec<CustomModel>,
}

impl FakeSource {
    pub fn with(models: Vec<CustomModel>) -> Self {
        Self { models }
    }
}

impl CustomModelSource for FakeSource {
    async fn find_custom_model(&self, id: DbId, owner_id: DbId) -> Result<Option<CustomModel>, CoreError> {
        Ok(self
            .models
            .iter()
            .find(|m| m.id == id && m.owner_id == owner_id)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// Annotation store
// ---------------------------------------------------------------------------

struct StoreState {
    model: ModelSelector,
    classes: Vec<String>,
    images: Vec<JobImage>,
    annotations: HashMap<DbId, Vec<NewAnnotation>>,
    failing_saves: HashSet<String>,
}

/// Dataset 1 owned by user 1, detection, no class selection. Only dataset 1
/// exists.
pub struct FakeStore {
    state: Mutex<StoreState>,
    models: FakeSource,
}

impl FakeStore {
    /// Create the dataset with one image per name, each backed by a real file
    /// under `dir`.
    pub fn new(dir: &Path, file_names: &[&str]) -> Self {
        let images = file_names
            .iter()
            .zip(1..)
            .map(|(name, id)| {
                let path = dir.join(name);
                std::fs::write(&path, b"fake image").unwrap();
                JobImage {
                    id,
                    file_name: name.to_string(),
                    path,
                }
            })
            .collect();
        Self {
            state: Mutex::new(StoreState {
                model: ModelSelector::Standard(StandardModel::YoloDetection),
                classes: Vec::new(),
                images,
                annotations: HashMap::new(),
                failing_saves: HashSet::new(),
            }),
            models: FakeSource::default(),
        }
    }

    pub fn add_image_without_file(&self, dir: &Path, file_name: &str) {
        let mut state = self.state.lock().unwrap();
        let id = state.images.len() as DbId + 1;
        state.images.push(JobImage {
            id,
            file_name: file_name.to_string(),
            path: dir.join(file_name),
        });
    }

    pub fn set_model(&self, model: ModelSelector) {
        self.state.lock().unwrap().model = model;
    }

    pub fn set_classes(&self, classes: &[&str]) {
        self.state.lock().unwrap().classes = classes.iter().map(|c| c.to_string()).collect();
    }

    /// Reject saves for the image with this file name.
    pub fn fail_saves_for(&self, file_name: &str) {
        self.state.lock().unwrap().failing_saves.insert(file_name.to_string());
    }

    pub fn heal_saves(&self) {
        self.state.lock().unwrap().failing_saves.clear();
    }

    pub fn total_annotations(&self) -> usize {
        self.state.lock().unwrap().annotations.values().map(Vec::len).sum()
    }
}

impl CustomModelSource for FakeStore {
    async fn find_custom_model(&self, id: DbId, owner_id: DbId) -> Result<Option<CustomModel>, CoreError> {
        self.models.find_custom_model(id, owner_id).await
    }
}

impl AnnotationStore for FakeStore {
    async fn load_job_dataset(&self, dataset_id: DbId) -> Result<JobDataset, CoreError> {
        if dataset_id != 1 {
            return Err(CoreError::NotFound {
                entity: "Dataset",
                id: dataset_id,
            });
        }
        let state = self.state.lock().unwrap();
        Ok(JobDataset {
            id: 1,
            owner_id: 1,
            annotation_type: AnnotationType::Detection,
            model: state.model.clone(),
            classes_to_annotate: state.classes.clone(),
        })
    }

    async fn unannotated_images(&self, _dataset_id: DbId) -> Result<Vec<JobImage>, CoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .images
            .iter()
            .filter(|img| !state.annotations.contains_key(&img.id))
            .cloned()
            .collect())
    }

    async fn save_image_annotations(
        &self,
        image_id: DbId,
        annotations: &[NewAnnotation],
    ) -> Result<u64, CoreError> {
        let mut state = self.state.lock().unwrap();
        let failing = state
            .images
            .iter()
            .any(|img| img.id == image_id && state.failing_saves.contains(&img.file_name));
        if failing {
            return Err(CoreError::Internal("Database error: connection reset".into()));
        }
        state.annotations.insert(image_id, annotations.to_vec());
        Ok(annotations.len() as u64)
    }
}
