//! Model resolver and bounded custom-model cache.
//!
//! Standard models are loaded at most once and kept for the life of the
//! process. Custom models are cached by weights path in a [`BoundedCache`];
//! each cache slot is a [`OnceCell`] so concurrent misses on the same path
//! share a single load. A failed load leaves no slot behind.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use adaptlabel_core::annotation::AnnotationType;
use adaptlabel_core::cache::BoundedCache;
use adaptlabel_core::class_filter::ClassNames;
use adaptlabel_core::error::CoreError;
use adaptlabel_core::model::{ModelSelector, PipelineMode, StandardModel};
use adaptlabel_core::types::DbId;
use adaptlabel_db::models::custom_model::CustomModel;
use adaptlabel_inference::{InferenceCapability, ModelLoader};
use tokio::sync::{Mutex, OnceCell};

/// Lookup of owner-scoped custom model records.
pub trait CustomModelSource: Send + Sync + 'static {
    /// Return the model only if it exists and belongs to `owner_id`.
    fn find_custom_model(
        &self,
        id: DbId,
        owner_id: DbId,
    ) -> impl Future<Output = Result<Option<CustomModel>, CoreError>> + Send;
}

/// A selector resolved to loaded capabilities.
pub struct ResolvedModel<M> {
    pub mode: PipelineMode,
    pub primary: Arc<M>,
    /// First-stage detector for [`PipelineMode::BoxPrompted`].
    pub detector: Option<Arc<M>>,
    /// Class table used to label output (the detector's for box prompting).
    pub class_names: ClassNames,
}

impl<M> Clone for ResolvedModel<M> {
    fn clone(&self) -> Self {
        Self {
            mode: self.mode,
            primary: Arc::clone(&self.primary),
            detector: self.detector.clone(),
            class_names: self.class_names.clone(),
        }
    }
}

type Slot<M> = Arc<OnceCell<Arc<M>>>;

pub struct ModelResolver<L: ModelLoader> {
    loader: L,
    models_root: PathBuf,
    standard: [OnceCell<Arc<L::Model>>; 3],
    custom: Mutex<BoundedCache<PathBuf, Slot<L::Model>>>,
}

fn standard_index(model: StandardModel) -> usize {
    match model {
        StandardModel::YoloDetection => 0,
        StandardModel::YoloSegmentation => 1,
        StandardModel::Sam => 2,
    }
}

impl<L: ModelLoader> ModelResolver<L> {
    /// Create a resolver. Custom weights paths are relative to `models_root`.
    pub fn new(loader: L, models_root: impl Into<PathBuf>, cache_capacity: usize) -> Self {
        Self {
            loader,
            models_root: models_root.into(),
            standard: [OnceCell::new(), OnceCell::new(), OnceCell::new()],
            custom: Mutex::new(BoundedCache::new(cache_capacity)),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Try to load every standard model. Failures are logged and retried on
    /// first use.
    pub async fn preload_standard(&self) {
        for model in StandardModel::ALL {
            match self.standard_model(model).await {
                Ok(_) => tracing::info!(model = model.tag(), "Standard model ready"),
                Err(e) => tracing::warn!(model = model.tag(), error = %e, "Standard model not preloaded"),
            }
        }
    }

    /// Load (once) and return a standard model.
    pub async fn standard_model(&self, model: StandardModel) -> Result<Arc<L::Model>, CoreError> {
        self.standard[standard_index(model)]
            .get_or_try_init(|| async {
                self.loader
                    .load_standard(model)
                    .await
                    .map(Arc::new)
                    .map_err(|e| e.into_load_error())
            })
            .await
            .cloned()
    }

    /// Class table of the standard detector.
    pub async fn available_classes(&self) -> Result<ClassNames, CoreError> {
        let detector = self.standard_model(StandardModel::YoloDetection).await?;
        Ok(detector.class_names().clone())
    }

    /// Resolve a selector for `owner_id`.
    pub async fn resolve<S: CustomModelSource>(
        &self,
        selector: &ModelSelector,
        owner_id: DbId,
        source: &S,
    ) -> Result<ResolvedModel<L::Model>, CoreError> {
        match *selector {
            ModelSelector::Standard(StandardModel::Sam) => {
                let detector = self.standard_model(StandardModel::YoloDetection).await?;
                let primary = self.standard_model(StandardModel::Sam).await?;
                Ok(ResolvedModel {
                    mode: PipelineMode::BoxPrompted,
                    class_names: detector.class_names().clone(),
                    primary,
                    detector: Some(detector),
                })
            }
            ModelSelector::Standard(model) => {
                let primary = self.standard_model(model).await?;
                Ok(ResolvedModel {
                    mode: model.mode(),
                    class_names: primary.class_names().clone(),
                    primary,
                    detector: None,
                })
            }
            ModelSelector::Custom(id) => {
                let record = source
                    .find_custom_model(id, owner_id)
                    .await?
                    .ok_or(CoreError::NotFound {
                        entity: "CustomModel",
                        id,
                    })?;
                let declared = AnnotationType::from_str(&record.model_type)?;
                let primary = self.custom_model(&self.models_root.join(&record.file_path)).await?;
                Ok(ResolvedModel {
                    mode: PipelineMode::for_custom(declared),
                    class_names: primary.class_names().clone(),
                    primary,
                    detector: None,
                })
            }
        }
    }

    /// Load custom weights through the cache.
    pub async fn custom_model(&self, path: &Path) -> Result<Arc<L::Model>, CoreError> {
        let slot = {
            let mut cache = self.custom.lock().await;
            match cache.get(&path.to_path_buf()) {
                Some(slot) => slot,
                None => {
                    let slot: Slot<L::Model> = Arc::new(OnceCell::new());
                    if let Some((evicted, _)) = cache.insert(path.to_path_buf(), Arc::clone(&slot)) {
                        tracing::debug!(path = %evicted.display(), "Custom model evicted from cache");
                    }
                    slot
                }
            }
        };

        let result = slot
            .get_or_try_init(|| async {
                tracing::info!(path = %path.display(), "Loading custom model");
                self.loader.load_weights(path).await.map(Arc::new)
            })
            .await
            .cloned();

        match result {
            Ok(model) => Ok(model),
            Err(e) => {
                let mut cache = self.custom.lock().await;
                let key = path.to_path_buf();
                if cache.get(&key).is_some_and(|current| Arc::ptr_eq(&current, &slot)) {
                    cache.remove(&key);
                }
                tracing::warn!(path = %path.display(), error = %e, "Custom model load failed");
                Err(e.into_load_error())
            }
        }
    }

    /// Drop a cached custom model, e.g. after its weights were deleted.
    pub async fn evict_custom_model(&self, path: &Path) -> bool {
        self.custom.lock().await.remove(&path.to_path_buf()).is_some()
    }

    /// Number of custom models currently cached.
    pub async fn cached_custom_models(&self) -> usize {
        self.custom.lock().await.len()
    }
}
