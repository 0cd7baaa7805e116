//! [`ModelLoader`] and [`InferenceCapability`] backed by the sidecar API.

use std::path::Path;
use std::sync::Arc;

use adaptlabel_core::class_filter::ClassNames;
use adaptlabel_core::model::StandardModel;

use crate::api::{InferenceApi, LoadRequest};
use crate::error::InferenceError;
use crate::types::{InferenceOutput, InferenceRequest};
use crate::{InferenceCapability, ModelLoader};

/// A model loaded inside the sidecar.
pub struct RemoteModel {
    api: Arc<InferenceApi>,
    handle: String,
    class_names: ClassNames,
}

impl RemoteModel {
    pub fn handle(&self) -> &str {
        &self.handle
    }
}

impl InferenceCapability for RemoteModel {
    fn class_names(&self) -> &ClassNames {
        &self.class_names
    }

    async fn predict(&self, request: &InferenceRequest) -> Result<InferenceOutput, InferenceError> {
        let mut output = self.api.predict(&self.handle, request).await?;
        if output.class_names.is_empty() {
            output.class_names = self.class_names.clone();
        }
        Ok(output)
    }
}

/// Loads models by asking the sidecar to open them.
#[derive(Clone)]
pub struct RemoteModelLoader {
    api: Arc<InferenceApi>,
}

impl RemoteModelLoader {
    pub fn new(api: InferenceApi) -> Self {
        Self { api: Arc::new(api) }
    }

    pub fn api(&self) -> &InferenceApi {
        &self.api
    }

    async fn load(&self, request: LoadRequest<'_>) -> Result<RemoteModel, InferenceError> {
        let loaded = self.api.load(&request).await?;
        tracing::info!(
            handle = %loaded.model,
            classes = loaded.class_names.len(),
            "Inference model loaded"
        );
        Ok(RemoteModel {
            api: Arc::clone(&self.api),
            handle: loaded.model,
            class_names: loaded.class_names,
        })
    }
}

impl ModelLoader for RemoteModelLoader {
    type Model = RemoteModel;

    async fn load_standard(&self, model: StandardModel) -> Result<RemoteModel, InferenceError> {
        self.load(LoadRequest {
            standard: Some(model.tag()),
            weights_path: None,
        })
        .await
    }

    async fn load_weights(&self, path: &Path) -> Result<RemoteModel, InferenceError> {
        let display = path.display().to_string();
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(InferenceError::WeightsMissing(display));
        }
        // The sidecar resolves paths from its own working directory.
        let absolute = tokio::fs::canonicalize(path)
            .await
            .map(|p| p.display().to_string())
            .unwrap_or(display);
        self.load(LoadRequest {
            standard: None,
            weights_path: Some(&absolute),
        })
        .await
    }
}
