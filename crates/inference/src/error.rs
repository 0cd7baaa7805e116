use adaptlabel_core::error::CoreError;

/// Errors from the inference boundary.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The sidecar returned a non-2xx status code.
    #[error("Inference API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A weights file referenced by a custom model is not on disk.
    #[error("Weights file not found: {0}")]
    WeightsMissing(String),

    /// The response could not be interpreted.
    #[error("Malformed inference response: {0}")]
    Decode(String),
}

impl InferenceError {
    /// Classify as a failure to load a model.
    pub fn into_load_error(self) -> CoreError {
        CoreError::ModelLoad(self.to_string())
    }

    /// Classify as a failure while running a loaded model.
    pub fn into_pipeline_error(self) -> CoreError {
        CoreError::Pipeline(self.to_string())
    }
}
