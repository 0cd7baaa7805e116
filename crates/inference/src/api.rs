//! REST API client for the inference sidecar.
//!
//! Endpoints:
//!
//! | Method | Path                        | Purpose                          |
//! |--------|-----------------------------|----------------------------------|
//! | GET    | `/health`                   | liveness                         |
//! | POST   | `/models/load`              | load a standard model or weights |
//! | POST   | `/models/{handle}/predict`  | run a loaded model on one image  |

use adaptlabel_core::class_filter::ClassNames;
use serde::{Deserialize, Serialize};

use crate::error::InferenceError;
use crate::types::{InferenceOutput, InferenceRequest};

/// HTTP client for a single inference sidecar.
pub struct InferenceApi {
    client: reqwest::Client,
    api_url: String,
}

/// Body of `POST /models/load`. Exactly one field is set.
#[derive(Debug, Serialize)]
pub struct LoadRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights_path: Option<&'a str>,
}

/// Response of `POST /models/load`.
#[derive(Debug, Deserialize)]
pub struct LoadResponse {
    /// Sidecar-assigned handle used in predict calls.
    pub model: String,
    pub class_names: ClassNames,
}

impl InferenceApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://localhost:8500`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Check that the sidecar is reachable.
    pub async fn health(&self) -> Result<(), InferenceError> {
        let response = self
            .client
            .get(format!("{}/health", self.api_url))
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Load a model and return its handle and class table.
    pub async fn load(&self, request: &LoadRequest<'_>) -> Result<LoadResponse, InferenceError> {
        let response = self
            .client
            .post(format!("{}/models/load", self.api_url))
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Run a loaded model on one image.
    pub async fn predict(
        &self,
        handle: &str,
        request: &InferenceRequest,
    ) -> Result<InferenceOutput, InferenceError> {
        let response = self
            .client
            .post(format!("{}/models/{}/predict", self.api_url, handle))
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`InferenceError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, InferenceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(InferenceError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, InferenceError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| InferenceError::Decode(e.to_string()))
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), InferenceError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
