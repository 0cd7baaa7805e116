//! Boundary to the external inference capability.
//!
//! Model weights are executed by an inference sidecar reached over HTTP.
//! This crate defines the traits the pipeline programs against
//! ([`InferenceCapability`], [`ModelLoader`]), the wire types exchanged with
//! the sidecar, and the reqwest-backed implementation ([`RemoteModelLoader`]).

pub mod api;
pub mod error;
pub mod remote;
pub mod types;

pub use error::InferenceError;
pub use remote::{RemoteModel, RemoteModelLoader};
pub use types::{DetectedObject, InferenceOutput, InferenceRequest, InferenceTask, ObjectShape};

use std::future::Future;
use std::path::Path;

use adaptlabel_core::class_filter::ClassNames;
use adaptlabel_core::model::StandardModel;

/// A loaded model that can annotate one image at a time.
pub trait InferenceCapability: Send + Sync + 'static {
    /// Class index to name table of the loaded model.
    fn class_names(&self) -> &ClassNames;

    /// Run the model on one image.
    fn predict(
        &self,
        request: &InferenceRequest,
    ) -> impl Future<Output = Result<InferenceOutput, InferenceError>> + Send;
}

/// Loads models into [`InferenceCapability`] handles.
pub trait ModelLoader: Send + Sync + 'static {
    type Model: InferenceCapability;

    /// Load one of the models shipped with the system.
    fn load_standard(
        &self,
        model: StandardModel,
    ) -> impl Future<Output = Result<Self::Model, InferenceError>> + Send;

    /// Load user-uploaded weights from disk.
    fn load_weights(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<Self::Model, InferenceError>> + Send;
}
