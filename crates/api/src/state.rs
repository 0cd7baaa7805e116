use std::sync::Arc;

use adaptlabel_inference::api::InferenceApi;
use adaptlabel_inference::RemoteModelLoader;
use adaptlabel_pipeline::queue::AnnotationQueue;
use adaptlabel_pipeline::resolver::ModelResolver;
use adaptlabel_pipeline::runner::JobRunner;
use adaptlabel_pipeline::store::PgAnnotationStore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;

/// Resolver backed by the inference sidecar.
pub type Resolver = ModelResolver<RemoteModelLoader>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: adaptlabel_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Model resolver shared with the annotation workers.
    pub resolver: Arc<Resolver>,
    /// Annotation job queue.
    pub queue: AnnotationQueue,
}

impl AppState {
    /// Build the state and spawn the annotation workers.
    ///
    /// Workers stop when `cancel` fires; the returned handles let the caller
    /// wait for them.
    pub fn start(
        pool: adaptlabel_db::DbPool,
        config: ServerConfig,
        cancel: CancellationToken,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let loader = RemoteModelLoader::new(InferenceApi::new(config.inference_url.clone()));
        let resolver = Arc::new(ModelResolver::new(
            loader,
            config.models_root.clone(),
            config.model_cache_capacity,
        ));
        let store = Arc::new(PgAnnotationStore::new(pool.clone(), config.upload_root.clone()));
        let runner = Arc::new(JobRunner::new(Arc::clone(&resolver), store));
        let (queue, workers) = AnnotationQueue::start(
            runner,
            config.annotation_workers,
            config.annotation_queue_depth,
            cancel,
        );

        let state = Self {
            pool,
            config: Arc::new(config),
            resolver,
            queue,
        };
        (state, workers)
    }
}
