//! Bounded annotation job queue.
//!
//! Jobs are dataset ids pushed onto a bounded channel and drained by a fixed
//! pool of worker tasks. A dataset has at most one job queued or running at a
//! time; a second submission is rejected with [`CoreError::Conflict`], as is
//! any submission while the channel is full. The last report of every
//! dataset is retained for status queries.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use adaptlabel_core::error::CoreError;
use adaptlabel_core::types::DbId;
use adaptlabel_inference::ModelLoader;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::runner::{JobReport, JobRunner};
use crate::store::AnnotationStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Queued,
    Running,
}

/// Job status of one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub dataset_id: DbId,
    pub state: JobState,
    pub last_report: Option<JobReport>,
}

#[derive(Default)]
struct QueueState {
    queued: HashSet<DbId>,
    running: HashSet<DbId>,
    reports: HashMap<DbId, JobReport>,
}

/// Handle used to submit jobs and query their status. Cheap to clone.
#[derive(Clone)]
pub struct AnnotationQueue {
    sender: mpsc::Sender<DbId>,
    state: Arc<Mutex<QueueState>>,
}

impl AnnotationQueue {
    /// Spawn `workers` worker tasks sharing a channel of `depth` slots.
    ///
    /// Workers stop when `cancel` fires. A job interrupted by cancellation
    /// is abandoned; images it already committed keep their annotations.
    pub fn start<L, S>(
        runner: Arc<JobRunner<L, S>>,
        workers: usize,
        depth: usize,
        cancel: CancellationToken,
    ) -> (Self, Vec<JoinHandle<()>>)
    where
        L: ModelLoader,
        S: AnnotationStore,
    {
        let (sender, receiver) = mpsc::channel(depth.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let state = Arc::new(Mutex::new(QueueState::default()));

        let handles = (0..workers)
            .map(|worker| {
                tokio::spawn(work(
                    worker,
                    Arc::clone(&runner),
                    Arc::clone(&receiver),
                    Arc::clone(&state),
                    cancel.clone(),
                ))
            })
            .collect();

        tracing::info!(workers, depth, "Annotation queue started");
        (Self { sender, state }, handles)
    }

    /// Enqueue an annotation job for `dataset_id`.
    pub async fn submit(&self, dataset_id: DbId) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        if state.queued.contains(&dataset_id) || state.running.contains(&dataset_id) {
            return Err(CoreError::Conflict(format!(
                "Annotation already in progress for dataset {dataset_id}"
            )));
        }

        match self.sender.try_send(dataset_id) {
            Ok(()) => {
                state.queued.insert(dataset_id);
                tracing::info!(dataset_id, "Annotation job queued");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(dataset_id, "Annotation queue full");
                Err(CoreError::Conflict("Annotation queue is full, try again later".into()))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(CoreError::Internal("Annotation queue is not running".into()))
            }
        }
    }

    pub async fn status(&self, dataset_id: DbId) -> JobStatus {
        let state = self.state.lock().await;
        let job_state = if state.running.contains(&dataset_id) {
            JobState::Running
        } else if state.queued.contains(&dataset_id) {
            JobState::Queued
        } else {
            JobState::Idle
        };
        JobStatus {
            dataset_id,
            state: job_state,
            last_report: state.reports.get(&dataset_id).cloned(),
        }
    }

    /// Forget the retained report of a deleted dataset.
    pub async fn forget(&self, dataset_id: DbId) {
        self.state.lock().await.reports.remove(&dataset_id);
    }
}

async fn work<L, S>(
    worker: usize,
    runner: Arc<JobRunner<L, S>>,
    receiver: Arc<Mutex<mpsc::Receiver<DbId>>>,
    state: Arc<Mutex<QueueState>>,
    cancel: CancellationToken,
) where
    L: ModelLoader,
    S: AnnotationStore,
{
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => None,
            id = async { receiver.lock().await.recv().await } => id,
        };
        let Some(dataset_id) = next else {
            break;
        };

        {
            let mut state = state.lock().await;
            state.queued.remove(&dataset_id);
            state.running.insert(dataset_id);
        }

        let started_at = Utc::now();
        tracing::info!(worker, dataset_id, "Annotation job picked up");
        let outcome = tokio::select! {
            _ = cancel.cancelled() => None,
            result = runner.run(dataset_id) => Some(result),
        };

        let mut state = state.lock().await;
        state.running.remove(&dataset_id);
        match outcome {
            Some(Ok(report)) => {
                state.reports.insert(dataset_id, report);
            }
            Some(Err(CoreError::NotFound { entity: "Dataset", .. })) => {
                // Deleted while queued; its status was already forgotten.
                tracing::info!(worker, dataset_id, "Annotation job dropped, dataset no longer exists");
            }
            Some(Err(e)) => {
                tracing::error!(worker, dataset_id, error = %e, "Annotation job failed");
                state.reports.insert(dataset_id, JobReport::aborted(dataset_id, started_at, &e));
            }
            None => {
                tracing::warn!(worker, dataset_id, "Annotation job abandoned on shutdown");
                break;
            }
        }
    }
    tracing::info!(worker, "Annotation worker stopped");
}
