// Background download worker
//
// Runs one DownloadService call on its own task and reports back over two
// one-way channels: a progress stream and a single terminal result.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use super::errors::AppError;
use super::models::{DownloadOutcome, DownloadProgress, DownloadRequest};
use super::progress::ProgressParser;
use super::service::DownloadService;
use super::traits::{ProgressEvent, ProgressHook};

/// Message read off a worker
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Progress(DownloadProgress),
    /// Always the last event of a worker
    Finished(DownloadOutcome),
}

pub struct DownloadWorker {
    progress_rx: mpsc::UnboundedReceiver<DownloadProgress>,
    result_rx: oneshot::Receiver<DownloadOutcome>,
    outcome: Option<DownloadOutcome>,
    done: bool,
}

impl DownloadWorker {
    /// Hand `request` to a new task. Must be called inside a tokio runtime.
    pub fn spawn(service: Arc<DownloadService>, request: DownloadRequest) -> Self {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = oneshot::channel();

        tokio::spawn(async move {
            let url = request.url().to_string();
            // Inner task so a panic in the engine still yields a terminal result
            let joined = tokio::spawn(run(service, request, progress_tx)).await;

            let outcome = match joined {
                Ok(Ok(())) => DownloadOutcome::Succeeded,
                Ok(Err(e)) => {
                    debug!(url, kind = e.kind(), "Download worker got an error");
                    DownloadOutcome::Failed(e.to_string())
                }
                Err(e) => {
                    error!(url, error = %e, "Download worker crashed");
                    DownloadOutcome::Failed(AppError::unexpected(e.to_string()).to_string())
                }
            };

            debug!(url, outcome = %outcome, "Download worker finished");
            let _ = result_tx.send(outcome);
        });

        Self {
            progress_rx,
            result_rx,
            outcome: None,
            done: false,
        }
    }

    /// Next event in emission order. After `Finished` this returns `None`.
    pub async fn next_event(&mut self) -> Option<WorkerEvent> {
        loop {
            if let Some(outcome) = self.outcome.take() {
                // Terminal result is in; flush what the hooks sent before it
                if let Ok(progress) = self.progress_rx.try_recv() {
                    self.outcome = Some(outcome);
                    return Some(WorkerEvent::Progress(progress));
                }
                self.done = true;
                return Some(WorkerEvent::Finished(outcome));
            }

            if self.done {
                return None;
            }

            tokio::select! {
                biased;
                Some(progress) = self.progress_rx.recv() => {
                    return Some(WorkerEvent::Progress(progress));
                }
                result = &mut self.result_rx => {
                    self.outcome = Some(result.unwrap_or_else(|_| {
                        DownloadOutcome::Failed(
                            AppError::unexpected("download worker stopped").to_string(),
                        )
                    }));
                }
            }
        }
    }
}

async fn run(
    service: Arc<DownloadService>,
    request: DownloadRequest,
    progress_tx: mpsc::UnboundedSender<DownloadProgress>,
) -> Result<(), AppError> {
    let hook: ProgressHook = Arc::new(move |event: &ProgressEvent| {
        let _ = progress_tx.send(ProgressParser::parse(event));
    });

    // The hook (and its sender) is dropped with the options when this returns
    service.download(&request, Some(hook)).await
}
