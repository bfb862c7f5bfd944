use std::sync::mpsc;
use std::sync::Arc;

use crate::asset::{Snapshot, VideoAsset};
use crate::remote::{
    AnalysisResult, CancellationSource, CancellationToken, GenerationError, GenerationResult,
};

pub(super) enum JobOutput {
    Image(Snapshot),
    Analysis(AnalysisResult),
    VideoAnalysis(String),
    Video(VideoAsset),
}

/// One in-flight remote call running on its own thread. Holding a
/// `PendingJob` is what makes the editor busy.
pub(super) struct PendingJob {
    operation: &'static str,
    rx: mpsc::Receiver<GenerationResult<JobOutput>>,
    cancel: CancellationSource,
}

impl PendingJob {
    pub(super) fn spawn<R, W>(operation: &'static str, remote: Arc<R>, work: W) -> Self
    where
        R: ?Sized + Send + Sync + 'static,
        W: FnOnce(&R, &CancellationToken) -> GenerationResult<JobOutput> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let cancel = CancellationSource::new();
        let token = cancel.token();
        let spawned = std::thread::Builder::new()
            .name(format!("remote-{operation}"))
            .spawn(move || {
                let result = work(remote.as_ref(), &token);
                let _ = tx.send(result);
            });
        if let Err(err) = spawned {
            tracing::warn!(operation, ?err, "failed to start remote worker");
        }
        tracing::debug!(operation, "remote job dispatched");

        Self {
            operation,
            rx,
            cancel,
        }
    }

    pub(super) const fn operation(&self) -> &'static str {
        self.operation
    }

    pub(super) fn try_result(&self) -> Option<GenerationResult<JobOutput>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(self.worker_lost())),
        }
    }

    pub(super) fn wait_result(&self) -> GenerationResult<JobOutput> {
        self.rx.recv().unwrap_or_else(|_| Err(self.worker_lost()))
    }

    pub(super) fn cancel(&self) {
        self.cancel.cancel();
    }

    fn worker_lost(&self) -> GenerationError {
        GenerationError::Remote {
            operation: self.operation,
            source: anyhow::anyhow!("worker stopped before reporting a result"),
        }
    }
}
