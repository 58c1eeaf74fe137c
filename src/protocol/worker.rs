//! Background submission worker pool
//!
//! Asynchronous submissions are admitted to a bounded backlog and executed
//! by a fixed number of worker tasks. The submitter receives an inline
//! "accepted" reply immediately; the real outcome travels later as an
//! out-of-band Acknowledge posted to the callback URL it supplied. Once a
//! job is dispatched to the pool it cannot be cancelled, and no timeout is
//! imposed on it here.

use crate::notifications::delivery::SignalTransport;
use crate::protocol::codes;
use crate::protocol::message::{Message, MessageFactory};
use crate::protocol::processors::submit::parse_submit_params;
use crate::queue::engine::QueueEngine;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// One queued background submission
#[derive(Clone, Debug)]
pub struct SubmitJob {
    pub request: Message,
    pub acknowledge_url: String,
}

/// Cloneable handle used by the submit processor to enqueue jobs
#[derive(Clone)]
pub struct SubmitWorkerHandle {
    tx: mpsc::Sender<SubmitJob>,
}

impl SubmitWorkerHandle {
    /// Enqueue without blocking; `false` means the backlog is full
    pub fn try_submit(&self, job: SubmitJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("background submission rejected: {e}");
                false
            }
        }
    }
}

/// Fixed-size pool of submission workers
pub struct SubmitWorkerPool {
    handle: SubmitWorkerHandle,
    workers: Vec<JoinHandle<()>>,
}

impl SubmitWorkerPool {
    pub fn start(
        worker_count: usize,
        backlog: usize,
        engine: Arc<QueueEngine>,
        ids: Arc<MessageFactory>,
        transport: Arc<dyn SignalTransport>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(backlog.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..worker_count.max(1))
            .map(|worker| {
                let rx = Arc::clone(&rx);
                let engine = Arc::clone(&engine);
                let ids = Arc::clone(&ids);
                let transport = Arc::clone(&transport);
                tokio::spawn(async move {
                    log::debug!("submission worker {worker} started");
                    loop {
                        // Hold the receiver lock only while waiting for a job
                        let job = { rx.lock().await.recv().await };
                        match job {
                            Some(job) => run_job(&engine, &ids, transport.as_ref(), job).await,
                            None => break,
                        }
                    }
                    log::debug!("submission worker {worker} stopped");
                })
            })
            .collect();

        Self {
            handle: SubmitWorkerHandle { tx },
            workers,
        }
    }

    pub fn handle(&self) -> SubmitWorkerHandle {
        self.handle.clone()
    }

    /// Close the backlog and wait for in-flight jobs to finish
    pub async fn shutdown(self) {
        drop(self.handle);
        for worker in self.workers {
            if let Err(e) = worker.await {
                log::warn!("submission worker terminated abnormally: {e}");
            }
        }
    }
}

/// Execute one background submission and deliver its outcome
async fn run_job(
    engine: &QueueEngine,
    ids: &MessageFactory,
    transport: &dyn SignalTransport,
    job: SubmitJob,
) {
    let acknowledge = match parse_submit_params(&job.request) {
        Ok(params) => match engine.submit(params) {
            Ok(entry) => {
                Message::acknowledge_to(&job.request, ids.next_id(), codes::RC_SUCCESS)
                    .with_param("QueueEntryID", json!(entry.entry_id))
                    .with_param("Status", json!(entry.status))
            }
            Err(e) => Message::acknowledge_to(&job.request, ids.next_id(), e.return_code())
                .with_comment(e.to_string()),
        },
        Err(e) => Message::acknowledge_to(&job.request, ids.next_id(), e.return_code())
            .with_comment(e.to_string()),
    };

    if let Err(e) = transport.deliver(&job.acknowledge_url, &acknowledge).await {
        log::warn!(
            "acknowledge delivery for {} to {} failed: {e}",
            job.request.id,
            job.acknowledge_url
        );
    }
}
