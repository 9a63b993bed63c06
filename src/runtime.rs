//! Runtime for executing conversations
//!
//! `ChatRuntime` turns one inbound event into state changes and replies.
//! `Dispatcher` owns one worker task per user so events from the same user
//! are processed in arrival order while different users proceed in parallel.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::ChatRuntime;
pub use traits::*;

use crate::session::UserId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Events a user may have queued before further ones are refused
const WORKER_QUEUE: usize = 32;

/// A worker with nothing to do for this long shuts down
const WORKER_IDLE: Duration = Duration::from_secs(600);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("event queue for user {0} is full")]
    QueueFull(UserId),
    #[error("worker for user {0} is no longer accepting events")]
    Closed(UserId),
}

/// Handle to a running per-user worker
struct WorkerHandle {
    event_tx: mpsc::Sender<InboundEvent>,
    task: JoinHandle<()>,
}

/// Manager for all per-user workers
pub struct Dispatcher<L, O>
where
    L: LlmClient + 'static,
    O: OutboundSink + 'static,
{
    runtime: Arc<ChatRuntime<L, O>>,
    workers: RwLock<HashMap<UserId, WorkerHandle>>,
    cancel: CancellationToken,
}

impl<L, O> Dispatcher<L, O>
where
    L: LlmClient + 'static,
    O: OutboundSink + 'static,
{
    pub fn new(runtime: Arc<ChatRuntime<L, O>>, cancel: CancellationToken) -> Self {
        Self {
            runtime,
            workers: RwLock::new(HashMap::new()),
            cancel,
        }
    }

    /// Queue an event for its user's worker, starting the worker if needed.
    ///
    /// Never waits on the worker itself: a user whose queue is full gets
    /// [`DispatchError::QueueFull`] and everyone else is unaffected.
    pub async fn dispatch(&self, event: InboundEvent) -> Result<(), DispatchError> {
        let user_id = event.user_id;
        let event = match self.get_or_spawn(user_id).await.try_send(event) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Full(_)) => return Err(DispatchError::QueueFull(user_id)),
            // The worker went idle after we picked up its sender
            Err(TrySendError::Closed(event)) => event,
        };
        self.get_or_spawn(user_id)
            .await
            .try_send(event)
            .map_err(|e| match e {
                TrySendError::Full(_) => DispatchError::QueueFull(user_id),
                TrySendError::Closed(_) => DispatchError::Closed(user_id),
            })
    }

    async fn get_or_spawn(&self, user_id: UserId) -> mpsc::Sender<InboundEvent> {
        // Check if already running
        {
            let workers = self.workers.read().await;
            if let Some(handle) = workers.get(&user_id) {
                if !handle.event_tx.is_closed() {
                    return handle.event_tx.clone();
                }
            }
        }

        let mut workers = self.workers.write().await;
        if let Some(handle) = workers.get(&user_id) {
            if !handle.event_tx.is_closed() {
                return handle.event_tx.clone();
            }
        }

        // An idled-out worker may still be finishing its last events
        let previous = workers.remove(&user_id).map(|handle| handle.task);
        workers.retain(|_, handle| !handle.task.is_finished());

        let (event_tx, event_rx) = mpsc::channel::<InboundEvent>(WORKER_QUEUE);
        let task = tokio::spawn(run_worker(
            user_id,
            Arc::clone(&self.runtime),
            event_rx,
            self.cancel.clone(),
            previous,
        ));

        workers.insert(
            user_id,
            WorkerHandle {
                event_tx: event_tx.clone(),
                task,
            },
        );
        event_tx
    }

    /// Stop accepting work and wait for in-flight events to finish
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let workers: Vec<_> = self.workers.write().await.drain().collect();
        tracing::info!(workers = workers.len(), "Stopping user workers");
        for (user_id, handle) in workers {
            drop(handle.event_tx);
            if let Err(e) = handle.task.await {
                tracing::warn!(user_id = %user_id, error = %e, "User worker ended abnormally");
            }
        }
    }

    pub fn runtime(&self) -> &Arc<ChatRuntime<L, O>> {
        &self.runtime
    }

    /// Workers whose queue is still open
    #[cfg(test)]
    pub async fn active_workers(&self) -> usize {
        self.workers
            .read()
            .await
            .values()
            .filter(|handle| !handle.event_tx.is_closed())
            .count()
    }
}

async fn run_worker<L, O>(
    user_id: UserId,
    runtime: Arc<ChatRuntime<L, O>>,
    mut event_rx: mpsc::Receiver<InboundEvent>,
    cancel: CancellationToken,
    previous: Option<JoinHandle<()>>,
) where
    L: LlmClient + 'static,
    O: OutboundSink + 'static,
{
    // Keep arrival order across a worker restart
    if let Some(previous) = previous {
        if let Err(e) = previous.await {
            tracing::warn!(user_id = %user_id, error = %e, "Previous user worker ended abnormally");
        }
    }

    tracing::debug!(user_id = %user_id, "Starting user worker");
    loop {
        // Queued events drain before cancellation or idleness is observed
        tokio::select! {
            biased;
            event = event_rx.recv() => match event {
                Some(event) => runtime.handle(event).await,
                None => break,
            },
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(WORKER_IDLE) => {
                event_rx.close();
                while let Some(event) = event_rx.recv().await {
                    runtime.handle(event).await;
                }
                tracing::debug!(user_id = %user_id, "User worker idle");
                break;
            }
        }
    }
    tracing::debug!(user_id = %user_id, "User worker stopped");
}
