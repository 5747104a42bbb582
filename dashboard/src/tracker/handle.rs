//! Background tracking task per deployment

use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::warn;

use crate::tracker::fsm::{StatusTracker, TrackerSettings, TrackerSnapshot};
use crate::tracker::poller;
use crate::tracker::source::{StatusEndpoint, StatusSource};

/// Owner side of a tracked deployment
///
/// Snapshots are published on a watch channel after every poll. Dropping
/// the handle stops the polling task.
#[derive(Debug)]
pub struct TrackerHandle {
    snapshots: watch::Receiver<TrackerSnapshot>,
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<TrackerSnapshot>>,
}

impl TrackerHandle {
    /// Start polling `endpoint` for `deployment_id` on a new task
    pub fn spawn(
        source: Arc<dyn StatusSource>,
        endpoint: StatusEndpoint,
        deployment_id: impl Into<String>,
        settings: TrackerSettings,
    ) -> Self {
        let mut tracker = StatusTracker::new(settings);
        let generation = tracker.start(deployment_id, Instant::now());
        let (snapshot_tx, snapshot_rx) = watch::channel(tracker.snapshot());
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let shutdown = Box::pin(async move {
                let _ = cancel_rx.await;
            });
            poller::run(
                source.as_ref(),
                endpoint,
                &mut tracker,
                generation,
                tokio::time::sleep,
                |t: &StatusTracker| {
                    snapshot_tx.send_replace(t.snapshot());
                },
                shutdown,
            )
            .await;
            tracker.snapshot()
        });

        Self {
            snapshots: snapshot_rx,
            cancel: Some(cancel_tx),
            task: Some(task),
        }
    }

    /// A tracker for an operation that never started
    pub fn failed(settings: TrackerSettings, message: impl Into<String>) -> Self {
        let mut tracker = StatusTracker::new(settings);
        tracker.begin_loading();
        tracker.start_failed(message);
        let (_, snapshot_rx) = watch::channel(tracker.snapshot());
        Self {
            snapshots: snapshot_rx,
            cancel: None,
            task: None,
        }
    }

    /// Latest published state
    pub fn snapshot(&self) -> TrackerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that sees every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<TrackerSnapshot> {
        self.snapshots.clone()
    }

    /// Stop polling; later poll results are discarded
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Wait for tracking to end and return the final state
    pub async fn wait(self) -> TrackerSnapshot {
        let TrackerHandle {
            snapshots,
            cancel: _cancel,
            task,
        } = self;

        match task {
            Some(task) => match task.await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("Tracker task ended abnormally: {}", e);
                    let snapshot = snapshots.borrow().clone();
                    snapshot
                }
            },
            None => {
                let snapshot = snapshots.borrow().clone();
                snapshot
            }
        }
    }
}
