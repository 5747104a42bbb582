//! Poll loop driving a status tracker

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::tracker::fsm::{PollDecision, StatusTracker};
use crate::tracker::source::{StatusEndpoint, StatusSource};

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

/// Poll `endpoint` until the tracker stops, the deadline passes or the
/// shutdown signal fires
///
/// The first poll happens one interval after start. Each poll is awaited
/// before the next sleep, so polls for one id never overlap. `publish` is
/// called after every state change.
pub async fn run<S, F, P>(
    source: &dyn StatusSource,
    endpoint: StatusEndpoint,
    tracker: &mut StatusTracker,
    generation: u64,
    sleep_fn: S,
    mut publish: P,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
    P: FnMut(&StatusTracker),
{
    let Some(deployment_id) = tracker.deployment_id().map(str::to_string) else {
        return;
    };
    let interval = tracker.settings().poll_interval;
    let deadline = tracker.deadline();
    debug!("Polling {} for {} every {:?}", endpoint, deployment_id, interval);

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Status polling for {} cancelled", deployment_id);
                tracker.cancel();
                publish(tracker);
                return;
            }
            _ = until(deadline) => {
                tracker.check_deadline(generation, Instant::now());
                publish(tracker);
                return;
            }
            _ = sleep_fn(interval) => {
                // Continue with poll
            }
        }

        let result = tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Status polling for {} cancelled", deployment_id);
                tracker.cancel();
                publish(tracker);
                return;
            }
            _ = until(deadline) => {
                tracker.check_deadline(generation, Instant::now());
                publish(tracker);
                return;
            }
            result = source.fetch_status(endpoint, &deployment_id) => result,
        };

        let decision = tracker.on_poll(generation, result, Instant::now());
        publish(tracker);
        match decision {
            PollDecision::Continue => {}
            PollDecision::Stop | PollDecision::Ignored => return,
        }
    }
}
