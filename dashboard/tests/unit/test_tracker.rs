//! Status tracker tests, run on tokio's paused clock

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ftdash::errors::DashboardError;
use ftdash::models::deployment::{DeploymentStatus, StatusReport};
use ftdash::tracker::{Completion, StatusEndpoint, StatusSource, TrackerHandle, TrackerSettings};

/// Plays back scripted poll results, then keeps returning `fallback`
struct ScriptedSource {
    script: Mutex<VecDeque<Result<StatusReport, DashboardError>>>,
    fallback: Fallback,
    calls: AtomicUsize,
}

enum Fallback {
    /// Same logs, no status
    Quiet(usize),
    /// One more log line per poll
    Growing,
    Unreachable,
}

impl ScriptedSource {
    fn new(script: Vec<Result<StatusReport, DashboardError>>, fallback: Fallback) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn lines(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("step {}", i)).collect()
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn fetch_status(
        &self,
        endpoint: StatusEndpoint,
        deployment_id: &str,
    ) -> Result<StatusReport, DashboardError> {
        assert_eq!(endpoint, StatusEndpoint::DeployStatus);
        assert_eq!(deployment_id, "dep-1");
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }
        match self.fallback {
            Fallback::Quiet(n) => Ok(StatusReport::new(lines(n), None)),
            Fallback::Growing => Ok(StatusReport::new(lines(call), None)),
            Fallback::Unreachable => Err(DashboardError::Network("connection refused".to_string())),
        }
    }
}

fn settings() -> TrackerSettings {
    TrackerSettings::default()
}

fn spawn(source: Arc<ScriptedSource>, settings: TrackerSettings) -> TrackerHandle {
    TrackerHandle::spawn(source, StatusEndpoint::DeployStatus, "dep-1", settings)
}

#[tokio::test(start_paused = true)]
async fn test_reported_success() {
    let source = ScriptedSource::new(
        vec![
            Ok(StatusReport::new(lines(1), Some(DeploymentStatus::Running))),
            Ok(StatusReport::new(lines(2), None)),
            Ok(StatusReport::new(lines(3), Some(DeploymentStatus::Success))),
        ],
        Fallback::Quiet(3),
    );
    let handle = spawn(source.clone(), settings());
    assert_eq!(handle.snapshot().status, DeploymentStatus::Running);

    let snapshot = handle.wait().await;
    assert_eq!(snapshot.status, DeploymentStatus::Success);
    assert_eq!(snapshot.completion, Some(Completion::Reported));
    assert_eq!(snapshot.logs, lines(3));
    assert_eq!(snapshot.deployment_id.as_deref(), Some("dep-1"));
    assert_eq!(source.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_reported_failure() {
    let source = ScriptedSource::new(
        vec![Ok(StatusReport::new(lines(4), Some(DeploymentStatus::Failed)))],
        Fallback::Quiet(4),
    );
    let snapshot = spawn(source, settings()).wait().await;
    assert_eq!(snapshot.status, DeploymentStatus::Failed);
    assert_eq!(snapshot.completion, Some(Completion::Reported));
}

#[tokio::test(start_paused = true)]
async fn test_silent_backend_completes_after_stall() {
    let source = ScriptedSource::new(Vec::new(), Fallback::Quiet(2));
    let started = tokio::time::Instant::now();
    let snapshot = spawn(source.clone(), settings()).wait().await;

    assert_eq!(snapshot.status, DeploymentStatus::Completed);
    assert_eq!(snapshot.completion, Some(Completion::Stalled));
    // one poll with growth, then five without
    assert_eq!(source.calls(), 6);
    assert_eq!(started.elapsed(), Duration::from_secs(12));
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_backend_fails() {
    let source = ScriptedSource::new(Vec::new(), Fallback::Unreachable);
    let snapshot = spawn(source.clone(), settings()).wait().await;

    assert_eq!(snapshot.status, DeploymentStatus::Failed);
    assert_eq!(snapshot.completion, Some(Completion::Unreachable));
    assert_eq!(source.calls(), 3);
    assert!(snapshot.last_error.unwrap().contains("connection refused"));
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_tolerated() {
    let network = || Err(DashboardError::Network("503".to_string()));
    let source = ScriptedSource::new(
        vec![
            network(),
            network(),
            Ok(StatusReport::new(lines(1), None)),
            network(),
            Ok(StatusReport::new(lines(2), Some(DeploymentStatus::Success))),
        ],
        Fallback::Quiet(2),
    );
    let snapshot = spawn(source, settings()).wait().await;
    assert_eq!(snapshot.status, DeploymentStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_while_logs_keep_growing() {
    let source = ScriptedSource::new(Vec::new(), Fallback::Growing);
    let mut s = settings();
    s.timeout = Duration::from_secs(31);
    let started = tokio::time::Instant::now();
    let snapshot = spawn(source, s).wait().await;

    assert_eq!(snapshot.status, DeploymentStatus::Completed);
    assert_eq!(snapshot.completion, Some(Completion::TimedOut));
    assert_eq!(started.elapsed(), Duration::from_secs(31));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_status_is_configurable() {
    let source = ScriptedSource::new(Vec::new(), Fallback::Growing);
    let mut s = settings();
    s.timeout = Duration::from_secs(5);
    s.timeout_status = DeploymentStatus::Failed;
    let snapshot = spawn(source, s).wait().await;
    assert_eq!(snapshot.status, DeploymentStatus::Failed);
    assert_eq!(snapshot.completion, Some(Completion::TimedOut));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_polling() {
    let source = ScriptedSource::new(Vec::new(), Fallback::Growing);
    let mut handle = spawn(source.clone(), settings());

    tokio::time::sleep(Duration::from_secs(5)).await;
    handle.cancel();
    let snapshot = handle.wait().await;

    assert_eq!(snapshot.completion, Some(Completion::Cancelled));
    assert_eq!(snapshot.status, DeploymentStatus::Running);
    assert_eq!(snapshot.logs, lines(2));

    let calls = source.calls();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(source.calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_progress() {
    let source = ScriptedSource::new(
        vec![
            Ok(StatusReport::new(lines(1), None)),
            Ok(StatusReport::new(lines(2), Some(DeploymentStatus::Success))),
        ],
        Fallback::Quiet(2),
    );
    let handle = spawn(source, settings());
    let mut rx = handle.subscribe();

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().logs, lines(1));

    let snapshot = handle.wait().await;
    assert!(snapshot.is_finished());
}

#[tokio::test]
async fn test_failed_start_handle() {
    let handle = TrackerHandle::failed(settings(), "Failed to start deployment: 500");
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.status, DeploymentStatus::Failed);
    assert_eq!(snapshot.completion, Some(Completion::StartFailed));

    let waited = handle.wait().await;
    assert_eq!(waited, snapshot);
}
