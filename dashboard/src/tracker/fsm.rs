//! State machine for observing one deployment run
//!
//! The tracker is driven by poll results and never performs I/O itself.
//! Each run gets a new generation; results carrying an older generation
//! are dropped, which is how late responses after a restart or a cancel
//! are kept from touching the state.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::DashboardError;
use crate::models::deployment::{DeploymentStatus, StatusReport};

/// Tracker settings
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// Delay between polls
    pub poll_interval: Duration,

    /// Consecutive polls without log growth before the run is taken as done
    pub stall_threshold: u32,

    /// Consecutive failed polls before the run is marked failed
    pub max_consecutive_failures: u32,

    /// Wall-clock bound on a run, measured from start
    pub timeout: Duration,

    /// Status adopted when the timeout fires
    pub timeout_status: DeploymentStatus,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            stall_threshold: 5,
            max_consecutive_failures: 3,
            timeout: Duration::from_secs(600),
            timeout_status: DeploymentStatus::Completed,
        }
    }
}

/// Why tracking ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// Backend reported a terminal status
    Reported,

    /// Logs stopped growing
    Stalled,

    /// Wall-clock timeout
    TimedOut,

    /// Too many consecutive failed polls
    Unreachable,

    /// Observation stopped by the caller
    Cancelled,

    /// The operation never produced a deployment id
    StartFailed,
}

/// What the poll loop should do after feeding a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    Continue,
    Stop,
    /// Result belonged to an older run or arrived after the end
    Ignored,
}

/// Point-in-time view of a tracker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerSnapshot {
    pub deployment_id: Option<String>,
    pub status: DeploymentStatus,
    pub logs: Vec<String>,
    pub completion: Option<Completion>,
    pub last_error: Option<String>,
}

impl TrackerSnapshot {
    /// Tracking has ended, for whatever reason
    pub fn is_finished(&self) -> bool {
        self.completion.is_some()
    }
}

/// Deployment status tracker
#[derive(Debug, Clone)]
pub struct StatusTracker {
    settings: TrackerSettings,
    deployment_id: Option<String>,
    status: DeploymentStatus,
    logs: Vec<String>,
    stall_count: u32,
    failure_streak: u32,
    elapsed_ticks: u32,
    started_at: Option<Instant>,
    generation: u64,
    completion: Option<Completion>,
    last_error: Option<String>,
}

impl StatusTracker {
    /// Create an idle tracker
    pub fn new(settings: TrackerSettings) -> Self {
        Self {
            settings,
            deployment_id: None,
            status: DeploymentStatus::Idle,
            logs: Vec::new(),
            stall_count: 0,
            failure_streak: 0,
            elapsed_ticks: 0,
            started_at: None,
            generation: 0,
            completion: None,
            last_error: None,
        }
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn status(&self) -> DeploymentStatus {
        self.status
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn deployment_id(&self) -> Option<&str> {
        self.deployment_id.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn completion(&self) -> Option<Completion> {
        self.completion
    }

    pub fn stall_count(&self) -> u32 {
        self.stall_count
    }

    pub fn failure_streak(&self) -> u32 {
        self.failure_streak
    }

    pub fn elapsed_ticks(&self) -> u32 {
        self.elapsed_ticks
    }

    /// Whether poll results for `generation` are still accepted
    pub fn is_live(&self, generation: u64) -> bool {
        generation == self.generation && self.status == DeploymentStatus::Running
    }

    /// The start call is in flight; any previous run is abandoned
    pub fn begin_loading(&mut self) -> u64 {
        self.reset();
        self.status = DeploymentStatus::Loading;
        self.generation
    }

    /// A deployment id arrived: start observing it
    pub fn start(&mut self, deployment_id: impl Into<String>, now: Instant) -> u64 {
        self.reset();
        let deployment_id = deployment_id.into();
        info!("Tracking deployment {}", deployment_id);
        self.deployment_id = Some(deployment_id);
        self.status = DeploymentStatus::Running;
        self.started_at = Some(now);
        self.generation
    }

    /// The start call failed; nothing will be polled
    pub fn start_failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("Deployment did not start: {}", message);
        self.generation += 1;
        self.logs.push(message.clone());
        self.last_error = Some(message);
        self.finish(DeploymentStatus::Failed, Completion::StartFailed);
    }

    /// Feed one poll result
    ///
    /// Per tick: failure streak, then an explicit terminal status, then the
    /// stall counter, then the wall-clock timeout. Logs are replaced
    /// wholesale by every successful poll.
    pub fn on_poll(
        &mut self,
        generation: u64,
        result: Result<StatusReport, DashboardError>,
        now: Instant,
    ) -> PollDecision {
        if !self.is_live(generation) {
            debug!("Dropping poll result for generation {}", generation);
            return PollDecision::Ignored;
        }
        self.elapsed_ticks += 1;

        match result {
            Err(e) => {
                self.failure_streak += 1;
                warn!(
                    "Status poll failed ({}/{}): {}",
                    self.failure_streak, self.settings.max_consecutive_failures, e
                );
                self.last_error = Some(e.to_string());
                if self.failure_streak >= self.settings.max_consecutive_failures {
                    return self.finish(DeploymentStatus::Failed, Completion::Unreachable);
                }
            }
            Ok(report) => {
                self.failure_streak = 0;
                let grew = report.logs.len() > self.logs.len();
                self.logs = report.logs;

                if let Some(status) = report.status.filter(|s| s.is_terminal()) {
                    return self.finish(status, Completion::Reported);
                }

                if grew {
                    self.stall_count = 0;
                } else {
                    self.stall_count += 1;
                    debug!(
                        "No new log lines ({}/{})",
                        self.stall_count, self.settings.stall_threshold
                    );
                    if self.stall_count >= self.settings.stall_threshold {
                        return self.finish(DeploymentStatus::Completed, Completion::Stalled);
                    }
                }
            }
        }

        self.check_deadline(generation, now)
    }

    /// Apply the wall-clock timeout without a poll result
    pub fn check_deadline(&mut self, generation: u64, now: Instant) -> PollDecision {
        if !self.is_live(generation) {
            return PollDecision::Ignored;
        }
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                let status = self.settings.timeout_status;
                self.finish(status, Completion::TimedOut)
            }
            _ => PollDecision::Continue,
        }
    }

    /// When the current run times out
    pub fn deadline(&self) -> Option<Instant> {
        self.started_at.map(|at| at + self.settings.timeout)
    }

    /// Stop observing; state is left as last seen
    pub fn cancel(&mut self) {
        self.generation += 1;
        if self.completion.is_none() && self.status != DeploymentStatus::Idle {
            info!("Stopped tracking {:?}", self.deployment_id);
            self.completion = Some(Completion::Cancelled);
        }
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            deployment_id: self.deployment_id.clone(),
            status: self.status,
            logs: self.logs.clone(),
            completion: self.completion,
            last_error: self.last_error.clone(),
        }
    }

    fn finish(&mut self, status: DeploymentStatus, completion: Completion) -> PollDecision {
        info!(
            "Deployment {} finished: {} ({:?})",
            self.deployment_id.as_deref().unwrap_or("-"),
            status,
            completion
        );
        self.status = status;
        self.completion = Some(completion);
        PollDecision::Stop
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.deployment_id = None;
        self.logs.clear();
        self.stall_count = 0;
        self.failure_streak = 0;
        self.elapsed_ticks = 0;
        self.started_at = None;
        self.completion = None;
        self.last_error = None;
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new(TrackerSettings::default())
    }
}
