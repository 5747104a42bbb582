//! Deployment status tracking

pub mod fsm;
pub mod handle;
pub mod poller;
pub mod source;

pub use fsm::{Completion, PollDecision, StatusTracker, TrackerSettings, TrackerSnapshot};
pub use handle::TrackerHandle;
pub use source::{StatusEndpoint, StatusSource};
