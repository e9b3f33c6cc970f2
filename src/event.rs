// src/event.rs
use crate::checks::report::CheckResult;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub enum RunEvent {
    /// Emitted right before the before-each hook of a check runs.
    CheckStarted { suite: String, description: String, timestamp: DateTime<Utc> },
    /// Emitted once teardown is done and the outcome is final.
    CheckFinished { result: CheckResult, timestamp: DateTime<Utc> },
}
