use std::{fmt, time::Duration};

use serde::Serialize;

use crate::message::Topic;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Publish,
    Consume,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Publish => write!(f, "publish"),
            Operation::Consume => write!(f, "consume"),
        }
    }
}

/// How a single timed call ended. Error statuses are data, not failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Status(u16),
    TimedOut,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Status(code) if (200..300).contains(code))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Status(code) => write!(f, "{}", code),
            Outcome::TimedOut => write!(f, "timeout"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LatencySample {
    pub operation: Operation,
    pub duration_ms: f64,
    pub outcome: Outcome,
}

impl LatencySample {
    pub fn new(operation: Operation, elapsed: Duration, outcome: Outcome) -> Self {
        LatencySample {
            operation,
            duration_ms: elapsed.as_secs_f64() * 1000.0,
            outcome,
        }
    }
}

/// Everything one worker produced, in the order it produced it.
#[derive(Clone, Debug)]
pub struct RunResult {
    pub worker: usize,
    pub topic: Topic,
    pub samples: Vec<LatencySample>,
    /// Set when a transport failure cut the worker short.
    pub error: Option<String>,
}

impl RunResult {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}
