use std::fmt;

use serde::Serialize;

use crate::sample::{LatencySample, Operation};

/// Summary of a set of latencies, all in milliseconds.
///
/// Every sample counts regardless of its outcome: non-2xx responses and timeouts contribute
/// their measured duration like any other call.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AggregateStats {
    pub count: usize,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl AggregateStats {
    /// Returns `None` for an empty set. Non-finite values (NaN, infinities) are not latencies and
    /// are skipped, so a set holding nothing else also yields `None`.
    ///
    /// The durations are sorted before anything is summed, so the result depends only on the
    /// multiset of values and not on the order workers delivered them in.
    pub fn from_durations<I>(durations: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted: Vec<f64> = durations.into_iter().filter(|d| d.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }

        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let min_ms = sorted[0];
        let max_ms = sorted[count - 1];
        let sum: f64 = sorted.iter().sum();
        // Rounding in the sum can push the mean an ulp past the extremes
        let mean_ms = (sum / count as f64).clamp(min_ms, max_ms);

        let mid = count / 2;
        let median_ms = if count % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Some(AggregateStats {
            count,
            mean_ms,
            median_ms,
            min_ms,
            max_ms,
        })
    }

    pub fn from_samples<'a, I>(samples: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a LatencySample>,
    {
        Self::from_durations(samples.into_iter().map(|s| s.duration_ms))
    }

    pub fn for_operation(samples: &[LatencySample], operation: Operation) -> Option<Self> {
        Self::from_samples(samples.iter().filter(|s| s.operation == operation))
    }
}

impl fmt::Display for AggregateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total requests: {}", self.count)?;
        writeln!(f, "Mean latency: {:.2} ms", self.mean_ms)?;
        writeln!(f, "Median latency: {:.2} ms", self.median_ms)?;
        writeln!(f, "Max latency: {:.2} ms", self.max_ms)?;
        writeln!(f, "Min latency: {:.2} ms", self.min_ms)
    }
}
