use std::{collections::BTreeMap, fmt, time::Duration};

use serde::Serialize;
use uuid::Uuid;

use crate::config::RunConfig;
use crate::sample::{LatencySample, Operation, RunResult};
use crate::stats::AggregateStats;

/// Outcome of a whole run. Built once after every worker has finished and read-only after.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub workers: usize,
    pub messages_per_worker: usize,
    /// Workers that hit a transport failure or never reported back.
    pub failed_workers: usize,
    pub elapsed_ms: f64,
    pub overall: Option<AggregateStats>,
    pub publish: Option<AggregateStats>,
    pub consume: Option<AggregateStats>,
    /// Sample count per outcome, keyed by status code or `timeout`.
    pub outcomes: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backlog: Option<BTreeMap<String, usize>>,
    #[serde(skip)]
    pub samples: Vec<LatencySample>,
}

impl RunReport {
    pub fn new(
        run_id: Uuid,
        config: &RunConfig,
        results: Vec<RunResult>,
        unreported: usize,
        elapsed: Duration,
        backlog: Option<BTreeMap<String, usize>>,
    ) -> Self {
        let failed_workers = results.iter().filter(|r| r.failed()).count() + unreported;

        let samples: Vec<LatencySample> = results.into_iter().flat_map(|r| r.samples).collect();

        let mut outcomes = BTreeMap::new();
        for sample in &samples {
            *outcomes.entry(sample.outcome.to_string()).or_insert(0) += 1;
        }

        RunReport {
            run_id,
            workers: config.thread_count,
            messages_per_worker: config.messages_per_thread,
            failed_workers,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            overall: AggregateStats::from_samples(&samples),
            publish: AggregateStats::for_operation(&samples, Operation::Publish),
            consume: AggregateStats::for_operation(&samples, Operation::Consume),
            outcomes,
            backlog,
            samples,
        }
    }

    /// Whether there is anything to summarise at all.
    pub fn has_samples(&self) -> bool {
        self.overall.is_some()
    }
}

/// Writes nothing when the run produced no samples.
impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(overall) = self.overall else {
            return Ok(());
        };

        write!(f, "{}", overall)?;

        for (label, stats) in [("Publish", &self.publish), ("Consume", &self.consume)] {
            if let Some(stats) = stats {
                writeln!(
                    f,
                    "{}: {} requests, mean {:.2} ms, median {:.2} ms, max {:.2} ms, min {:.2} ms",
                    label, stats.count, stats.mean_ms, stats.median_ms, stats.max_ms, stats.min_ms
                )?;
            }
        }

        for (outcome, count) in &self.outcomes {
            writeln!(f, "Status {}: {}", outcome, count)?;
        }

        if self.failed_workers > 0 {
            writeln!(f, "Failed workers: {} of {}", self.failed_workers, self.workers)?;
        }

        if let Some(ref backlog) = self.backlog {
            for (topic, length) in backlog {
                writeln!(f, "Backlog {}: {}", topic, length)?;
            }
        }

        Ok(())
    }
}
