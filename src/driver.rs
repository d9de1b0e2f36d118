use std::{collections::BTreeMap, sync::Arc};

use futures_util::StreamExt;
use log::{error, info, warn};
use tokio::{sync::mpsc, time::Instant};
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::config::RunConfig;
use crate::report::RunReport;
use crate::sample::RunResult;
use crate::transport::{HttpTransport, Transport, TransportError};
use crate::worker::Worker;

/// Spawns the worker pool for one run and gathers what the workers produce.
pub struct Driver<T> {
    config: RunConfig,
    transport: Arc<T>,
}

impl Driver<HttpTransport> {
    /// A driver that talks HTTP to `config.base_url`.
    pub fn http(config: RunConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&config.base_url)?;
        Ok(Driver::new(config, Arc::new(transport)))
    }
}

impl<T: Transport + 'static> Driver<T> {
    pub fn new(config: RunConfig, transport: Arc<T>) -> Self {
        Driver { config, transport }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs every worker to completion and returns the aggregated report.
    ///
    /// A worker that fails or panics only loses its own remaining samples; the rest of the run
    /// carries on.
    pub async fn run(&self) -> RunReport {
        let run_id = Uuid::new_v4();
        let started = Instant::now();

        info!(
            "Run {} starting: {} workers x {} messages over {} topics against {}",
            run_id,
            self.config.thread_count,
            self.config.messages_per_thread,
            self.config.topic_count,
            self.config.base_url
        );

        let results = self.collect().await;
        let elapsed = started.elapsed();

        let missing = self.config.thread_count.saturating_sub(results.len());
        if missing > 0 {
            error!("{} workers exited without reporting", missing);
        }

        let backlog = if self.config.probe_backlog {
            Some(self.probe_backlog().await)
        } else {
            None
        };

        let report = RunReport::new(run_id, &self.config, results, missing, elapsed, backlog);

        if report.failed_workers > 0 {
            warn!(
                "{} of {} workers failed, {} of {} expected samples collected",
                report.failed_workers,
                self.config.thread_count,
                report.samples.len(),
                self.config.expected_samples()
            );
        }

        info!(
            "Run {} finished in {:.2}s with {} samples",
            run_id,
            elapsed.as_secs_f64(),
            report.samples.len()
        );

        report
    }

    async fn collect(&self) -> Vec<RunResult> {
        let (tx, rx) = mpsc::channel::<RunResult>(self.config.thread_count.max(1));

        for id in 0..self.config.thread_count {
            let worker = Worker::new(id, &self.config, Arc::clone(&self.transport));
            let tx = tx.clone();

            tokio::spawn(async move {
                let result = worker.run().await;

                if let Err(e) = tx.send(result).await {
                    error!("Failed to hand over results of worker {}: {}", id, e);
                }
            });
        }

        // Only the workers' senders remain, so the stream ends once each has reported or died
        drop(tx);

        ReceiverStream::new(rx).collect().await
    }

    async fn probe_backlog(&self) -> BTreeMap<String, usize> {
        let mut backlog = BTreeMap::new();

        for topic in self.config.topics() {
            match self.transport.queue_length(&topic).await {
                Ok(Some(length)) => {
                    backlog.insert(topic.to_string(), length);
                }
                Ok(None) => info!("No queue length available for {}", topic),
                Err(e) => warn!("Failed to probe backlog of {}: {}", topic, e),
            }
        }

        backlog
    }
}
