use std::{future::Future, sync::Arc, time::Duration};

use http::StatusCode;
use log::{debug, warn};
use rand::{rngs::StdRng, SeedableRng};
use tokio::time::{timeout, Instant};

use crate::config::RunConfig;
use crate::message::{payload, Topic};
use crate::metrics::Metrics;
use crate::sample::{LatencySample, Operation, Outcome, RunResult};
use crate::transport::{Transport, TransportError};

/// One load generator. Bound to a single topic for its whole life and strictly sequential:
/// each consume waits for the preceding publish to finish.
pub struct Worker<T> {
    id: usize,
    topic: Topic,
    messages: usize,
    request_timeout: Option<Duration>,
    transport: Arc<T>,
    rng: StdRng,
}

impl<T: Transport> Metrics for Worker<T> {}

/// Holds the active-worker gauge up for as long as it lives, including while unwinding.
struct ActiveGuard;

impl Metrics for ActiveGuard {}

impl ActiveGuard {
    fn enter() -> Self {
        let guard = ActiveGuard;
        guard.increment_active_workers();
        guard
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.decrement_active_workers();
    }
}

impl<T: Transport> Worker<T> {
    pub fn new(id: usize, config: &RunConfig, transport: Arc<T>) -> Self {
        let mut rng = StdRng::from_entropy();
        let topic = Topic::random(&mut rng, config.topic_count);

        Worker {
            id,
            topic,
            messages: config.messages_per_thread,
            request_timeout: config.request_timeout,
            transport,
            rng,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Runs every iteration, stopping early only if the transport itself fails. Samples gathered
    /// before a failure are kept.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(worker = self.id)))]
    pub async fn run(mut self) -> RunResult {
        let active = ActiveGuard::enter();

        let mut samples = Vec::with_capacity(2 * self.messages);
        let error = self.run_iterations(&mut samples).await.err();

        drop(active);

        match error {
            Some(ref e) => warn!(
                "Worker {} on {} stopped after {} samples: {}",
                self.id,
                self.topic,
                samples.len(),
                e
            ),
            None => debug!(
                "Worker {} on {} finished with {} samples",
                self.id,
                self.topic,
                samples.len()
            ),
        }

        RunResult {
            worker: self.id,
            topic: self.topic,
            samples,
            error: error.map(|e| e.to_string()),
        }
    }

    async fn run_iterations(
        &mut self,
        samples: &mut Vec<LatencySample>,
    ) -> Result<(), TransportError> {
        let transport = Arc::clone(&self.transport);
        let topic = self.topic;

        for _ in 0..self.messages {
            let message = payload(self.id, &mut self.rng);

            self.increment_publish_requests();
            let sample = self
                .timed(Operation::Publish, transport.publish(&topic, message))
                .await?;
            samples.push(sample);

            self.increment_consume_requests();
            let sample = self
                .timed(Operation::Consume, transport.consume(&topic))
                .await?;
            samples.push(sample);
        }

        Ok(())
    }

    /// Times `call` alone, from just before it is polled until its response is in hand.
    async fn timed<F>(&self, operation: Operation, call: F) -> Result<LatencySample, TransportError>
    where
        F: Future<Output = Result<StatusCode, TransportError>>,
    {
        let start = Instant::now();
        let result = match self.request_timeout {
            Some(limit) => timeout(limit, call).await.ok(),
            None => Some(call.await),
        };
        let elapsed = start.elapsed();

        let outcome = match result {
            Some(Ok(status)) => Outcome::Status(status.as_u16()),
            Some(Err(e)) => {
                self.increment_transport_failures();
                return Err(e);
            }
            None => {
                self.increment_timeouts();
                debug!("Worker {} {} on {} timed out", self.id, operation, self.topic);
                Outcome::TimedOut
            }
        };

        Ok(LatencySample::new(operation, elapsed, outcome))
    }
}
