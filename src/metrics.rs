use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

pub trait Metrics {
    fn increment_active_workers(&self) {
        METRICS_HUB.active_workers.inc();
    }

    fn decrement_active_workers(&self) {
        METRICS_HUB.active_workers.dec();
    }

    fn increment_publish_requests(&self) {
        METRICS_HUB.publish_requests.inc();
    }

    fn increment_consume_requests(&self) {
        METRICS_HUB.consume_requests.inc();
    }

    fn increment_timeouts(&self) {
        METRICS_HUB.timeouts.inc();
    }

    fn increment_transport_failures(&self) {
        METRICS_HUB.transport_failures.inc();
    }
}

pub struct MetricsHub {
    active_workers: IntGauge,
    publish_requests: IntCounter,
    consume_requests: IntCounter,
    timeouts: IntCounter,
    transport_failures: IntCounter,
}

impl MetricsHub {
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(MetricsHub {
            active_workers: IntGauge::new("stress_active_workers", "Workers currently running")?,
            publish_requests: IntCounter::new(
                "stress_publish_requests",
                "Publish requests issued",
            )?,
            consume_requests: IntCounter::new(
                "stress_consume_requests",
                "Consume requests issued",
            )?,
            timeouts: IntCounter::new("stress_timeouts", "Requests that hit the timeout")?,
            transport_failures: IntCounter::new(
                "stress_transport_failures",
                "Requests that failed without a response",
            )?,
        })
    }

    pub fn get_metrics(&self) -> Result<Vec<prometheus::proto::MetricFamily>, prometheus::Error> {
        let registry = Registry::new();
        registry.register(Box::new(self.active_workers.clone()))?;
        registry.register(Box::new(self.publish_requests.clone()))?;
        registry.register(Box::new(self.consume_requests.clone()))?;
        registry.register(Box::new(self.timeouts.clone()))?;
        registry.register(Box::new(self.transport_failures.clone()))?;
        Ok(registry.gather())
    }
}

lazy_static! {
    static ref METRICS_HUB: MetricsHub =
        MetricsHub::new().expect("static metric definitions are valid");
}

/// Number of workers currently inside [`Worker::run`](crate::worker::Worker::run).
pub fn active_workers() -> i64 {
    METRICS_HUB.active_workers.get()
}

pub fn get_metrics() -> Result<Vec<prometheus::proto::MetricFamily>, prometheus::Error> {
    METRICS_HUB.get_metrics()
}

/// Renders the current counters in the Prometheus text exposition format.
pub fn render() -> Result<String, prometheus::Error> {
    let families = get_metrics()?;
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer)?;

    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
