use std::{env, str::FromStr, time::Duration};

use crate::message::Topic;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Parameters for a single run. Built once and handed to the [`Driver`](crate::driver::Driver),
/// which never mutates it.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub base_url: String,
    pub thread_count: usize,
    pub messages_per_thread: usize,
    pub topic_count: usize,
    /// Upper bound for a single publish or consume call. `None` waits forever.
    pub request_timeout: Option<Duration>,
    /// Ask the service for each topic's queue length once the workers are done.
    pub probe_backlog: bool,
}

impl RunConfig {
    /// Reads overrides from `STRESS_*` environment variables, falling back to the defaults for
    /// anything unset. A value that is set but does not parse is an error.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let timeout_ms = env_or(
            "STRESS_TIMEOUT_MS",
            defaults.request_timeout.map_or(0, |t| t.as_millis() as u64),
        )?;

        Ok(Self {
            base_url: env::var("STRESS_URL").unwrap_or(defaults.base_url),
            thread_count: env_or("STRESS_THREADS", defaults.thread_count)?,
            messages_per_thread: env_or("STRESS_MESSAGES", defaults.messages_per_thread)?,
            topic_count: env_or("STRESS_TOPICS", defaults.topic_count)?,
            request_timeout: match timeout_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
            probe_backlog: env_flag("STRESS_PROBE_BACKLOG", defaults.probe_backlog)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sample count of a run in which no worker fails.
    pub fn expected_samples(&self) -> usize {
        2 * self.thread_count * self.messages_per_thread
    }

    /// Every topic a worker may pick, `topic_1` through `topic_{topic_count}`.
    pub fn topics(&self) -> impl Iterator<Item = Topic> {
        (1..=self.topic_count.max(1)).map(Topic::new)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            thread_count: 15,
            messages_per_thread: 100,
            topic_count: 5,
            request_timeout: Some(Duration::from_secs(30)),
            probe_backlog: false,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| format!("Invalid value for {}: '{}' ({})", key, value, e)),
        Err(_) => Ok(default),
    }
}

/// Like [`env_or`] for booleans, also accepting `1`/`0`, `yes`/`no` and `on`/`off`.
fn env_flag(key: &str, default: bool) -> Result<bool, String> {
    match env::var(key) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(format!("Invalid value for {}: '{}' (expected a boolean)", key, value)),
        },
        Err(_) => Ok(default),
    }
}
