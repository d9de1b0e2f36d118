use std::fmt;

use async_trait::async_trait;
use http::StatusCode;

use crate::message::Topic;

#[derive(Debug)]
pub enum TransportError {
    /// The request never produced a response: refused, reset, DNS, ...
    Request(reqwest::Error),
    /// A response arrived but could not be interpreted.
    Malformed(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Request(e) => write!(f, "request failed: {}", e),
            TransportError::Malformed(msg) => write!(f, "malformed response: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Request(e) => Some(e),
            TransportError::Malformed(_) => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Request(e)
    }
}

/// The publish/consume surface of the service under test.
///
/// Implementations return once the response has been fully received. Any status code is a
/// successful call; only failing to get a response at all is an error.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn publish(&self, topic: &Topic, body: String) -> Result<StatusCode, TransportError>;

    async fn consume(&self, topic: &Topic) -> Result<StatusCode, TransportError>;

    /// Current queue depth for `topic`, if the service exposes it.
    async fn queue_length(&self, _topic: &Topic) -> Result<Option<usize>, TransportError> {
        Ok(None)
    }
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().build()?;

        Ok(HttpTransport {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str, topic: &Topic) -> String {
        format!("{}/{}/{}", self.base_url, endpoint, topic)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn publish(&self, topic: &Topic, body: String) -> Result<StatusCode, TransportError> {
        let response = self
            .client
            .post(self.url("publish", topic))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        // The body is ignored, but the exchange only ends once it has been read
        response.bytes().await?;

        Ok(status)
    }

    async fn consume(&self, topic: &Topic) -> Result<StatusCode, TransportError> {
        let response = self.client.post(self.url("consume", topic)).send().await?;

        let status = response.status();
        response.bytes().await?;

        Ok(status)
    }

    async fn queue_length(&self, topic: &Topic) -> Result<Option<usize>, TransportError> {
        let response = self.client.get(self.url("length", topic)).send().await?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let text = response.text().await?;

        text.trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| TransportError::Malformed(format!("length of {}: {}", topic, e)))
    }
}
