#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    net::TcpListener,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use bytes::Bytes;

use queue_stress::message::Topic;
use queue_stress::sample::Operation;
use queue_stress::transport::{Transport, TransportError};

/// Serves `app` on an ephemeral local port and returns its base URL.
pub fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = axum::Server::from_tcp(listener)
        .unwrap()
        .serve(app.into_make_service());

    tokio::spawn(async move {
        server.await.unwrap();
    });

    format!("http://{}", addr)
}

/// A base URL nothing is listening on.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    format!("http://{}", addr)
}

/// Accepts everything with 200 and no delay.
pub fn always_ok() -> Router {
    Router::new()
        .route("/publish/:topic", post(|| async { StatusCode::OK }))
        .route("/consume/:topic", post(|| async { StatusCode::OK }))
}

/// Publishes fine, but every consume finds nothing.
pub fn empty_consume() -> Router {
    Router::new()
        .route("/publish/:topic", post(|| async { StatusCode::OK }))
        .route("/consume/:topic", post(|| async { StatusCode::NOT_FOUND }))
}

/// Publishes fine, but every consume takes `delay` to answer.
pub fn slow_consume(delay: Duration) -> Router {
    Router::new()
        .route("/publish/:topic", post(|| async { StatusCode::OK }))
        .route(
            "/consume/:topic",
            post(move || async move {
                tokio::time::sleep(delay).await;
                StatusCode::OK
            }),
        )
}

/// Every publish and consume takes `delay` to answer.
pub fn slow_service(delay: Duration) -> Router {
    Router::new()
        .route(
            "/publish/:topic",
            post(move || async move {
                tokio::time::sleep(delay).await;
                StatusCode::OK
            }),
        )
        .route(
            "/consume/:topic",
            post(move || async move {
                tokio::time::sleep(delay).await;
                StatusCode::OK
            }),
        )
}

pub type Queues = Arc<Mutex<HashMap<String, VecDeque<Bytes>>>>;

/// In-memory FIFO per topic with publish, consume and length endpoints.
pub fn queue_service() -> (Router, Queues) {
    let queues: Queues = Arc::new(Mutex::new(HashMap::new()));

    let app = Router::new()
        .route("/publish/:topic", post(publish))
        .route("/consume/:topic", post(consume))
        .route("/length/:topic", get(length))
        .with_state(queues.clone());

    (app, queues)
}

async fn publish(State(queues): State<Queues>, Path(topic): Path<String>, body: Bytes) -> StatusCode {
    queues.lock().unwrap().entry(topic).or_default().push_back(body);
    StatusCode::OK
}

async fn consume(State(queues): State<Queues>, Path(topic): Path<String>) -> (StatusCode, Bytes) {
    let mut queues = queues.lock().unwrap();

    match queues.get_mut(&topic).and_then(|q| q.pop_front()) {
        Some(message) => (StatusCode::OK, message),
        None => (StatusCode::NOT_FOUND, Bytes::new()),
    }
}

async fn length(State(queues): State<Queues>, Path(topic): Path<String>) -> String {
    let queues = queues.lock().unwrap();
    queues.get(&topic).map_or(0, |q| q.len()).to_string()
}

#[derive(Clone, Debug)]
pub struct Call {
    pub operation: Operation,
    pub topic: Topic,
    pub body: Option<String>,
}

/// Answers 200 to everything and remembers each call.
#[derive(Default)]
pub struct RecordingTransport {
    pub calls: Mutex<Vec<Call>>,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn publish(&self, topic: &Topic, body: String) -> Result<http::StatusCode, TransportError> {
        self.calls.lock().unwrap().push(Call {
            operation: Operation::Publish,
            topic: *topic,
            body: Some(body),
        });
        Ok(http::StatusCode::OK)
    }

    async fn consume(&self, topic: &Topic) -> Result<http::StatusCode, TransportError> {
        self.calls.lock().unwrap().push(Call {
            operation: Operation::Consume,
            topic: *topic,
            body: None,
        });
        Ok(http::StatusCode::OK)
    }
}

/// Fails publishes whose payload comes from one of `failing` workers; everything else is 200.
pub struct RejectingTransport {
    pub failing: Vec<usize>,
}

impl RejectingTransport {
    pub fn rejects_all() -> Self {
        RejectingTransport {
            failing: (0..1024).collect(),
        }
    }

    fn rejects(&self, body: &str) -> bool {
        self.failing
            .iter()
            .any(|id| body.starts_with(&format!("Worker {} - ", id)))
    }
}

#[async_trait]
impl Transport for RejectingTransport {
    async fn publish(&self, _topic: &Topic, body: String) -> Result<http::StatusCode, TransportError> {
        if self.rejects(&body) {
            return Err(TransportError::Malformed("connection refused".to_string()));
        }
        Ok(http::StatusCode::OK)
    }

    async fn consume(&self, _topic: &Topic) -> Result<http::StatusCode, TransportError> {
        Ok(http::StatusCode::OK)
    }
}

/// Succeeds for the first `budget` calls, then fails every call.
pub struct FlakyTransport {
    pub budget: Mutex<usize>,
}

impl FlakyTransport {
    pub fn new(budget: usize) -> Self {
        FlakyTransport {
            budget: Mutex::new(budget),
        }
    }

    fn take(&self) -> Result<http::StatusCode, TransportError> {
        let mut budget = self.budget.lock().unwrap();
        if *budget == 0 {
            return Err(TransportError::Malformed("connection reset".to_string()));
        }
        *budget -= 1;
        Ok(http::StatusCode::ACCEPTED)
    }
}

#[async_trait]
impl Transport for FlakyTransport {
    async fn publish(&self, _topic: &Topic, _body: String) -> Result<http::StatusCode, TransportError> {
        self.take()
    }

    async fn consume(&self, _topic: &Topic) -> Result<http::StatusCode, TransportError> {
        self.take()
    }
}

/// Panics on the publish of worker `victim`.
pub struct PanickingTransport {
    pub victim: usize,
}

#[async_trait]
impl Transport for PanickingTransport {
    async fn publish(&self, _topic: &Topic, body: String) -> Result<http::StatusCode, TransportError> {
        if body.starts_with(&format!("Worker {} - ", self.victim)) {
            panic!("transport blew up");
        }
        Ok(http::StatusCode::OK)
    }

    async fn consume(&self, _topic: &Topic) -> Result<http::StatusCode, TransportError> {
        Ok(http::StatusCode::OK)
    }
}
