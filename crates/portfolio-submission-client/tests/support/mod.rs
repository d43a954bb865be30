#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use portfolio_contact_core::OutboundMessage;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};

/// One canned answer; the stub falls back to an empty 200 once the script runs out.
#[derive(Debug, Clone)]
pub struct Scripted {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl Scripted {
    pub fn new(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Clone)]
struct StubState {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

pub struct ReceiverStub {
    pub url: String,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl ReceiverStub {
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub async fn spawn_receiver(script: Vec<Scripted>) -> Result<ReceiverStub> {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        script: Arc::new(Mutex::new(script.into())),
        calls: calls.clone(),
    };
    let app = Router::new()
        .route("/contact", post(receive))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        let _ = server.await;
    });

    Ok(ReceiverStub {
        url: format!("http://{addr}/contact"),
        calls,
        shutdown: Some(shutdown_tx),
    })
}

async fn receive(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.calls.lock().await.push(RecordedCall { headers, body });
    let next = state.script.lock().await.pop_front();
    let Some(scripted) = next else {
        return StatusCode::OK.into_response();
    };
    if !scripted.delay.is_zero() {
        tokio::time::sleep(scripted.delay).await;
    }
    (scripted.status, scripted.body).into_response()
}

/// A port nothing listens on.
pub async fn closed_port_url() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}/contact"))
}

pub fn valid_message() -> OutboundMessage {
    OutboundMessage::new(
        "Ana Costa",
        "ana@example.pt",
        "Project enquiry",
        "Hello, I would like to talk about a freelance project next month.",
    )
}

pub fn header<'a>(call: &'a RecordedCall, name: &str) -> Option<&'a str> {
    call.headers.get(name).and_then(|value| value.to_str().ok())
}
