#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sre_toolkit::simulator::TargetClient;
use sre_toolkit::{Result, ToolkitError};

/// In-process target with fixed latency and status. Every `fail_every`-th
/// call fails at the transport level instead.
#[derive(Debug, Default)]
pub struct ScriptedTarget {
    pub latency: Duration,
    pub status: u16,
    pub fail_every: Option<usize>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedTarget {
    pub fn ok(latency: Duration) -> Self {
        Self {
            latency,
            status: 200,
            ..Default::default()
        }
    }

    pub fn with_status(latency: Duration, status: u16) -> Self {
        Self {
            latency,
            status,
            ..Default::default()
        }
    }

    pub fn failing_every(latency: Duration, every: usize) -> Self {
        Self {
            latency,
            status: 200,
            fail_every: Some(every),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TargetClient for ScriptedTarget {
    async fn probe(&self) -> Result<u16> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.fail_every {
            Some(every) if call % every == every - 1 => {
                Err(ToolkitError::Transport("connection refused".into()))
            }
            _ => Ok(self.status),
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}
