// src/test_support.rs
//! Local HTTP stand-ins for the managed backend and the AI endpoint.
use std::sync::{Arc, Mutex};

use axum::{Json, Router, body::to_bytes, extract::Request, http::StatusCode};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

pub type Log = Arc<Mutex<Vec<Recorded>>>;

/// Serves `router` on an ephemeral port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
}

/// Answers every request with `status` and `body`, recording what it received.
pub async fn canned(status: StatusCode, body: Value) -> (String, Log) {
    let log: Log = Arc::default();
    let seen = log.clone();
    let router = Router::new().fallback(move |request: Request| {
        let seen = seen.clone();
        let body = body.clone();
        async move {
            let (parts, payload) = request.into_parts();
            let bytes = to_bytes(payload, usize::MAX).await.unwrap_or_default();
            seen.lock().unwrap().push(Recorded {
                method: parts.method.to_string(),
                path: parts.uri.path().to_string(),
                query: parts.uri.query().unwrap_or_default().to_string(),
                headers: parts
                    .headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
                    .collect(),
                body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
            });
            (status, Json(body))
        }
    });
    (serve(router).await, log)
}
