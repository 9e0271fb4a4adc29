//! Stub AuroraX server for end-to-end tests
//!
//! An axum router whose fallback handler answers every request with the next
//! canned response of a FIFO script and records what it received.

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const API_KEY: &str = "test-key-123";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub enum Canned {
    Reply {
        status: u16,
        content_type: Option<&'static str>,
        location: Option<String>,
        body: String,
    },
    /// Accept the request and never answer
    Hang,
}

impl Canned {
    pub fn json(status: u16, body: Value) -> Self {
        Canned::Reply {
            status,
            content_type: Some("application/json"),
            location: None,
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Canned::Reply {
            status,
            content_type: Some("text/plain"),
            location: None,
            body: body.to_string(),
        }
    }

    pub fn empty(status: u16) -> Self {
        Canned::Reply {
            status,
            content_type: None,
            location: None,
            body: String::new(),
        }
    }

    pub fn accepted(location: String) -> Self {
        Canned::Reply {
            status: 202,
            content_type: None,
            location: Some(location),
            body: String::new(),
        }
    }
}

#[derive(Clone)]
pub struct StubServer {
    base_url: String,
    script: Arc<Mutex<VecDeque<Canned>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Self {
            base_url: format!("http://{}", addr),
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        };

        let app = Router::new().fallback(handle).with_state(server.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        server
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn push(&self, canned: Canned) -> &Self {
        self.script.lock().unwrap().push_back(canned);
        self
    }

    /// Status body in the service's wire shape
    pub fn push_status(&self, data_uri: Option<&str>, error_condition: bool, logs: Value) -> &Self {
        self.push(Canned::json(
            200,
            serde_json::json!({
                "search_result": {
                    "data_uri": data_uri,
                    "error_condition": error_condition,
                    "file_size": if data_uri.is_some() { 2048 } else { 0 },
                    "result_count": if data_uri.is_some() { 1 } else { 0 },
                    "completed_timestamp": null
                },
                "logs": logs
            }),
        ))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

async fn handle(
    State(stub): State<StubServer>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let headers: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
        .collect();

    stub.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    });

    let canned = stub.script.lock().unwrap().pop_front();
    match canned {
        Some(Canned::Reply {
            status,
            content_type,
            location,
            body,
        }) => {
            let mut builder = Response::builder().status(status);
            if let Some(ct) = content_type {
                builder = builder.header(CONTENT_TYPE, ct);
            }
            if let Some(loc) = location {
                builder = builder.header(LOCATION, loc);
            }
            builder.body(Body::from(body)).unwrap()
        }
        Some(Canned::Hang) => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Response::builder()
                .status(StatusCode::GATEWAY_TIMEOUT)
                .body(Body::empty())
                .unwrap()
        }
        None => Response::builder()
            .status(599)
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from("no scripted response"))
            .unwrap(),
    }
}
