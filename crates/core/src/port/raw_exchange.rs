// Raw Exchange Port
// A single unclassified HTTP round trip. The HTTP adapter implements this;
// retry and classification happen above it in `application::transport`.

use crate::error::Result;
use crate::port::http_transport::HttpMethod;
use async_trait::async_trait;
use serde_json::Value;

/// How the body is put on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    /// Pre-serialized string, content type taken from the headers
    Serialized,
    /// JSON-encoded by the HTTP client
    Json,
}

/// Fully prepared request (headers already merged)
#[derive(Debug, Clone, PartialEq)]
pub struct RawRequest {
    pub method: HttpMethod,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub encoding: BodyEncoding,
}

/// Response as received
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub location: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            location: None,
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("text/plain".to_string()),
            location: None,
            body: body.into(),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            location: None,
            body: String::new(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().starts_with("application/json"))
            .unwrap_or(false)
    }
}

/// Raw Exchange trait
#[async_trait]
pub trait RawExchange: Send + Sync {
    /// Perform one round trip
    ///
    /// # Errors
    /// - AuroraXError::Timeout if the per-request timeout elapsed
    /// - AuroraXError::Transport for connection-level failures
    async fn send(&self, request: &RawRequest) -> Result<RawResponse>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AuroraXError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Exchange that replays scripted responses and records requests
    #[derive(Default)]
    pub struct ScriptedExchange {
        script: Mutex<VecDeque<Result<RawResponse>>>,
        calls: Mutex<Vec<RawRequest>>,
    }

    impl ScriptedExchange {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_responses(responses: impl IntoIterator<Item = RawResponse>) -> Self {
            let exchange = Self::new();
            for r in responses {
                exchange.push(Ok(r));
            }
            exchange
        }

        pub fn push(&self, outcome: Result<RawResponse>) -> &Self {
            self.script.lock().unwrap().push_back(outcome);
            self
        }

        pub fn calls(&self) -> Vec<RawRequest> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RawExchange for ScriptedExchange {
        async fn send(&self, request: &RawRequest) -> Result<RawResponse> {
            self.calls.lock().unwrap().push(request.clone());
            self.script.lock().unwrap().pop_front().unwrap_or_else(|| {
                Err(AuroraXError::Transport(format!(
                    "no scripted response for {} {}",
                    request.method, request.url
                )))
            })
        }
    }
}
