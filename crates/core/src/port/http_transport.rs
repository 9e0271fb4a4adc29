// HTTP Transport Port
// One classified exchange with the search service: callers see either a
// successful `ApiResponse` or a typed `AuroraXError`.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Delete => write!(f, "DELETE"),
            HttpMethod::Patch => write!(f, "PATCH"),
        }
    }
}

/// Request to the search service
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Merged over the transport's default headers
    pub headers: Vec<(String, String)>,
    /// Success responses carry no JSON body (submit, cancel)
    pub expect_empty_body: bool,
    /// Bypass the transient-error retry loop
    pub skip_retry: bool,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            body: None,
            headers: Vec::new(),
            expect_empty_body: false,
            skip_retry: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, url).with_body(body)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn expecting_empty_body(mut self) -> Self {
        self.expect_empty_body = true;
        self
    }

    pub fn without_retry(mut self) -> Self {
        self.skip_retry = true;
        self
    }
}

/// Successful outcome of an exchange
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status_code: u16,
    /// `Location` header, if the service sent one
    pub location: Option<String>,
    /// Parsed JSON body; `None` for empty-body requests
    pub data: Option<Value>,
}

/// HTTP Transport trait
///
/// Implementations:
/// - ClassifyingTransport: retry + classification over a RawExchange
/// - mocks::ScriptedTransport: replays scripted outcomes in tests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute one request and classify the outcome
    ///
    /// # Errors
    /// Any `AuroraXError` transport kind (Unauthorized, NotFound,
    /// ServiceError, GatewayUnavailable, MaintenanceMode,
    /// MaxRetriesExceeded, UnexpectedContentType, Timeout, Transport)
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AuroraXError;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport that replays a fixed script of outcomes and records requests
    #[derive(Default)]
    pub struct ScriptedTransport {
        script: Mutex<VecDeque<Result<ApiResponse>>>,
        calls: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, outcome: Result<ApiResponse>) -> &Self {
            self.script.lock().unwrap().push_back(outcome);
            self
        }

        /// 202 Accepted with a `Location` header
        pub fn push_accepted(&self, location: &str) -> &Self {
            self.push(Ok(ApiResponse {
                status_code: 202,
                location: Some(location.to_string()),
                data: None,
            }))
        }

        /// 200 OK with a JSON body
        pub fn push_json(&self, body: Value) -> &Self {
            self.push(Ok(ApiResponse {
                status_code: 200,
                location: None,
                data: Some(body),
            }))
        }

        /// 200 OK with no body
        pub fn push_empty(&self) -> &Self {
            self.push(Ok(ApiResponse {
                status_code: 200,
                location: None,
                data: None,
            }))
        }

        /// Status body with the given data location / error flag
        pub fn push_status(&self, data_uri: Option<&str>, error_condition: bool) -> &Self {
            self.push_json(json!({
                "search_result": {
                    "data_uri": data_uri,
                    "error_condition": error_condition,
                    "file_size": 0,
                    "result_count": 0
                },
                "logs": []
            }))
        }

        pub fn push_error(&self, err: AuroraXError) -> &Self {
            self.push(Err(err))
        }

        pub fn calls(&self) -> Vec<ApiRequest> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn remaining(&self) -> usize {
            self.script.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
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
