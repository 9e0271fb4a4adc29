// Classifying Transport
//
// Turns one `ApiRequest` into at most `max_attempts` raw exchanges and maps
// the final response to either `ApiResponse` or a typed `AuroraXError`.

use crate::application::constants::{MAINTENANCE_MODE_MARKER, NO_RESPONSE_MESSAGE};
use crate::application::retry::{RetryDecision, TransientRetryPolicy};
use crate::error::{AuroraXError, Result};
use crate::port::{ApiRequest, ApiResponse, BodyEncoding, HttpTransport, RawExchange, RawRequest, RawResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-aurorax-api-key";

/// API key credential
///
/// Never printed: `Debug` shows a redacted placeholder.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey(***)")
    }
}

/// Per-client transport settings, fixed at construction
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub default_headers: Vec<(String, String)>,
    pub api_key: Option<ApiKey>,
    pub retry: TransientRetryPolicy,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            default_headers: vec![
                ("accept".to_string(), "application/json".to_string()),
                ("content-type".to_string(), "application/json".to_string()),
            ],
            api_key: None,
            retry: TransientRetryPolicy::default(),
        }
    }
}

impl TransportSettings {
    /// Defaults, then caller headers, then the credential
    ///
    /// Header names compare case-insensitively; later sources win.
    pub fn merge_headers(&self, caller: &[(String, String)]) -> Vec<(String, String)> {
        fn upsert(headers: &mut Vec<(String, String)>, key: &str, value: &str) {
            match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
                Some(entry) => entry.1 = value.to_string(),
                None => headers.push((key.to_string(), value.to_string())),
            }
        }

        let mut headers = self.default_headers.clone();
        for (k, v) in caller {
            upsert(&mut headers, k, v);
        }
        if let Some(key) = &self.api_key {
            upsert(&mut headers, API_KEY_HEADER, key.expose());
        }
        headers
    }
}

/// Transport with bounded retry and response classification
pub struct ClassifyingTransport {
    exchange: Arc<dyn RawExchange>,
    settings: TransportSettings,
}

impl ClassifyingTransport {
    pub fn new(exchange: Arc<dyn RawExchange>, settings: TransportSettings) -> Self {
        Self { exchange, settings }
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }
}

#[async_trait]
impl HttpTransport for ClassifyingTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut raw = RawRequest {
            method: request.method,
            url: request.url.clone(),
            params: request.params.clone(),
            headers: self.settings.merge_headers(&request.headers),
            body: request.body.clone(),
            encoding: BodyEncoding::Serialized,
        };

        let mut attempt: u32 = 1;
        let response = loop {
            let response = self.exchange.send(&raw).await?;
            debug!(
                method = %raw.method,
                url = %raw.url,
                status = %response.status,
                attempt = %attempt,
                "Exchange finished"
            );

            if request.skip_retry {
                break response;
            }

            match self.settings.retry.decide(&response, attempt) {
                RetryDecision::Accept => break response,
                RetryDecision::Retry => {
                    attempt += 1;
                    raw.encoding = BodyEncoding::Json;
                }
                RetryDecision::Exhausted => {
                    return Err(AuroraXError::MaxRetriesExceeded {
                        status: response.status,
                        attempts: attempt,
                        body: response.body,
                    });
                }
            }
        };

        classify(response, request.expect_empty_body)
    }
}

/// `(error_code, error_message)` from a JSON error body
///
/// Accepts both the flat `{error_code, error_message}` shape and the
/// nested `{error: {...}}` shape.
fn error_fields(response: &RawResponse) -> Option<(Option<String>, String)> {
    if !response.is_json() {
        return None;
    }
    let body: Value = serde_json::from_str(&response.body).ok()?;
    let obj = match body.get("error") {
        Some(inner) if inner.is_object() => inner,
        _ => &body,
    };
    let message = obj.get("error_message")?;
    let message = match message {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let code = obj.get("error_code").and_then(|c| match c {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    });
    Some((code, message))
}

/// Map a final response to an outcome
pub fn classify(response: RawResponse, expect_empty_body: bool) -> Result<ApiResponse> {
    let status = response.status;

    match status {
        401 => Err(AuroraXError::Unauthorized {
            status,
            message: error_fields(&response)
                .map(|(_, m)| m)
                .unwrap_or_else(|| "unauthorized".to_string()),
        }),
        404 => Err(AuroraXError::NotFound {
            status,
            message: error_fields(&response)
                .map(|(_, m)| m)
                .unwrap_or_else(|| "not found".to_string()),
        }),
        502 => Err(AuroraXError::GatewayUnavailable { status }),
        503 => {
            let (code, message) = error_fields(&response).unwrap_or((None, response.body));
            if message.to_lowercase().contains(MAINTENANCE_MODE_MARKER) {
                Err(AuroraXError::MaintenanceMode { status, message })
            } else {
                Err(AuroraXError::ServiceError { status, code, message })
            }
        }
        500 => match error_fields(&response) {
            Some((code, message)) => Err(AuroraXError::ServiceError { status, code, message }),
            None => Err(AuroraXError::ServiceError {
                status,
                code: None,
                message: response.body,
            }),
        },
        200..=299 => {
            if expect_empty_body {
                return Ok(ApiResponse {
                    status_code: status,
                    location: response.location,
                    data: None,
                });
            }
            if response.body.trim().is_empty() {
                return Err(AuroraXError::ServiceError {
                    status,
                    code: None,
                    message: NO_RESPONSE_MESSAGE.to_string(),
                });
            }
            if !response.is_json() {
                return Err(AuroraXError::UnexpectedContentType {
                    status,
                    content_type: response.content_type.unwrap_or_default(),
                    body: response.body,
                });
            }
            let data: Value = serde_json::from_str(&response.body)?;
            Ok(ApiResponse {
                status_code: status,
                location: response.location,
                data: Some(data),
            })
        }
        _ => {
            if let Some((code, message)) = error_fields(&response) {
                return Err(AuroraXError::ServiceError { status, code, message });
            }
            if !expect_empty_body && !response.is_json() {
                return Err(AuroraXError::UnexpectedContentType {
                    status,
                    content_type: response.content_type.unwrap_or_default(),
                    body: response.body,
                });
            }
            Err(AuroraXError::ServiceError {
                status,
                code: None,
                message: response.body,
            })
        }
    }
}
