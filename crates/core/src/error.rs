// Central Error Type for the Client

use crate::domain::DomainError;
use thiserror::Error;

/// Client-level error type
///
/// Every variant that originates from an HTTP exchange carries the status
/// code, so callers can match on the kind instead of parsing messages.
#[derive(Error, Debug)]
pub enum AuroraXError {
    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Not found ({status}): {message}")]
    NotFound { status: u16, message: String },

    #[error("Service error ({status}){}: {message}", code_suffix(.code))]
    ServiceError {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Gateway unavailable ({status})")]
    GatewayUnavailable { status: u16 },

    #[error("Service in maintenance mode ({status}): {message}")]
    MaintenanceMode { status: u16, message: String },

    #[error("Max retries exceeded after {attempts} attempts ({status}): {body}")]
    MaxRetriesExceeded {
        status: u16,
        attempts: u32,
        body: String,
    },

    #[error("Unexpected content type '{content_type}' ({status}): {body}")]
    UnexpectedContentType {
        status: u16,
        content_type: String,
        body: String,
    },

    #[error("Request timeout reached")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid request shape: {0}")]
    InvalidRequestShape(String),

    #[error("Invalid state: {from} -> {to}")]
    InvalidState { from: String, to: String },

    #[error("Domain error: {0}")]
    Domain(DomainError),

    #[error("Data retrieval error ({status}) [{code}]: {message}")]
    DataRetrieval { status: u16, code: String, message: String },

    #[error("Search {request_id} failed: {summary}")]
    SearchFailed { request_id: String, summary: String },

    #[error("Aborted while waiting")]
    Aborted,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(" [{}]", c)).unwrap_or_default()
}

impl AuroraXError {
    /// HTTP status associated with the error, if it came from a response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AuroraXError::Unauthorized { status, .. }
            | AuroraXError::NotFound { status, .. }
            | AuroraXError::ServiceError { status, .. }
            | AuroraXError::GatewayUnavailable { status }
            | AuroraXError::MaintenanceMode { status, .. }
            | AuroraXError::MaxRetriesExceeded { status, .. }
            | AuroraXError::UnexpectedContentType { status, .. }
            | AuroraXError::DataRetrieval { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<DomainError> for AuroraXError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidStateTransition { from, to } => AuroraXError::InvalidState { from, to },
            DomainError::InvalidRequestShape(msg) => AuroraXError::InvalidRequestShape(msg),
            other => AuroraXError::Domain(other),
        }
    }
}

/// Result type alias using AuroraXError
pub type Result<T> = std::result::Result<T, AuroraXError>;
