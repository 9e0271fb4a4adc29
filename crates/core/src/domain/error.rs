// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid job state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid request shape: {0}")]
    InvalidRequestShape(String),

    #[error("Partial location: lat and lon must both be present or both absent")]
    PartialLocation,

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
