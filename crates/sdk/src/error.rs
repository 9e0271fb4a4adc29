//! SDK Error Types
//!
//! The SDK surfaces the client error type unchanged, so callers can match on
//! the HTTP-derived kinds (`Unauthorized`, `MaxRetriesExceeded`, ...).

pub use aurorax_core::error::{AuroraXError, Result};
