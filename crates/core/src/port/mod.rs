// Port Layer - Interfaces for external dependencies

pub mod http_transport;
pub mod raw_exchange;
pub mod sleeper; // For deterministic testing

// Re-exports
pub use http_transport::{ApiRequest, ApiResponse, HttpMethod, HttpTransport};
pub use raw_exchange::{BodyEncoding, RawExchange, RawRequest, RawResponse};
pub use sleeper::{Sleeper, TokioSleeper};
