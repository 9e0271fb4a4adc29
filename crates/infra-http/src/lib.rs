// AuroraX Infrastructure - HTTP Adapter
// Implements: RawExchange (reqwest), HttpConfig (env-driven settings)

mod config;
mod exchange;

pub use config::{HttpConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use exchange::{build_transport, ReqwestExchange};

// Note: reqwest::Error conversion is handled in `exchange::map_error`
// due to Rust's orphan rules (cannot implement From<reqwest::Error> for AuroraXError here)
