// AuroraX Core - Domain Logic & Ports
// NO infrastructure dependencies: HTTP lives behind `port::RawExchange`

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AuroraXError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
