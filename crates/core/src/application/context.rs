// API context shared by jobs and request helpers

use crate::port::{HttpTransport, Sleeper, TokioSleeper};
use std::sync::Arc;

/// Transport, sleeper and base URL of one service deployment
#[derive(Clone)]
pub struct ApiContext {
    pub transport: Arc<dyn HttpTransport>,
    pub sleeper: Arc<dyn Sleeper>,
    base_url: String,
}

impl ApiContext {
    pub fn new(transport: Arc<dyn HttpTransport>, sleeper: Arc<dyn Sleeper>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            sleeper,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Context with the tokio timer sleeper
    pub fn with_tokio_sleeper(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self::new(transport, Arc::new(TokioSleeper), base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Absolute form of a `Location` header value
    pub fn resolve(&self, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else {
            self.endpoint(location)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::http_transport::mocks::ScriptedTransport;

    #[test]
    fn test_endpoint_and_resolve() {
        let ctx = ApiContext::with_tokio_sleeper(Arc::new(ScriptedTransport::new()), "https://api.example.org/");

        assert_eq!(ctx.base_url(), "https://api.example.org");
        assert_eq!(
            ctx.endpoint("api/v1/ephemeris/search"),
            "https://api.example.org/api/v1/ephemeris/search"
        );
        assert_eq!(
            ctx.resolve("/api/v1/ephemeris/requests/abc"),
            "https://api.example.org/api/v1/ephemeris/requests/abc"
        );
        assert_eq!(ctx.resolve("https://other/requests/abc"), "https://other/requests/abc");
    }
}
