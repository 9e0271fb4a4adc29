// HTTP Client Configuration

use aurorax_core::application::{ApiKey, TransientRetryPolicy, TransportSettings};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.aurorax.space";

/// Per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything needed to talk to one AuroraX deployment
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub api_key: Option<ApiKey>,
    pub retry: TransientRetryPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("aurorax-rust/{}", aurorax_core::VERSION),
            api_key: None,
            retry: TransientRetryPolicy::default(),
        }
    }
}

impl HttpConfig {
    /// Load configuration from environment variables
    ///
    /// `AURORAX_API_URL`, `AURORAX_API_KEY`, `AURORAX_API_TIMEOUT_SECS`,
    /// `AURORAX_MAX_RETRIES`. Unset or unparsable values keep the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading from an arbitrary source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = non_empty("AURORAX_API_URL").unwrap_or(defaults.base_url);
        let api_key = non_empty("AURORAX_API_KEY").map(ApiKey::new);
        let timeout = Duration::from_secs(parse_u64(
            non_empty("AURORAX_API_TIMEOUT_SECS"),
            defaults.timeout.as_secs(),
        ));
        let max_retries = parse_u64(
            non_empty("AURORAX_MAX_RETRIES"),
            u64::from(defaults.retry.max_retries),
        );

        Self {
            base_url,
            timeout,
            api_key,
            retry: defaults
                .retry
                .with_max_retries(u32::try_from(max_retries).unwrap_or(u32::MAX)),
            ..defaults
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(ApiKey::new(key));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: TransientRetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Settings for the classifying transport
    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            api_key: self.api_key.clone(),
            retry: self.retry.clone(),
            ..TransportSettings::default()
        }
    }
}

fn parse_u64(value: Option<String>, default: u64) -> u64 {
    value
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
