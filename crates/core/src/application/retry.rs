// Transient error retry policy
//
// A 500 with a plain-text body comes from the reverse proxy in front of the
// service, not from the service itself. Status and content type are configurable.
use crate::application::constants::{DEFAULT_MAX_RETRIES, TRANSIENT_CONTENT_TYPE, TRANSIENT_STATUS};
use crate::port::RawResponse;
use tracing::warn;

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Not a transient failure, classify the response as-is
    Accept,
    /// Transient failure with attempts left, resend
    Retry,
    /// Transient failure on the last allowed attempt
    Exhausted,
}

/// Bounded retry policy for transient gateway errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientRetryPolicy {
    pub enabled: bool,
    /// Additional attempts after the first one
    pub max_retries: u32,
    pub status: u16,
    /// Substring that must appear in the response content type
    pub content_type_marker: String,
}

impl Default for TransientRetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: DEFAULT_MAX_RETRIES,
            status: TRANSIENT_STATUS,
            content_type_marker: TRANSIENT_CONTENT_TYPE.to_string(),
        }
    }
}

impl TransientRetryPolicy {
    /// Policy that never retries
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Total number of attempts the policy allows
    pub fn max_attempts(&self) -> u32 {
        if self.enabled {
            self.max_retries.saturating_add(1)
        } else {
            1
        }
    }

    pub fn is_transient(&self, response: &RawResponse) -> bool {
        response.status == self.status
            && response
                .content_type
                .as_deref()
                .map(|ct| ct.contains(self.content_type_marker.as_str()))
                .unwrap_or(false)
    }

    /// Decide what to do with a response
    ///
    /// # Arguments
    /// * `response` - Response of the attempt that just finished
    /// * `attempt` - 1-based number of that attempt
    pub fn decide(&self, response: &RawResponse, attempt: u32) -> RetryDecision {
        if !self.enabled || !self.is_transient(response) {
            return RetryDecision::Accept;
        }

        if attempt >= self.max_attempts() {
            warn!(
                status = %response.status,
                attempts = %attempt,
                "Max retry attempts reached"
            );
            return RetryDecision::Exhausted;
        }

        warn!(
            status = %response.status,
            attempt = %attempt,
            max_attempts = %self.max_attempts(),
            "Transient gateway error, retrying"
        );
        RetryDecision::Retry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transient_signature() {
        let policy = TransientRetryPolicy::default();

        assert!(policy.is_transient(&RawResponse::text(500, "Bad gateway")));
        assert!(policy.is_transient(
            &RawResponse::text(500, "x").with_content_type("text/plain; charset=utf-8")
        ));
        assert!(!policy.is_transient(&RawResponse::json(500, json!({"error_message": "x"}))));
        assert!(!policy.is_transient(&RawResponse::text(502, "x")));
    }

    #[test]
    fn test_default_allows_two_retries() {
        let policy = TransientRetryPolicy::default();
        let resp = RawResponse::text(500, "oops");

        assert_eq!(policy.decide(&resp, 1), RetryDecision::Retry);
        assert_eq!(policy.decide(&resp, 2), RetryDecision::Retry);
        assert_eq!(policy.decide(&resp, 3), RetryDecision::Exhausted);
    }

    #[test]
    fn test_non_transient_is_accepted() {
        let policy = TransientRetryPolicy::default();
        assert_eq!(
            policy.decide(&RawResponse::json(200, json!({})), 1),
            RetryDecision::Accept
        );
    }

    #[test]
    fn test_disabled_policy_accepts_everything() {
        let policy = TransientRetryPolicy::disabled();
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(
            policy.decide(&RawResponse::text(500, "oops"), 1),
            RetryDecision::Accept
        );
    }

    #[test]
    fn test_custom_signature() {
        let policy = TransientRetryPolicy {
            status: 504,
            content_type_marker: "text/html".to_string(),
            ..TransientRetryPolicy::default()
        }
        .with_max_retries(0);

        let resp = RawResponse::text(504, "<html/>").with_content_type("text/html");
        assert_eq!(policy.decide(&resp, 1), RetryDecision::Exhausted);
    }

    #[test]
    fn test_unbounded_retries_saturate() {
        let policy = TransientRetryPolicy::default().with_max_retries(u32::MAX);
        let resp = RawResponse::text(500, "x");

        assert_eq!(policy.max_attempts(), u32::MAX);
        assert_eq!(policy.decide(&resp, 1), RetryDecision::Retry);
        assert_eq!(policy.decide(&resp, u32::MAX), RetryDecision::Exhausted);
    }
}
