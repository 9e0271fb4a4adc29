// Application Layer - Job lifecycle and request use cases

/// Progress line: `info!` when verbose, `debug!` otherwise
macro_rules! progress {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

pub mod abort;
pub mod constants;
pub mod context;
pub mod kinds;
pub mod requests;
pub mod retry;
pub mod search_job;
pub mod transport;

// Re-exports
pub use abort::{abort_channel, AbortHandle, AbortToken};
pub use context::ApiContext;
pub use kinds::{ConjunctionSearch, DataProductSearch, EphemerisSearch, SearchKind};
pub use requests::{CancelOutcome, RequestListFilter, SearchType};
pub use retry::{RetryDecision, TransientRetryPolicy};
pub use search_job::SearchJob;
pub use transport::{ApiKey, ClassifyingTransport, TransportSettings, API_KEY_HEADER};
