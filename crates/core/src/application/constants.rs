// Client constants (No magic values)
use std::time::Duration;

/// Delay before the first status check after submission (50ms)
pub const FIRST_FOLLOWUP_SLEEP: Duration = Duration::from_millis(50);

/// Default interval between status checks (1s)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Additional attempts after a transient gateway error
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Status code of the transient gateway error signature
pub const TRANSIENT_STATUS: u16 = 500;

/// Content-type marker of the transient gateway error signature
pub const TRANSIENT_CONTENT_TYPE: &str = "text/plain";

/// Marker the service puts in 503 messages during maintenance
pub const MAINTENANCE_MODE_MARKER: &str = "maintenance mode";

/// Message used when a body was expected but none arrived
pub const NO_RESPONSE_MESSAGE: &str = "no response received";
