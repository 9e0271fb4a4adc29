//! AuroraX SDK - Rust Client Library
//!
//! Submits asynchronous searches to the AuroraX API, waits for them to finish
//! and downloads the typed results.
//!
//! # Example
//!
//! ```no_run
//! use aurorax_sdk::{AuroraXClient, EphemerisQuery, TimeRange};
//! use chrono::{TimeZone, Utc};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AuroraXClient::from_env()?;
//!
//!     let range = TimeRange::new(
//!         Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
//!         Utc.with_ymd_and_hms(2020, 1, 1, 0, 59, 59).unwrap(),
//!     )?;
//!     let query = EphemerisQuery::new(range).with_programs(["swarm"]);
//!
//!     let records = client.search_ephemeris(query).await?;
//!     println!("{} records", records.len());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;

pub use client::{AuroraXClient, SearchOptions};
pub use error::{AuroraXError, Result};

pub use aurorax_core::application::{
    abort_channel, AbortHandle, AbortToken, CancelOutcome, ConjunctionSearch, DataProductSearch,
    EphemerisSearch, RequestListFilter, SearchJob, SearchKind, SearchType, TransientRetryPolicy,
};
pub use aurorax_core::domain::{
    AdhocCriteriaBlock, ConjunctionEvent, ConjunctionQuery, ConjunctionRecord, ConjunctionType,
    CriteriaBlock, DataProductQuery, DataProductRecord, DataProductType, DataSource,
    EphemerisQuery, EphemerisRecord, EventsCriteriaBlock, Hemisphere, JobState, Location,
    LogEntry, LogicalOperator, MaxDistances, MetadataFilter, MetadataFilterExpression,
    MetadataOperator, SpaceCriteriaBlock, StatusReport, StatusSnapshot, TimeRange,
};
pub use aurorax_infra_http::{HttpConfig, DEFAULT_BASE_URL};
