// Domain Layer - Pure search model and job state machine

pub mod error;
pub mod job;
pub mod location;
pub mod query;
pub mod record;
pub mod status;
pub mod timestamp;

// Re-exports
pub use error::DomainError;
pub use job::{Job, JobState, RequestLocation};
pub use location::Location;
pub use query::{
    AdhocCriteriaBlock, ConjunctionQuery, ConjunctionType, CriteriaBlock, DataProductQuery,
    DataProductType, EphemerisQuery, EventsCriteriaBlock, Hemisphere, LogicalOperator, MaxDistances,
    MetadataFilter, MetadataFilterExpression, MetadataOperator, SpaceCriteriaBlock, TimeRange,
};
pub use record::{ConjunctionEvent, ConjunctionRecord, DataProductRecord, DataSource, EphemerisRecord};
pub use status::{LogEntry, StatusReport, StatusResponse, StatusSnapshot};
