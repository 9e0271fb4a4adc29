// Search kinds
//
// A search kind fixes the endpoint paths, the query payload and the row
// type of one family of searches. `SearchJob<K>` is generic over it.

mod conjunctions;
mod data_products;
mod ephemeris;

pub use conjunctions::ConjunctionSearch;
pub use data_products::DataProductSearch;
pub use ephemeris::EphemerisSearch;

use crate::domain::DomainError;
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// One family of searches (ephemeris, data products, conjunctions)
pub trait SearchKind: Send + Sync + 'static {
    type Query: Clone + Send + Sync;
    type Record: DeserializeOwned + Send + Sync;

    /// Human-readable name used in logs
    const NAME: &'static str;
    /// `POST` target for new searches
    const SEARCH_PATH: &'static str;
    /// Prefix of request resources; the request id is appended
    const REQUEST_PATH: &'static str;
    /// `POST` target returning the SQL-like description of a query
    const DESCRIBE_PATH: &'static str;

    /// Validate the query and render its wire payload
    fn payload(query: &Self::Query) -> std::result::Result<Value, DomainError>;

    /// Response-shaping body, if the query asks for partial fields
    fn response_format(query: &Self::Query) -> Option<&Value>;

    /// Convert raw result rows into typed records
    fn deserialize_rows(rows: Vec<Value>) -> Result<Vec<Self::Record>> {
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(Into::into))
            .collect()
    }

    /// Request resource path for an id
    fn request_path(request_id: &str) -> String {
        format!("{}/{}", Self::REQUEST_PATH, request_id)
    }
}
