use super::SearchKind;
use crate::domain::{DomainError, EphemerisQuery, EphemerisRecord};
use serde_json::Value;

/// Ephemeris search
pub struct EphemerisSearch;

impl SearchKind for EphemerisSearch {
    type Query = EphemerisQuery;
    type Record = EphemerisRecord;

    const NAME: &'static str = "ephemeris";
    const SEARCH_PATH: &'static str = "api/v1/ephemeris/search";
    const REQUEST_PATH: &'static str = "api/v1/ephemeris/requests";
    const DESCRIBE_PATH: &'static str = "api/v1/utils/describe/query/ephemeris";

    fn payload(query: &EphemerisQuery) -> Result<Value, DomainError> {
        query.to_payload()
    }

    fn response_format(query: &EphemerisQuery) -> Option<&Value> {
        query.response_format.as_ref()
    }
}
