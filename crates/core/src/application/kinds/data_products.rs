use super::SearchKind;
use crate::domain::{DataProductQuery, DataProductRecord, DomainError};
use serde_json::Value;

/// Data product search
pub struct DataProductSearch;

impl SearchKind for DataProductSearch {
    type Query = DataProductQuery;
    type Record = DataProductRecord;

    const NAME: &'static str = "data_products";
    const SEARCH_PATH: &'static str = "api/v1/data_products/search";
    const REQUEST_PATH: &'static str = "api/v1/data_products/requests";
    const DESCRIBE_PATH: &'static str = "api/v1/utils/describe/query/data_products";

    fn payload(query: &DataProductQuery) -> Result<Value, DomainError> {
        query.to_payload()
    }

    fn response_format(query: &DataProductQuery) -> Option<&Value> {
        query.response_format.as_ref()
    }
}
