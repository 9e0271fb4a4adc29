use super::SearchKind;
use crate::domain::{ConjunctionQuery, ConjunctionRecord, DomainError};
use serde_json::Value;

/// Conjunction search
pub struct ConjunctionSearch;

impl SearchKind for ConjunctionSearch {
    type Query = ConjunctionQuery;
    type Record = ConjunctionRecord;

    const NAME: &'static str = "conjunctions";
    const SEARCH_PATH: &'static str = "api/v1/conjunctions/search";
    const REQUEST_PATH: &'static str = "api/v1/conjunctions/requests";
    const DESCRIBE_PATH: &'static str = "api/v1/utils/describe/query/conjunction";

    fn payload(query: &ConjunctionQuery) -> Result<Value, DomainError> {
        query.to_payload()
    }

    fn response_format(query: &ConjunctionQuery) -> Option<&Value> {
        query.response_format.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_deserialize_into_records() {
        let rows = vec![json!({
            "conjunction_type": "sbtrace",
            "start": "2020-01-01T00:00:00",
            "end": "2020-01-01T00:01:00",
            "data_sources": [],
            "events": []
        })];

        let records = ConjunctionSearch::deserialize_rows(rows).unwrap();
        assert_eq!(records[0].conjunction_type, "sbtrace");
    }
}
