// Status snapshot of a submitted search request

use serde::{Deserialize, Serialize};

/// Last known server-side progress of a request
///
/// Value type: every refresh replaces the whole snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub completed: bool,
    pub data_location: Option<String>,
    pub error_condition: bool,
    pub result_byte_size: u64,
    pub result_count: u64,
}

impl StatusSnapshot {
    /// Snapshot of a request the service is still working on
    pub fn pending() -> Self {
        Self {
            completed: false,
            data_location: None,
            error_condition: false,
            result_byte_size: 0,
            result_count: 0,
        }
    }

    /// Snapshot of a request whose results are ready at `data_location`
    pub fn ready(data_location: impl Into<String>, result_count: u64, result_byte_size: u64) -> Self {
        Self {
            completed: true,
            data_location: Some(data_location.into()),
            error_condition: false,
            result_byte_size,
            result_count,
        }
    }

    /// Snapshot of a request that ended in an error condition
    pub fn errored() -> Self {
        Self {
            completed: true,
            data_location: None,
            error_condition: true,
            result_byte_size: 0,
            result_count: 0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.data_location.is_some()
    }
}

/// One server-side log line for a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Snapshot plus the log list that came with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub snapshot: StatusSnapshot,
    pub logs: Vec<LogEntry>,
}

/// Status body as returned by `GET <request_url>`
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub search_result: SearchResult,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub data_uri: Option<String>,
    #[serde(default)]
    pub error_condition: Option<bool>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub result_count: Option<u64>,
    #[serde(default)]
    pub completed_timestamp: Option<String>,
}

impl StatusResponse {
    /// Split the wire body into the snapshot and the log list
    pub fn into_report(self) -> StatusReport {
        let r = self.search_result;
        let error_condition = r.error_condition.unwrap_or(false);
        let snapshot = StatusSnapshot {
            completed: r.data_uri.is_some() || error_condition || r.completed_timestamp.is_some(),
            data_location: r.data_uri,
            error_condition,
            result_byte_size: r.file_size.unwrap_or(0),
            result_count: r.result_count.unwrap_or(0),
        };
        StatusReport {
            snapshot,
            logs: self.logs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_running_request() {
        let body = json!({
            "search_result": {
                "data_uri": null,
                "error_condition": false,
                "file_size": null,
                "result_count": null
            },
            "logs": [
                {"level": "info", "summary": "search queued", "timestamp": "2022-01-01T00:00:00"}
            ]
        });

        let resp: StatusResponse = serde_json::from_value(body).unwrap();
        let StatusReport { snapshot, logs } = resp.into_report();

        assert_eq!(snapshot, StatusSnapshot::pending());
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].summary, "search queued");
    }

    #[test]
    fn test_finished_request() {
        let body = json!({
            "search_result": {
                "data_uri": "/api/v1/ephemeris/requests/abc/data",
                "error_condition": false,
                "file_size": 2048,
                "result_count": 12,
                "completed_timestamp": "2022-01-01T00:00:03"
            }
        });

        let resp: StatusResponse = serde_json::from_value(body).unwrap();
        let StatusReport { snapshot, logs } = resp.into_report();

        assert!(snapshot.completed);
        assert!(snapshot.has_data());
        assert_eq!(snapshot.result_count, 12);
        assert_eq!(snapshot.result_byte_size, 2048);
        assert!(logs.is_empty());
    }

    #[test]
    fn test_missing_search_result_is_rejected() {
        let res: Result<StatusResponse, _> = serde_json::from_value(json!({"logs": []}));
        assert!(res.is_err());
    }
}
