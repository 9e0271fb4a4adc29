// Request use cases
//
// Operations on already-submitted requests, addressed by URL. `SearchJob`
// builds on these; they are also usable without a job instance.

use crate::application::abort::{sleep_or_abort, AbortToken};
use crate::application::constants::NO_RESPONSE_MESSAGE;
use crate::application::context::ApiContext;
use crate::application::kinds::SearchKind;
use crate::domain::{timestamp, LogEntry, StatusReport, StatusResponse};
use crate::error::{AuroraXError, Result};
use crate::port::{ApiRequest, ApiResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Admin path listing search requests
pub const LIST_REQUESTS_PATH: &str = "api/v1/utils/admin/search_requests";

/// How a `cancel(wait = true)` loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// DELETE accepted, no waiting requested
    Requested,
    /// Service reported the error condition that follows a cancellation
    Acknowledged,
    /// The search finished before the cancellation took effect
    CompletedFirst,
}

/// Search type filter of the request listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    Conjunction,
    DataProduct,
    Ephemeris,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Conjunction => "conjunction",
            SearchType::DataProduct => "data_product",
            SearchType::Ephemeris => "ephemeris",
        }
    }
}

impl std::str::FromStr for SearchType {
    type Err = AuroraXError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "conjunction" => Ok(SearchType::Conjunction),
            "data_product" => Ok(SearchType::DataProduct),
            "ephemeris" => Ok(SearchType::Ephemeris),
            other => Err(AuroraXError::InvalidRequestShape(format!(
                "unknown search type '{}', expected one of: conjunction, data_product, ephemeris",
                other
            ))),
        }
    }
}

/// Filters for the admin request listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestListFilter {
    pub search_type: Option<SearchType>,
    pub active: Option<bool>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub file_size: Option<u64>,
    pub result_count: Option<u64>,
    pub query_duration: Option<u64>,
    pub error_condition: Option<bool>,
}

impl RequestListFilter {
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        let mut push = |k: &str, v: Option<String>| {
            if let Some(v) = v {
                params.push((k.to_string(), v));
            }
        };
        push("search_type", self.search_type.map(|t| t.as_str().to_string()));
        push("active", self.active.map(|v| v.to_string()));
        push("start", self.start.as_ref().map(timestamp::format));
        push("end", self.end.as_ref().map(timestamp::format));
        push("file_size", self.file_size.map(|v| v.to_string()));
        push("result_count", self.result_count.map(|v| v.to_string()));
        push("query_duration", self.query_duration.map(|v| v.to_string()));
        push("error_condition", self.error_condition.map(|v| v.to_string()));
        params
    }
}

#[derive(Deserialize)]
struct DataResponse {
    #[serde(default)]
    result: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<DataError>,
}

#[derive(Deserialize)]
struct DataError {
    #[serde(default)]
    error_code: Option<Value>,
    #[serde(default)]
    error_message: Option<String>,
}

fn require_body(response: ApiResponse) -> Result<Value> {
    let status = response.status_code;
    response.data.ok_or_else(|| AuroraXError::ServiceError {
        status,
        code: None,
        message: NO_RESPONSE_MESSAGE.to_string(),
    })
}

/// `GET <request_url>` and parse the status body
pub async fn get_status(ctx: &ApiContext, request_url: &str) -> Result<StatusReport> {
    let response = ctx.transport.execute(ApiRequest::get(request_url)).await?;
    let body: StatusResponse = serde_json::from_value(require_body(response)?)?;
    Ok(body.into_report())
}

/// Server-side logs of a request
pub async fn get_logs(ctx: &ApiContext, request_url: &str) -> Result<Vec<LogEntry>> {
    Ok(get_status(ctx, request_url).await?.logs)
}

/// Raw result rows of a finished request
///
/// Uses `POST` with the response-format body when one is given.
pub async fn get_data(ctx: &ApiContext, data_url: &str, response_format: Option<&Value>) -> Result<Vec<Value>> {
    let request = match response_format {
        Some(format) => ApiRequest::post(data_url, format.clone()),
        None => ApiRequest::get(data_url),
    };
    let response = ctx.transport.execute(request).await?;
    let status = response.status_code;
    let body: DataResponse = serde_json::from_value(require_body(response)?)?;

    if let Some(err) = body.error {
        let code = match err.error_code {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        return Err(AuroraXError::DataRetrieval {
            status,
            code,
            message: err.error_message.unwrap_or_default(),
        });
    }

    body.result.ok_or_else(|| AuroraXError::DataRetrieval {
        status,
        code: String::new(),
        message: "response carried neither result nor error".to_string(),
    })
}

/// `DELETE <request_url>`
pub async fn request_cancel(ctx: &ApiContext, request_url: &str) -> Result<()> {
    ctx.transport
        .execute(ApiRequest::delete(request_url).expecting_empty_body())
        .await?;
    Ok(())
}

/// Poll a request until it has data or reports an error condition
///
/// Returns the final report; the caller checks `error_condition`.
pub async fn wait_for_data(
    ctx: &ApiContext,
    request_url: &str,
    poll_interval: Duration,
    verbose: bool,
    abort: &AbortToken,
) -> Result<StatusReport> {
    let mut report = get_status(ctx, request_url).await?;
    while !report.snapshot.has_data() && !report.snapshot.error_condition {
        sleep_or_abort(ctx.sleeper.as_ref(), poll_interval, abort).await?;
        progress!(verbose, request_url = %request_url, "Checking for data");
        report = get_status(ctx, request_url).await?;
    }
    progress!(verbose, request_url = %request_url, "Request finished");
    Ok(report)
}

/// Cancel a request by URL, optionally waiting for the service to settle
pub async fn cancel(
    ctx: &ApiContext,
    request_url: &str,
    wait: bool,
    poll_interval: Duration,
    verbose: bool,
    abort: &AbortToken,
) -> Result<CancelOutcome> {
    request_cancel(ctx, request_url).await?;
    if !wait {
        return Ok(CancelOutcome::Requested);
    }

    loop {
        let report = get_status(ctx, request_url).await?;
        if let Some(outcome) = cancel_outcome(&report) {
            progress!(verbose, request_url = %request_url, outcome = ?outcome, "Cancellation settled");
            return Ok(outcome);
        }
        sleep_or_abort(ctx.sleeper.as_ref(), poll_interval, abort).await?;
        progress!(verbose, request_url = %request_url, "Checking for cancellation status");
    }
}

/// Terminal signal of a cancel-wait loop, if any
///
/// A data location wins over an error condition.
pub fn cancel_outcome(report: &StatusReport) -> Option<CancelOutcome> {
    if report.snapshot.has_data() {
        Some(CancelOutcome::CompletedFirst)
    } else if report.snapshot.error_condition {
        Some(CancelOutcome::Acknowledged)
    } else {
        None
    }
}

/// List search requests (requires an administrator API key)
pub async fn list_requests(ctx: &ApiContext, filter: &RequestListFilter) -> Result<Vec<Value>> {
    let mut request = ApiRequest::get(ctx.endpoint(LIST_REQUESTS_PATH));
    request.params = filter.to_params();

    let response = match ctx.transport.execute(request).await {
        Ok(r) => r,
        Err(AuroraXError::Unauthorized { status, .. }) => {
            return Err(AuroraXError::Unauthorized {
                status,
                message: "an administrator API key is required to list search requests".to_string(),
            })
        }
        Err(e) => return Err(e),
    };

    match require_body(response)? {
        Value::Array(rows) => Ok(rows),
        other => Ok(vec![other]),
    }
}

/// Delete a search request and its results (requires an administrator API key)
pub async fn delete_request(ctx: &ApiContext, request_id: &str) -> Result<()> {
    let url = ctx.endpoint(&format!("{}/{}", LIST_REQUESTS_PATH, request_id));
    ctx.transport
        .execute(ApiRequest::delete(url).expecting_empty_body())
        .await?;
    Ok(())
}

/// SQL-like description of a query, rendered by the service
pub async fn describe<K: SearchKind>(ctx: &ApiContext, query: &K::Query) -> Result<String> {
    let payload = K::payload(query)?;
    let response = ctx
        .transport
        .execute(ApiRequest::post(ctx.endpoint(K::DESCRIBE_PATH), payload))
        .await?;
    Ok(match require_body(response)? {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Absolute request URL for a request id
pub fn request_url<K: SearchKind>(ctx: &ApiContext, request_id: &str) -> String {
    ctx.endpoint(&K::request_path(request_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::abort::abort_channel;
    use crate::application::kinds::EphemerisSearch;
    use crate::domain::{EphemerisQuery, TimeRange};
    use crate::port::http_transport::mocks::ScriptedTransport;
    use crate::port::sleeper::mocks::RecordingSleeper;
    use crate::port::HttpMethod;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    const URL: &str = "https://svc/api/v1/ephemeris/requests/abc";

    fn setup() -> (Arc<ScriptedTransport>, Arc<RecordingSleeper>, ApiContext) {
        let transport = Arc::new(ScriptedTransport::new());
        let sleeper = Arc::new(RecordingSleeper::new());
        let ctx = ApiContext::new(transport.clone(), sleeper.clone(), "https://svc");
        (transport, sleeper, ctx)
    }

    #[tokio::test]
    async fn test_get_status_and_logs() {
        let (transport, _, ctx) = setup();
        transport.push_json(json!({
            "search_result": {"data_uri": null, "error_condition": false},
            "logs": [{"level": "info", "summary": "started"}]
        }));

        let logs = get_logs(&ctx, URL).await.unwrap();
        assert_eq!(logs[0].summary, "started");
        assert_eq!(transport.calls()[0].method, HttpMethod::Get);
        assert_eq!(transport.calls()[0].url, URL);
    }

    #[tokio::test]
    async fn test_get_data_get_vs_post() {
        let (transport, _, ctx) = setup();
        transport.push_json(json!({"result": [{"a": 1}]}));
        transport.push_json(json!({"result": []}));

        let rows = get_data(&ctx, "https://svc/r/data", None).await.unwrap();
        assert_eq!(rows, vec![json!({"a": 1})]);

        let format = json!({"epoch": true});
        get_data(&ctx, "https://svc/r/data", Some(&format)).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls[0].method, HttpMethod::Get);
        assert_eq!(calls[1].method, HttpMethod::Post);
        assert_eq!(calls[1].body, Some(format));
    }

    #[tokio::test]
    async fn test_get_data_error_body() {
        let (transport, _, ctx) = setup();
        transport.push_json(json!({"error": {"error_code": "NO_DATA", "error_message": "expired"}}));

        let err = get_data(&ctx, "https://svc/r/data", None).await.unwrap_err();
        match err {
            AuroraXError::DataRetrieval { status, code, message } => {
                assert_eq!(status, 200);
                assert_eq!(code, "NO_DATA");
                assert_eq!(message, "expired");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wait_for_data_sleeps_between_polls() {
        let (transport, sleeper, ctx) = setup();
        transport.push_status(None, false);
        transport.push_status(None, false);
        transport.push_status(Some("/x"), false);

        let report = wait_for_data(&ctx, URL, Duration::from_millis(250), false, &AbortToken::never())
            .await
            .unwrap();

        assert!(report.snapshot.has_data());
        assert_eq!(transport.call_count(), 3);
        assert_eq!(sleeper.sleeps(), vec![Duration::from_millis(250); 2]);
    }

    #[tokio::test]
    async fn test_wait_for_data_aborts() {
        let (transport, _, ctx) = setup();
        transport.push_status(None, false);
        let (handle, token) = abort_channel();
        handle.abort();

        let err = wait_for_data(&ctx, URL, Duration::from_secs(1), false, &token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuroraXError::Aborted));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_without_wait_is_one_delete() {
        let (transport, sleeper, ctx) = setup();
        transport.push_empty();

        let outcome = cancel(&ctx, URL, false, Duration::from_secs(1), false, &AbortToken::never())
            .await
            .unwrap();

        assert_eq!(outcome, CancelOutcome::Requested);
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, HttpMethod::Delete);
        assert!(calls[0].expect_empty_body);
        assert_eq!(sleeper.count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_wait_resolves_either_way() {
        let (transport, _, ctx) = setup();
        transport.push_empty();
        transport.push_status(None, false);
        transport.push_status(None, true);
        let outcome = cancel(&ctx, URL, true, Duration::from_millis(10), true, &AbortToken::never())
            .await
            .unwrap();
        assert_eq!(outcome, CancelOutcome::Acknowledged);

        let (transport, _, ctx) = setup();
        transport.push_empty();
        transport.push_status(Some("/x"), false);
        let outcome = cancel(&ctx, URL, true, Duration::from_millis(10), false, &AbortToken::never())
            .await
            .unwrap();
        assert_eq!(outcome, CancelOutcome::CompletedFirst);
    }

    #[tokio::test]
    async fn test_list_requests_params_and_admin_message() {
        let (transport, _, ctx) = setup();
        transport.push_json(json!([{"request_id": "a"}, {"request_id": "b"}]));
        transport.push_error(AuroraXError::Unauthorized {
            status: 401,
            message: "unauthorized".to_string(),
        });

        let filter = RequestListFilter {
            search_type: Some(SearchType::Ephemeris),
            active: Some(true),
            start: Some(Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let rows = list_requests(&ctx, &filter).await.unwrap();
        assert_eq!(rows.len(), 2);

        let call = &transport.calls()[0];
        assert_eq!(call.url, "https://svc/api/v1/utils/admin/search_requests");
        assert_eq!(
            call.params,
            vec![
                ("search_type".to_string(), "ephemeris".to_string()),
                ("active".to_string(), "true".to_string()),
                ("start".to_string(), "2022-03-01T00:00:00".to_string()),
            ]
        );

        let err = list_requests(&ctx, &RequestListFilter::default()).await.unwrap_err();
        assert!(matches!(err, AuroraXError::Unauthorized { ref message, .. } if message.contains("administrator")));
    }

    #[tokio::test]
    async fn test_describe_posts_payload() {
        let (transport, _, ctx) = setup();
        transport.push_json(json!("Find ephemeris for ((program in (swarm)))"));

        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap(),
        )
        .unwrap();
        let query = EphemerisQuery::new(range).with_programs(["swarm"]);

        let text = describe::<EphemerisSearch>(&ctx, &query).await.unwrap();
        assert!(text.starts_with("Find ephemeris"));

        let call = &transport.calls()[0];
        assert_eq!(call.url, "https://svc/api/v1/utils/describe/query/ephemeris");
        assert_eq!(call.body.as_ref().unwrap()["data_sources"]["programs"], json!(["swarm"]));
    }

    #[tokio::test]
    async fn test_describe_validates_before_network() {
        let (transport, _, ctx) = setup();
        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap(),
        )
        .unwrap();

        let err = describe::<EphemerisSearch>(&ctx, &EphemerisQuery::new(range))
            .await
            .unwrap_err();
        assert!(matches!(err, AuroraXError::InvalidRequestShape(_)));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_request_url_for_kind() {
        let (_, _, ctx) = setup();
        assert_eq!(
            request_url::<EphemerisSearch>(&ctx, "abc"),
            "https://svc/api/v1/ephemeris/requests/abc"
        );
    }

    #[test]
    fn test_search_type_parse() {
        assert_eq!("data_product".parse::<SearchType>().unwrap(), SearchType::DataProduct);
        assert!("galaxy".parse::<SearchType>().is_err());
    }
}
