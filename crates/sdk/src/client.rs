//! AuroraX Client Implementation

use crate::error::Result;
use aurorax_core::application::constants::DEFAULT_POLL_INTERVAL;
use aurorax_core::application::{
    requests, AbortToken, ApiContext, CancelOutcome, ConjunctionSearch, DataProductSearch,
    EphemerisSearch, RequestListFilter, SearchJob, SearchKind,
};
use aurorax_core::domain::{
    ConjunctionQuery, ConjunctionRecord, DataProductQuery, DataProductRecord, EphemerisQuery,
    EphemerisRecord, LogEntry, StatusReport,
};
use aurorax_core::port::HttpTransport;
use aurorax_infra_http::{build_transport, HttpConfig};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// How long-running calls wait
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub poll_interval: Duration,
    /// Log progress at info level instead of debug
    pub verbose: bool,
    pub abort: AbortToken,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            verbose: false,
            abort: AbortToken::never(),
        }
    }
}

impl SearchOptions {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_abort(mut self, abort: AbortToken) -> Self {
        self.abort = abort;
        self
    }
}

/// AuroraX API Client
///
/// Cheap to clone; every clone shares the same HTTP connection pool.
///
/// # Example
///
/// ```no_run
/// use aurorax_sdk::{AuroraXClient, HttpConfig};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = AuroraXClient::new(HttpConfig::default().with_api_key("my-key"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuroraXClient {
    ctx: ApiContext,
}

impl AuroraXClient {
    /// Build a client over HTTP
    pub fn new(config: HttpConfig) -> Result<Self> {
        debug!(base_url = %config.base_url, timeout_secs = config.timeout.as_secs(), "Creating AuroraX client");
        let transport = build_transport(&config)?;
        Ok(Self::with_transport(transport, config.base_url))
    }

    /// Build a client from `AURORAX_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(HttpConfig::from_env())
    }

    /// Use a custom transport (tests, proxies)
    pub fn with_transport(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            ctx: ApiContext::with_tokio_sleeper(transport, base_url),
        }
    }

    pub fn from_context(ctx: ApiContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ApiContext {
        &self.ctx
    }

    // ------------------------------------------------------------------
    // Jobs
    // ------------------------------------------------------------------

    /// New, unsubmitted job of any kind
    pub fn job<K: SearchKind>(&self, query: K::Query) -> SearchJob<K> {
        SearchJob::new(self.ctx.clone(), query)
    }

    pub fn ephemeris_search(&self, query: EphemerisQuery) -> SearchJob<EphemerisSearch> {
        self.job(query)
    }

    pub fn data_product_search(&self, query: DataProductQuery) -> SearchJob<DataProductSearch> {
        self.job(query)
    }

    pub fn conjunction_search(&self, query: ConjunctionQuery) -> SearchJob<ConjunctionSearch> {
        self.job(query)
    }

    /// Submit, wait and fetch; returns the finished job
    pub async fn search<K: SearchKind>(&self, query: K::Query, options: &SearchOptions) -> Result<SearchJob<K>> {
        let mut job = self.job::<K>(query);
        job.run(options.poll_interval, options.verbose, &options.abort)
            .await?;
        Ok(job)
    }

    pub async fn search_ephemeris(&self, query: EphemerisQuery) -> Result<Vec<EphemerisRecord>> {
        let job = self
            .search::<EphemerisSearch>(query, &SearchOptions::default())
            .await?;
        Ok(job.into_data())
    }

    pub async fn search_data_products(&self, query: DataProductQuery) -> Result<Vec<DataProductRecord>> {
        let job = self
            .search::<DataProductSearch>(query, &SearchOptions::default())
            .await?;
        Ok(job.into_data())
    }

    pub async fn search_conjunctions(&self, query: ConjunctionQuery) -> Result<Vec<ConjunctionRecord>> {
        let job = self
            .search::<ConjunctionSearch>(query, &SearchOptions::default())
            .await?;
        Ok(job.into_data())
    }

    // ------------------------------------------------------------------
    // Requests by URL
    // ------------------------------------------------------------------

    pub async fn get_status(&self, request_url: &str) -> Result<StatusReport> {
        requests::get_status(&self.ctx, request_url).await
    }

    pub async fn get_logs(&self, request_url: &str) -> Result<Vec<LogEntry>> {
        requests::get_logs(&self.ctx, request_url).await
    }

    /// Raw result rows from a data URL
    pub async fn get_data(&self, data_url: &str, response_format: Option<&Value>) -> Result<Vec<Value>> {
        requests::get_data(&self.ctx, data_url, response_format).await
    }

    pub async fn wait_for_data(&self, request_url: &str, options: &SearchOptions) -> Result<StatusReport> {
        requests::wait_for_data(
            &self.ctx,
            request_url,
            options.poll_interval,
            options.verbose,
            &options.abort,
        )
        .await
    }

    pub async fn cancel(&self, request_url: &str, wait: bool, options: &SearchOptions) -> Result<CancelOutcome> {
        requests::cancel(
            &self.ctx,
            request_url,
            wait,
            options.poll_interval,
            options.verbose,
            &options.abort,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Utilities
    // ------------------------------------------------------------------

    /// List search requests (administrator key)
    pub async fn list_requests(&self, filter: &RequestListFilter) -> Result<Vec<Value>> {
        requests::list_requests(&self.ctx, filter).await
    }

    /// Delete a search request (administrator key)
    pub async fn delete_request(&self, request_id: &str) -> Result<()> {
        requests::delete_request(&self.ctx, request_id).await
    }

    pub async fn describe<K: SearchKind>(&self, query: &K::Query) -> Result<String> {
        requests::describe::<K>(&self.ctx, query).await
    }

    pub fn request_url<K: SearchKind>(&self, request_id: &str) -> String {
        requests::request_url::<K>(&self.ctx, request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurorax_core::domain::{JobState, TimeRange};
    use aurorax_core::port::http_transport::mocks::ScriptedTransport;
    use aurorax_core::port::sleeper::mocks::RecordingSleeper;
    use aurorax_core::port::HttpMethod;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tokio_test::assert_ok;

    fn client() -> (Arc<ScriptedTransport>, AuroraXClient) {
        let transport = Arc::new(ScriptedTransport::new());
        let ctx = ApiContext::new(transport.clone(), Arc::new(RecordingSleeper::new()), "https://svc/");
        (transport, AuroraXClient::from_context(ctx))
    }

    fn query() -> EphemerisQuery {
        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 59, 59).unwrap(),
        )
        .unwrap();
        EphemerisQuery::new(range).with_programs(["swarm"])
    }

    #[test]
    fn test_new_client_from_default_config() {
        let client = assert_ok!(AuroraXClient::new(HttpConfig::default()));
        assert_eq!(client.context().base_url(), "https://api.aurorax.space");
    }

    #[test]
    fn test_request_url_per_kind() {
        let (_, client) = client();
        assert_eq!(
            client.request_url::<EphemerisSearch>("abc"),
            "https://svc/api/v1/ephemeris/requests/abc"
        );
        assert_eq!(
            client.request_url::<ConjunctionSearch>("abc"),
            "https://svc/api/v1/conjunctions/requests/abc"
        );
    }

    #[test]
    fn test_job_starts_created() {
        let (transport, client) = client();
        let job = client.ephemeris_search(query());
        assert_eq!(job.state(), JobState::Created);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_search_ephemeris_end_to_end() {
        let (transport, client) = client();
        transport.push_accepted("https://svc/api/v1/ephemeris/requests/r1");
        transport.push_status(None, false);
        transport.push_status(Some("/x"), false);
        transport.push_json(json!({"result": [{
            "data_source": {"program": "swarm", "platform": "swarma"},
            "epoch": "2020-01-01T00:05:00",
            "location_geo": {"lat": 51.05, "lon": -114.07}
        }]}));

        let records = assert_ok!(client.search_ephemeris(query()).await);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data_source.platform.as_deref(), Some("swarma"));
        assert_eq!(transport.call_count(), 4);
    }

    #[tokio::test]
    async fn test_cancel_by_url() {
        let (transport, client) = client();
        transport.push_empty();

        let outcome = assert_ok!(
            client
                .cancel("https://svc/api/v1/ephemeris/requests/r1", false, &SearchOptions::default())
                .await
        );

        assert_eq!(outcome, CancelOutcome::Requested);
        assert_eq!(transport.calls()[0].method, HttpMethod::Delete);
    }
}
