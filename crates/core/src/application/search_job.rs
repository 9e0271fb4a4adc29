// Search Job - lifecycle of one submitted search
//
// Single writer per instance: every operation takes `&mut self`, so polls are
// applied strictly in the order they complete.

use crate::application::abort::{sleep_or_abort, AbortToken};
use crate::application::constants::FIRST_FOLLOWUP_SLEEP;
use crate::application::context::ApiContext;
use crate::application::kinds::SearchKind;
use crate::application::requests::{self, CancelOutcome};
use crate::domain::{DomainError, Job, JobState, LogEntry, RequestLocation, StatusReport, StatusSnapshot};
use crate::error::{AuroraXError, Result};
use crate::port::ApiRequest;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

/// One search of kind `K` and its lifecycle state
pub struct SearchJob<K: SearchKind> {
    ctx: ApiContext,
    query: K::Query,
    job: Job<K::Record>,
    raw_data: Vec<Value>,
}

impl<K: SearchKind> SearchJob<K> {
    pub fn new(ctx: ApiContext, query: K::Query) -> Self {
        Self {
            ctx,
            query,
            job: Job::new(),
            raw_data: Vec::new(),
        }
    }

    pub fn query(&self) -> &K::Query {
        &self.query
    }

    pub fn state(&self) -> JobState {
        self.job.state()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.job.request_id()
    }

    pub fn request_url(&self) -> Option<&str> {
        self.job.request_url()
    }

    pub fn data_url(&self) -> Option<&str> {
        self.job.data_url()
    }

    pub fn status(&self) -> Option<&StatusSnapshot> {
        self.job.status()
    }

    pub fn logs(&self) -> &[LogEntry] {
        self.job.logs()
    }

    /// Typed records; filled by `fetch_data` when no response format is set
    pub fn data(&self) -> &[K::Record] {
        self.job.data()
    }

    /// Raw rows; filled by `fetch_data` when a response format is set
    pub fn raw_data(&self) -> &[Value] {
        &self.raw_data
    }

    pub fn into_data(self) -> Vec<K::Record> {
        self.job.into_data()
    }

    fn invalid_state(&self, to: JobState) -> AuroraXError {
        AuroraXError::InvalidState {
            from: self.job.state().to_string(),
            to: to.to_string(),
        }
    }

    fn request_url_or(&self, to: JobState) -> Result<String> {
        self.job
            .request_url()
            .map(str::to_string)
            .ok_or_else(|| self.invalid_state(to))
    }

    /// Fail the job and hand back the error that caused it
    fn fail_with(&mut self, err: AuroraXError) -> AuroraXError {
        if !self.job.state().is_terminal() && self.job.mark_failed().is_ok() {
            warn!(
                search = K::NAME,
                request_id = ?self.job.request_id(),
                error = %err,
                "Search failed"
            );
        }
        err
    }

    /// Submit the query
    ///
    /// Validation happens before any network call; a validation error leaves
    /// the job in `Created`. Any transport error or a response other than
    /// 202 with a `Location` header moves the job to `Failed`.
    pub async fn submit(&mut self) -> Result<()> {
        if self.job.state() != JobState::Created {
            return Err(self.invalid_state(JobState::Submitted));
        }

        let payload = K::payload(&self.query)?;
        let url = self.ctx.endpoint(K::SEARCH_PATH);
        let request = ApiRequest::post(url, payload).expecting_empty_body();

        let sent = self.ctx.transport.execute(request).await;
        let response = match sent {
            Ok(r) => r,
            Err(e) => return Err(self.fail_with(e)),
        };

        if response.status_code != 202 {
            let err = AuroraXError::ServiceError {
                status: response.status_code,
                code: None,
                message: "search was not accepted".to_string(),
            };
            return Err(self.fail_with(err));
        }

        let location = match response.location.as_deref() {
            Some(l) => RequestLocation::from_header(&self.ctx.resolve(l)),
            None => Err(DomainError::InvalidRequestShape(
                "202 response carried no Location header".to_string(),
            )),
        };
        let location = match location {
            Ok(l) => l,
            Err(e) => {
                let err = AuroraXError::ServiceError {
                    status: response.status_code,
                    code: None,
                    message: e.to_string(),
                };
                return Err(self.fail_with(err));
            }
        };

        self.job.mark_submitted(location)?;
        info!(
            search = K::NAME,
            request_id = ?self.job.request_id(),
            request_url = ?self.job.request_url(),
            "Search request submitted"
        );
        Ok(())
    }

    /// Refresh status, from the network or from a report fetched elsewhere
    ///
    /// Status and logs are always replaced. A transport error while the job
    /// is in flight fails the job.
    pub async fn poll_status(&mut self, cached: Option<StatusReport>) -> Result<StatusSnapshot> {
        let report = match cached {
            Some(report) => report,
            None => {
                let url = self.request_url_or(JobState::Polling)?;
                let fetched = requests::get_status(&self.ctx, &url).await;
                match fetched {
                    Ok(report) => report,
                    Err(e) if self.job.state().is_in_flight() => return Err(self.fail_with(e)),
                    Err(e) => return Err(e),
                }
            }
        };

        let snapshot = report.snapshot.clone();
        let before = self.job.state();
        let after = self.job.apply_status(report.snapshot, report.logs)?;

        if before != after {
            info!(
                search = K::NAME,
                request_id = ?self.job.request_id(),
                from = %before,
                to = %after,
                "Search state changed"
            );
        }
        Ok(snapshot)
    }

    /// Refresh status and report whether data is ready
    pub async fn check_for_data(&mut self) -> Result<bool> {
        self.poll_status(None).await?;
        Ok(self.job.state() == JobState::Completed)
    }

    /// Poll until the job is Completed or Failed
    ///
    /// Returns immediately on an already Completed job. The first check comes
    /// after `FIRST_FOLLOWUP_SLEEP`, later ones every `poll_interval`. Polling
    /// errors propagate on the first failure.
    pub async fn wait(&mut self, poll_interval: Duration, verbose: bool, abort: &AbortToken) -> Result<JobState> {
        match self.job.state() {
            JobState::Completed => return Ok(JobState::Completed),
            JobState::Submitted | JobState::Polling => {}
            _ => return Err(self.invalid_state(JobState::Polling)),
        }

        sleep_or_abort(self.ctx.sleeper.as_ref(), FIRST_FOLLOWUP_SLEEP, abort).await?;
        loop {
            self.poll_status(None).await?;
            match self.job.state() {
                JobState::Completed => {
                    progress!(verbose, request_id = ?self.job.request_id(), "Data is now available");
                    return Ok(JobState::Completed);
                }
                JobState::Failed => {
                    progress!(verbose, request_id = ?self.job.request_id(), "Search ended in error");
                    return Ok(JobState::Failed);
                }
                _ => {}
            }
            sleep_or_abort(self.ctx.sleeper.as_ref(), poll_interval, abort).await?;
            progress!(verbose, request_id = ?self.job.request_id(), "Checking for data");
        }
    }

    /// Download and deserialize the results
    ///
    /// A no-op on jobs that are not Completed. Errors leave the job Completed
    /// so the call can be retried.
    pub async fn fetch_data(&mut self) -> Result<()> {
        if self.job.state() != JobState::Completed {
            info!(
                search = K::NAME,
                state = %self.job.state(),
                "No data available, search has not completed"
            );
            return Ok(());
        }

        let data_url = self
            .job
            .data_url()
            .map(str::to_string)
            .ok_or_else(|| self.invalid_state(JobState::Completed))?;
        let format = K::response_format(&self.query).cloned();
        let rows = requests::get_data(&self.ctx, &data_url, format.as_ref()).await?;

        if format.is_some() {
            self.raw_data = rows;
        } else {
            let records = K::deserialize_rows(rows)?;
            self.job.store_data(records)?;
        }

        info!(
            search = K::NAME,
            request_id = ?self.job.request_id(),
            records = self.job.data().len() + self.raw_data.len(),
            "Search data retrieved"
        );
        Ok(())
    }

    /// Cancel the search
    ///
    /// With `wait`, keeps refreshing status until the service reports either
    /// a data location or an error condition. Both count as success.
    pub async fn cancel(
        &mut self,
        wait: bool,
        poll_interval: Duration,
        verbose: bool,
        abort: &AbortToken,
    ) -> Result<CancelOutcome> {
        if !self.job.state().is_in_flight() {
            return Err(self.invalid_state(JobState::Cancelled));
        }

        let url = self.request_url_or(JobState::Cancelled)?;
        requests::request_cancel(&self.ctx, &url).await?;
        self.job.mark_cancelled()?;
        info!(search = K::NAME, request_id = ?self.job.request_id(), "Cancellation requested");

        if !wait {
            return Ok(CancelOutcome::Requested);
        }

        loop {
            let report = requests::get_status(&self.ctx, &url).await?;
            let outcome = requests::cancel_outcome(&report);
            self.poll_status(Some(report)).await?;

            if let Some(outcome) = outcome {
                progress!(verbose, request_id = ?self.job.request_id(), outcome = ?outcome, "Cancellation settled");
                return Ok(outcome);
            }
            sleep_or_abort(self.ctx.sleeper.as_ref(), poll_interval, abort).await?;
            progress!(verbose, request_id = ?self.job.request_id(), "Checking for cancellation status");
        }
    }

    /// Submit, wait and fetch in one call
    pub async fn run(&mut self, poll_interval: Duration, verbose: bool, abort: &AbortToken) -> Result<()> {
        self.submit().await?;
        progress!(verbose, request_id = ?self.job.request_id(), "Waiting for data");

        if self.wait(poll_interval, verbose, abort).await? == JobState::Failed {
            return Err(AuroraXError::SearchFailed {
                request_id: self.job.request_id().unwrap_or_default().to_string(),
                summary: self
                    .job
                    .last_log_summary()
                    .unwrap_or("error condition reported")
                    .to_string(),
            });
        }

        self.fetch_data().await?;
        if let Some(status) = self.job.status() {
            progress!(
                verbose,
                request_id = ?self.job.request_id(),
                result_count = status.result_count,
                result_byte_size = status.result_byte_size,
                "Search complete"
            );
        }
        Ok(())
    }

    /// SQL-like description of this job's query
    pub async fn describe(&self) -> Result<String> {
        requests::describe::<K>(&self.ctx, &self.query).await
    }
}
