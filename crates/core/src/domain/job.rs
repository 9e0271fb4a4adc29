// Search Job Domain Model
//
// Pure state machine for one submitted search request. Network effects live in
// `application::search_job`; this type only records what happened.

use crate::domain::error::{DomainError, Result};
use crate::domain::status::{LogEntry, StatusSnapshot};
use serde::{Deserialize, Serialize};

/// Job lifecycle state
///
/// `Created -> Submitted -> Polling -> Completed | Cancelled | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Created,
    Submitted,
    Polling,
    Completed,
    Cancelled,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Cancelled | JobState::Failed)
    }

    /// Submitted or Polling
    pub fn is_in_flight(&self) -> bool {
        matches!(self, JobState::Submitted | JobState::Polling)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Created => write!(f, "CREATED"),
            JobState::Submitted => write!(f, "SUBMITTED"),
            JobState::Polling => write!(f, "POLLING"),
            JobState::Completed => write!(f, "COMPLETED"),
            JobState::Cancelled => write!(f, "CANCELLED"),
            JobState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Where the service placed an accepted request
///
/// Id and URL are assigned together, so they travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLocation {
    pub request_id: String,
    pub request_url: String,
}

impl RequestLocation {
    /// Build from the `Location` header of a 202 response
    ///
    /// The request id is the last non-empty path segment. Query string and
    /// fragment are dropped.
    pub fn from_header(location: &str) -> Result<Self> {
        let path = location.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim().trim_end_matches('/');
        let request_id = trimmed
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                DomainError::InvalidRequestShape(format!(
                    "location header '{}' carries no request id",
                    location
                ))
            })?;
        Ok(Self {
            request_id: request_id.to_string(),
            request_url: trimmed.to_string(),
        })
    }

    pub fn data_url(&self) -> String {
        format!("{}/data", self.request_url)
    }
}

/// Job Entity
///
/// Generic over the record type produced by the search kind.
#[derive(Debug, Clone)]
pub struct Job<R> {
    state: JobState,
    location: Option<RequestLocation>,
    data_url: Option<String>,
    status: Option<StatusSnapshot>,
    logs: Vec<LogEntry>,
    data: Vec<R>,
}

impl<R> Default for Job<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Job<R> {
    pub fn new() -> Self {
        Self {
            state: JobState::Created,
            location: None,
            data_url: None,
            status: None,
            logs: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn request_id(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.request_id.as_str())
    }

    pub fn request_url(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.request_url.as_str())
    }

    pub fn location(&self) -> Option<&RequestLocation> {
        self.location.as_ref()
    }

    pub fn data_url(&self) -> Option<&str> {
        self.data_url.as_deref()
    }

    pub fn status(&self) -> Option<&StatusSnapshot> {
        self.status.as_ref()
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn data(&self) -> &[R] {
        &self.data
    }

    pub fn into_data(self) -> Vec<R> {
        self.data
    }

    fn transition_error(&self, to: JobState) -> DomainError {
        DomainError::InvalidStateTransition {
            from: self.state.to_string(),
            to: to.to_string(),
        }
    }

    /// Transition Created -> Submitted
    pub fn mark_submitted(&mut self, location: RequestLocation) -> Result<()> {
        if self.state != JobState::Created {
            return Err(self.transition_error(JobState::Submitted));
        }
        self.location = Some(location);
        self.state = JobState::Submitted;
        Ok(())
    }

    /// Transition Created | Submitted | Polling -> Failed
    pub fn mark_failed(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(self.transition_error(JobState::Failed));
        }
        self.state = JobState::Failed;
        Ok(())
    }

    /// Transition Submitted | Polling -> Cancelled
    pub fn mark_cancelled(&mut self) -> Result<()> {
        if !self.state.is_in_flight() {
            return Err(self.transition_error(JobState::Cancelled));
        }
        self.state = JobState::Cancelled;
        Ok(())
    }

    /// Apply a fresh status snapshot
    ///
    /// Status and logs are replaced wholesale. While in flight the snapshot
    /// drives the state: a data location completes the job, an error
    /// condition without data fails it, anything else keeps it polling.
    /// Terminal jobs only record the snapshot.
    pub fn apply_status(&mut self, snapshot: StatusSnapshot, logs: Vec<LogEntry>) -> Result<JobState> {
        if self.state == JobState::Created {
            return Err(self.transition_error(JobState::Polling));
        }

        if self.state.is_in_flight() {
            self.state = if snapshot.has_data() {
                self.data_url = self.location.as_ref().map(RequestLocation::data_url);
                JobState::Completed
            } else if snapshot.error_condition {
                JobState::Failed
            } else {
                JobState::Polling
            };
        }

        self.status = Some(snapshot);
        self.logs = logs;
        Ok(self.state)
    }

    /// Store fetched rows; only valid once Completed
    pub fn store_data(&mut self, rows: Vec<R>) -> Result<()> {
        if self.state != JobState::Completed {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: "DATA_STORED".to_string(),
            });
        }
        self.data = rows;
        Ok(())
    }

    /// Summary of the most recent server log line, if any
    pub fn last_log_summary(&self) -> Option<&str> {
        self.logs.last().map(|l| l.summary.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitted() -> Job<u32> {
        let mut job = Job::new();
        job.mark_submitted(
            RequestLocation::from_header("https://svc/api/v1/ephemeris/requests/abc123").unwrap(),
        )
        .unwrap();
        job
    }

    #[test]
    fn test_request_location_from_header() {
        let loc = RequestLocation::from_header("https://svc/requests/abc123").unwrap();
        assert_eq!(loc.request_id, "abc123");
        assert_eq!(loc.request_url, "https://svc/requests/abc123");
        assert_eq!(loc.data_url(), "https://svc/requests/abc123/data");

        let loc = RequestLocation::from_header("https://svc/requests/abc123/").unwrap();
        assert_eq!(loc.request_id, "abc123");

        assert!(RequestLocation::from_header("").is_err());
    }

    #[test]
    fn test_request_location_drops_query_and_fragment() {
        let loc = RequestLocation::from_header("https://svc/requests/abc123?x=1#frag").unwrap();
        assert_eq!(loc.request_id, "abc123");
        assert_eq!(loc.request_url, "https://svc/requests/abc123");
        assert_eq!(loc.data_url(), "https://svc/requests/abc123/data");

        let loc = RequestLocation::from_header("https://svc/requests/abc123/#top").unwrap();
        assert_eq!(loc.request_id, "abc123");

        assert!(RequestLocation::from_header("?only=query").is_err());
    }

    #[test]
    fn test_new_job_is_empty() {
        let job: Job<u32> = Job::new();
        assert_eq!(job.state(), JobState::Created);
        assert!(job.request_id().is_none());
        assert!(job.request_url().is_none());
        assert!(job.data_url().is_none());
        assert!(job.data().is_empty());
    }

    #[test]
    fn test_submit_only_from_created() {
        let mut job = submitted();
        assert_eq!(job.state(), JobState::Submitted);
        assert_eq!(job.request_id(), Some("abc123"));

        let err = job
            .mark_submitted(RequestLocation::from_header("https://svc/x/def").unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidStateTransition {
                from: "SUBMITTED".to_string(),
                to: "SUBMITTED".to_string(),
            }
        );
        assert_eq!(job.request_id(), Some("abc123"));
    }

    #[test]
    fn test_polling_then_completed() {
        let mut job = submitted();

        assert_eq!(job.apply_status(StatusSnapshot::pending(), vec![]).unwrap(), JobState::Polling);
        assert_eq!(job.apply_status(StatusSnapshot::pending(), vec![]).unwrap(), JobState::Polling);
        assert!(job.data_url().is_none());

        let state = job.apply_status(StatusSnapshot::ready("/x", 3, 100), vec![]).unwrap();
        assert_eq!(state, JobState::Completed);
        assert_eq!(
            job.data_url(),
            Some("https://svc/api/v1/ephemeris/requests/abc123/data")
        );
    }

    #[test]
    fn test_error_condition_fails_job() {
        let mut job = submitted();
        let state = job.apply_status(StatusSnapshot::errored(), vec![]).unwrap();
        assert_eq!(state, JobState::Failed);
        assert!(job.data_url().is_none());
    }

    #[test]
    fn test_logs_replaced_not_appended() {
        let mut job = submitted();
        let log = |s: &str| LogEntry {
            level: "info".to_string(),
            summary: s.to_string(),
            timestamp: None,
        };

        job.apply_status(StatusSnapshot::pending(), vec![log("a"), log("b")]).unwrap();
        job.apply_status(StatusSnapshot::pending(), vec![log("c")]).unwrap();

        assert_eq!(job.logs().len(), 1);
        assert_eq!(job.last_log_summary(), Some("c"));
    }

    #[test]
    fn test_cancelled_job_keeps_state_on_refresh() {
        let mut job = submitted();
        job.mark_cancelled().unwrap();

        let state = job.apply_status(StatusSnapshot::ready("/x", 1, 1), vec![]).unwrap();
        assert_eq!(state, JobState::Cancelled);
        assert!(job.data_url().is_none());
        assert_eq!(job.status(), Some(&StatusSnapshot::ready("/x", 1, 1)));
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let mut job = submitted();
        job.apply_status(StatusSnapshot::ready("/x", 1, 1), vec![]).unwrap();

        assert!(job.mark_cancelled().is_err());
        assert!(job.mark_failed().is_err());
        assert_eq!(job.state(), JobState::Completed);
    }

    #[test]
    fn test_status_rejected_before_submit() {
        let mut job: Job<u32> = Job::new();
        assert!(job.apply_status(StatusSnapshot::pending(), vec![]).is_err());
        assert!(job.status().is_none());
    }

    #[test]
    fn test_store_data_requires_completed() {
        let mut job = submitted();
        assert!(job.store_data(vec![1, 2]).is_err());
        assert!(job.data().is_empty());

        job.apply_status(StatusSnapshot::ready("/x", 2, 1), vec![]).unwrap();
        job.store_data(vec![1, 2]).unwrap();
        assert_eq!(job.data(), &[1, 2]);
    }
}
