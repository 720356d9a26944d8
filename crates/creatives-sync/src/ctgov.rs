//! ClinicalTrials.gov v2 client for pulling study descriptions and eligibility.

use std::time::Duration;

use async_trait::async_trait;
use creatives_core::{CoreError, Study, TrialSummary};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{info, warn};

pub const CTGOV_BASE_URL: &str = "https://clinicaltrials.gov/api/v2";

/// Study modules a [`TrialSummary`] is built from.
pub const SUMMARY_FIELDS: [&str; 3] = [
    "protocolSection.identificationModule",
    "protocolSection.descriptionModule",
    "protocolSection.eligibilityModule",
];

#[derive(Error, Debug)]
pub enum CtGovError {
    #[error("no study found for {0}")]
    NotFound(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<CtGovError> },
    #[error(transparent)]
    Trial(#[from] CoreError),
}

impl CtGovError {
    /// Transport and server failures are retried; a missing study or an
    /// unusable document never is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Server { .. })
    }
}

/// Exponential backoff: wait `multiplier * 2^(attempt-1)`, clamped to
/// `[min_wait, max_wait]`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            multiplier: Duration::from_secs(1),
            min_wait: Duration::from_secs(4),
            max_wait: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Retry immediately, for tests and local mirrors.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            multiplier: Duration::ZERO,
            min_wait: Duration::ZERO,
            max_wait: Duration::ZERO,
        }
    }

    /// Wait before the next attempt, given `attempt` attempts so far.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.multiplier
            .saturating_mul(exp)
            .clamp(self.min_wait, self.max_wait)
    }
}

/// Anything that can produce a trial summary for an NCT id.
#[async_trait]
pub trait TrialSource: Send + Sync {
    async fn trial_summary(&self, nct_id: &str) -> Result<TrialSummary, CtGovError>;
}

pub struct CtGovClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl Default for CtGovClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CtGovClient {
    pub fn new() -> Self {
        Self::with_base_url(CTGOV_BASE_URL)
    }

    /// `base_url` should be like `https://clinicaltrials.gov/api/v2`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch a study, optionally restricted to `fields`.
    pub async fn get_study(&self, nct_id: &str, fields: &[&str]) -> Result<Study, CtGovError> {
        let url = format!("{}/studies/{}", self.base_url, nct_id);
        let mut query = vec![("format", "json".to_string())];
        if !fields.is_empty() {
            query.push(("fields", fields.join("|")));
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch_once(nct_id, &url, &query).await {
                Ok(body) => return Ok(serde_json::from_str(&body)?),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= self.retry.max_attempts => {
                    return Err(CtGovError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    let wait = self.retry.delay(attempt);
                    warn!(nct_id, attempt, wait_ms = wait.as_millis() as u64, error = %e, "retrying study fetch");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    async fn fetch_once(
        &self,
        nct_id: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<String, CtGovError> {
        info!(url, "fetching study from ClinicalTrials.gov");
        let resp = self.client.get(url).query(query).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CtGovError::NotFound(nct_id.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CtGovError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl TrialSource for CtGovClient {
    async fn trial_summary(&self, nct_id: &str) -> Result<TrialSummary, CtGovError> {
        let study = self.get_study(nct_id, &SUMMARY_FIELDS).await?;
        let summary = TrialSummary::from_study(nct_id, &study)?;
        info!(nct_id = %summary.nct_id, "loaded trial summary");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay(1), Duration::from_secs(4));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(3), Duration::from_secs(4));
        assert_eq!(policy.delay(4), Duration::from_secs(8));
        assert_eq!(policy.delay(6), Duration::from_secs(32));
        assert_eq!(policy.delay(7), Duration::from_secs(60));
        assert_eq!(policy.delay(40), Duration::from_secs(60));
    }

    #[test]
    fn immediate_policy_never_waits() {
        let policy = RetryPolicy::immediate(3);
        assert_eq!(policy.delay(1), Duration::ZERO);
        assert_eq!(policy.delay(10), Duration::ZERO);
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = CtGovClient::with_base_url("https://clinicaltrials.gov/api/v2/");
        assert_eq!(client.base_url, "https://clinicaltrials.gov/api/v2");
    }

    #[test]
    fn retryable_errors() {
        assert!(!CtGovError::NotFound("NCT1".into()).is_retryable());
        assert!(
            CtGovError::Server {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!CtGovError::Trial(CoreError::IncompleteTrial("NCT1".into())).is_retryable());
    }

    #[tokio::test]
    async fn unreachable_host_exhausts_retries() {
        let client =
            CtGovClient::with_base_url("http://127.0.0.1:1").with_retry(RetryPolicy::immediate(2));
        let err = client.get_study("NCT06585670", &[]).await.unwrap_err();
        match err {
            CtGovError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, CtGovError::Http(_)));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    use crate::graphql::tests::spawn_server;

    const STUDY: &str = r#"{
        "protocolSection": {
            "identificationModule": {"nctId": "NCT06585670", "briefTitle": "Once-weekly Insulin"},
            "descriptionModule": {"briefSummary": "A once-weekly insulin study."},
            "eligibilityModule": {"eligibilityCriteria": "Type 2 diabetes", "sex": "ALL"}
        }
    }"#;

    #[tokio::test]
    async fn not_found_is_never_retried() {
        let (base, captured) = spawn_server("404 Not Found", r#"{"message": "not found"}"#).await;
        let client = CtGovClient::with_base_url(base).with_retry(RetryPolicy::immediate(3));

        let err = client.get_study("NCT00000000", &[]).await.unwrap_err();

        assert!(matches!(err, CtGovError::NotFound(id) if id == "NCT00000000"));
        assert_eq!(captured.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn server_errors_retry_until_exhausted() {
        let (base, captured) = spawn_server("503 Service Unavailable", "busy").await;
        let client = CtGovClient::with_base_url(base).with_retry(RetryPolicy::immediate(3));

        let err = client.get_study("NCT06585670", &[]).await.unwrap_err();

        match err {
            CtGovError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, CtGovError::Server { status: 503, .. }));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(captured.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn trial_summary_requests_summary_fields() {
        let (base, captured) = spawn_server("200 OK", STUDY).await;
        let client = CtGovClient::with_base_url(base);

        let summary = client.trial_summary("NCT06585670").await.unwrap();
        assert_eq!(summary.brief_summary, "A once-weekly insulin study.");
        assert_eq!(summary.eligibility, "Type 2 diabetes\nSex: ALL");

        let requests = captured.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request_line = requests[0].lines().next().unwrap();
        assert!(request_line.starts_with("GET /studies/NCT06585670?format=json&fields="));
        assert!(request_line.contains(
            "protocolSection.identificationModule%7CprotocolSection.descriptionModule%7CprotocolSection.eligibilityModule"
        ));
    }
}
