use indexwatch_core::{JobKey, JobStatus, RuleSummary};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("session is no longer authorized")]
    Unauthorized,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server returned http status {status}")]
    Status { status: u16 },
    #[error("operation failed: {0}")]
    Operation(String),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}

/// Calls the job tracking core makes against the server.
#[async_trait::async_trait]
pub trait JobClient: Send + Sync {
    async fn fetch_job_status(&self, job_key: &JobKey) -> Result<JobStatus, ClientError>;

    async fn pause_job(&self, job_key: &JobKey) -> Result<(), ClientError>;

    async fn resume_job(&self, job_key: &JobKey) -> Result<(), ClientError>;

    async fn fetch_rule_summary(&self, document_id: &str) -> Result<RuleSummary, ClientError>;
}
