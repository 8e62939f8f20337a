use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::api_client::{ApiClient, ClientError, ProcessingStatus, ResumeStatus};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Anything that can report the status of a resume.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, id: Uuid) -> Result<ResumeStatus, ClientError>;
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn fetch_status(&self, id: Uuid) -> Result<ResumeStatus, ClientError> {
        self.status(id).await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(ResumeStatus),
    Failed(ResumeStatus),
    /// The budget ran out while the resume was still processing. Not an
    /// error; the server keeps working and a later poll may succeed.
    Exhausted {
        last: Option<ResumeStatus>,
        attempts: u32,
    },
}

impl PollOutcome {
    /// The most recent status observed, terminal or not.
    pub fn last_known(&self) -> Option<&ResumeStatus> {
        match self {
            PollOutcome::Completed(status) | PollOutcome::Failed(status) => Some(status),
            PollOutcome::Exhausted { last, .. } => last.as_ref(),
        }
    }
}

/// Polls until the resume reaches a terminal state or the attempt budget is
/// spent. Each attempt waits one interval and then issues a single fetch;
/// a fetch error ends polling.
///
/// Dropping the returned future stops observation without affecting the
/// server-side analysis.
pub async fn poll_until_terminal<S>(
    source: &S,
    id: Uuid,
    config: PollConfig,
) -> Result<PollOutcome, ClientError>
where
    S: StatusSource + ?Sized,
{
    let mut last = None;

    for attempt in 1..=config.max_attempts {
        tokio::time::sleep(config.interval).await;

        let status = source.fetch_status(id).await?;
        debug!(
            "Poll attempt {attempt}/{}: resume {id} is {:?}",
            config.max_attempts, status.processing_status
        );

        match status.processing_status {
            ProcessingStatus::Completed => return Ok(PollOutcome::Completed(status)),
            ProcessingStatus::Failed => return Ok(PollOutcome::Failed(status)),
            ProcessingStatus::Processing => last = Some(status),
        }
    }

    Ok(PollOutcome::Exhausted {
        last,
        attempts: config.max_attempts,
    })
}
