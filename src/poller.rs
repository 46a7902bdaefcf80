//! Task polling.
//!
//! # States
//! ```text
//! pending ──(fetch, still running)──▶ pending      (sleep interval, next attempt)
//! pending ──(task_status = succeed)──▶ succeed     (first image URL)
//! pending ──(task_status = failed)───▶ failed      (vendor message)
//! pending ──(max_attempts exhausted)─▶ timeout
//! ```
//!
//! # Design Decisions
//! - The first fetch is immediate; later fetches wait `interval`
//! - Attempt N+1 is scheduled only after attempt N has completed
//! - Transport errors end polling; only a pending task is retried
//! - No cancel handle: dropping the future is the only way out

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::client::ClientError;
use crate::config::PollerConfig;
use crate::observability::metrics;
use crate::upstream::{JobKind, TaskEnvelope, TaskState};

/// Fallback message when the vendor gives none.
pub const GENERATION_FAILED: &str = "generation failed";

/// Anything that can report a task's status.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn fetch_task(&self, kind: JobKind, task_id: &str) -> Result<TaskEnvelope, ClientError>;
}

#[async_trait]
impl<T: TaskSource + ?Sized> TaskSource for &T {
    async fn fetch_task(&self, kind: JobKind, task_id: &str) -> Result<TaskEnvelope, ClientError> {
        (**self).fetch_task(kind, task_id).await
    }
}

/// Terminal polling outcomes other than success.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("generation timed out")]
    Timeout { attempts: u32 },

    #[error("{0}")]
    Failed(String),

    #[error("no image result returned")]
    MissingResult,

    #[error("response carried no task data")]
    MissingTask,

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl PollError {
    fn outcome(&self) -> &'static str {
        match self {
            PollError::Timeout { .. } => "timeout",
            PollError::Failed(_) => "failed",
            PollError::MissingResult => "missing_result",
            PollError::MissingTask => "missing_task",
            PollError::Client(_) => "network",
        }
    }
}

/// Result of inspecting one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Task still running.
    Pending(TaskState),
    /// Task finished with this image URL.
    Done(String),
}

/// Classify one status response.
pub fn classify(envelope: &TaskEnvelope) -> Result<PollStep, PollError> {
    if !envelope.is_ok() {
        return Err(PollError::Failed(non_empty_or_default(Some(&envelope.message))));
    }
    let data = envelope.data.as_ref().ok_or(PollError::MissingTask)?;

    match data.task_status {
        TaskState::Succeed => data
            .first_image_url()
            .map(|url| PollStep::Done(url.to_string()))
            .ok_or(PollError::MissingResult),
        TaskState::Failed => Err(PollError::Failed(non_empty_or_default(
            data.task_status_msg.as_ref(),
        ))),
        state => Ok(PollStep::Pending(state)),
    }
}

/// Task id from a submission response.
pub fn submitted_task_id(envelope: &TaskEnvelope) -> Result<String, PollError> {
    if !envelope.is_ok() {
        return Err(PollError::Failed(non_empty_or_default(Some(&envelope.message))));
    }
    envelope
        .data
        .as_ref()
        .map(|data| data.task_id.clone())
        .filter(|id| !id.is_empty())
        .ok_or(PollError::MissingTask)
}

fn non_empty_or_default(message: Option<&String>) -> String {
    message
        .filter(|m| !m.is_empty())
        .cloned()
        .unwrap_or_else(|| GENERATION_FAILED.to_string())
}

/// Polls a task at a fixed interval until it finishes or attempts run out.
pub struct TaskPoller<S> {
    source: S,
    interval: Duration,
    max_attempts: u32,
}

impl<S: TaskSource> TaskPoller<S> {
    pub fn new(source: S, config: &PollerConfig) -> Self {
        Self::with_schedule(source, Duration::from_millis(config.interval_ms), config.max_attempts)
    }

    pub fn with_schedule(source: S, interval: Duration, max_attempts: u32) -> Self {
        Self {
            source,
            interval,
            max_attempts,
        }
    }

    /// Poll `task_id` until it yields an image URL.
    pub async fn wait(&self, kind: JobKind, task_id: &str) -> Result<String, PollError> {
        let result = self.run(kind, task_id).await;
        match &result {
            Ok(url) => {
                metrics::record_poll_outcome("succeed");
                tracing::info!(task_id, url = %url, "Task succeeded");
            }
            Err(e) => {
                metrics::record_poll_outcome(e.outcome());
                tracing::warn!(task_id, error = %e, "Task did not produce an image");
            }
        }
        result
    }

    async fn run(&self, kind: JobKind, task_id: &str) -> Result<String, PollError> {
        for attempt in 1..=self.max_attempts {
            metrics::record_poll_attempt();
            let envelope = self.source.fetch_task(kind, task_id).await?;

            match classify(&envelope)? {
                PollStep::Done(url) => return Ok(url),
                PollStep::Pending(state) => {
                    tracing::debug!(task_id, attempt, state = ?state, "Task pending");
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.interval).await;
                    }
                }
            }
        }

        Err(PollError::Timeout {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{TaskData, TaskImage, TaskResult};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    fn envelope(state: TaskState, url: Option<&str>, msg: Option<&str>) -> TaskEnvelope {
        TaskEnvelope {
            code: 0,
            message: "SUCCEED".into(),
            request_id: None,
            data: Some(TaskData {
                task_id: "task-1".into(),
                task_status: state,
                task_status_msg: msg.map(Into::into),
                created_at: None,
                updated_at: None,
                task_result: url.map(|u| TaskResult {
                    images: vec![TaskImage {
                        index: 0,
                        url: u.into(),
                    }],
                }),
            }),
        }
    }

    /// Replays a script of responses; the last one repeats.
    struct Scripted {
        script: Mutex<Vec<TaskEnvelope>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(mut script: Vec<TaskEnvelope>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TaskSource for Scripted {
        async fn fetch_task(&self, _kind: JobKind, _task_id: &str) -> Result<TaskEnvelope, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            let next = if script.len() > 1 {
                script.pop().unwrap()
            } else {
                script[0].clone()
            };
            Ok(next)
        }
    }

    fn poller(source: &Scripted) -> TaskPoller<&Scripted> {
        TaskPoller::new(source, &PollerConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeed_yields_url() {
        let source = Scripted::new(vec![
            envelope(TaskState::Submitted, None, None),
            envelope(TaskState::Processing, None, None),
            envelope(TaskState::Succeed, Some("https://cdn/knot.png"), None),
        ]);
        let start = Instant::now();

        let url = poller(&source).wait(JobKind::Generate, "task-1").await.unwrap();

        assert_eq!(url, "https://cdn/knot.png");
        assert_eq!(source.calls(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_forever_times_out() {
        let source = Scripted::new(vec![envelope(TaskState::Processing, None, None)]);
        let start = Instant::now();

        let err = poller(&source).wait(JobKind::Generate, "task-1").await.unwrap_err();

        assert!(matches!(err, PollError::Timeout { attempts: 30 }));
        assert_eq!(err.to_string(), "generation timed out");
        assert_eq!(source.calls(), 30);
        assert_eq!(start.elapsed(), Duration::from_secs(58));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_surfaces_vendor_message() {
        let source = Scripted::new(vec![
            envelope(TaskState::Processing, None, None),
            envelope(TaskState::Failed, None, Some("content policy")),
        ]);

        let err = poller(&source).wait(JobKind::Generate, "task-1").await.unwrap_err();
        assert_eq!(err.to_string(), "content policy");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_without_message_uses_default() {
        let source = Scripted::new(vec![envelope(TaskState::Failed, None, None)]);
        let err = poller(&source).wait(JobKind::Expand, "task-1").await.unwrap_err();
        assert_eq!(err.to_string(), GENERATION_FAILED);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeed_without_url() {
        let source = Scripted::new(vec![envelope(TaskState::Succeed, None, None)]);
        let err = poller(&source).wait(JobKind::Generate, "task-1").await.unwrap_err();
        assert!(matches!(err, PollError::MissingResult));
    }

    #[tokio::test(start_paused = true)]
    async fn test_vendor_error_code_stops_polling() {
        let mut rejected = envelope(TaskState::Processing, None, None);
        rejected.code = 1201;
        rejected.message = "task not found".into();
        let source = Scripted::new(vec![rejected]);

        let err = poller(&source).wait(JobKind::Generate, "task-1").await.unwrap_err();
        assert_eq!(err.to_string(), "task not found");
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn test_submitted_task_id() {
        let env = envelope(TaskState::Submitted, None, None);
        assert_eq!(submitted_task_id(&env).unwrap(), "task-1");

        let mut rejected = env.clone();
        rejected.code = 1000;
        rejected.message = String::new();
        assert_eq!(submitted_task_id(&rejected).unwrap_err().to_string(), GENERATION_FAILED);

        let mut empty = env;
        empty.data = None;
        assert!(matches!(submitted_task_id(&empty), Err(PollError::MissingTask)));
    }
}
