//! Long-poll driver for a submitted task
//!
//! A [`TaskPoller`] queries task status at a fixed interval until the task is
//! `completed` or `failed`, the poll ceiling is reached, or the caller cancels.
//! It knows nothing about HTTP: status comes from any [`StatusFetcher`].
//!
//! # Example
//!
//! ```no_run
//! use timetable_client::{Config, SubmissionClient, TaskHandle, TaskPoller, TaskStatus};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> timetable_client::Result<()> {
//! let client = SubmissionClient::new(Config::default())?;
//! let poller = TaskPoller::from_config(&client.config().polling);
//! let cancel = CancellationToken::new();
//!
//! let mut on_progress = |_: &TaskStatus, text: Option<&str>| {
//!     if let Some(text) = text {
//!         println!("{text}");
//!     }
//! };
//! let done = poller
//!     .poll_until_done(&TaskHandle::new("42"), &client, &mut on_progress, &cancel)
//!     .await?;
//! println!("finished: {}", done.status);
//! # Ok(())
//! # }
//! ```

use crate::config::PollingConfig;
use crate::error::{Error, PollingError, Result, TransportError};
use crate::progress::ProgressSink;
use crate::types::{PollState, TaskHandle, TaskState, TaskStatus};
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Anything that can report the status of a task
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    /// Query the current status of `task` once
    async fn fetch_status(
        &self,
        task: &TaskHandle,
    ) -> std::result::Result<TaskStatus, TransportError>;
}

/// Fixed-interval poller with a query ceiling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskPoller {
    interval: Duration,
    max_polls: u32,
}

impl Default for TaskPoller {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}

impl TaskPoller {
    /// Poller that waits `interval` between queries and gives up after `max_polls` queries
    ///
    /// A ceiling of 0 times out before the first query.
    pub fn new(interval: Duration, max_polls: u32) -> Self {
        Self {
            interval,
            max_polls,
        }
    }

    /// Poller using the interval and ceiling from configuration
    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(config.interval, config.max_polls)
    }

    /// Delay between queries
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Maximum number of queries per run
    pub fn max_polls(&self) -> u32 {
        self.max_polls
    }

    /// Drive `task` to a terminal status
    ///
    /// Queries are strictly sequential and `interval` apart. `sink` sees every
    /// answer, terminal ones included, together with the latest progress text.
    ///
    /// Ends with:
    /// - `Ok(status)` once the task reports `completed`
    /// - [`Error::TaskFailed`] with the server's message once it reports `failed`
    /// - [`Error::Polling`] on the first transport failure (never retried)
    /// - [`Error::Timeout`] after `max_polls` queries without a terminal status
    /// - [`Error::Cancelled`] as soon as `cancel` is observed; an in-flight
    ///   query is allowed to finish but its answer is dropped
    pub async fn poll_until_done<F, S>(
        &self,
        task: &TaskHandle,
        fetcher: &F,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> Result<TaskStatus>
    where
        F: StatusFetcher + ?Sized,
        S: ProgressSink + ?Sized,
    {
        let mut run = PollRun::new(task);
        tracing::debug!(
            task_id = %task,
            interval = ?self.interval,
            max_polls = self.max_polls,
            "polling task"
        );

        loop {
            if cancel.is_cancelled() {
                return Err(run.abort());
            }
            if run.polls >= self.max_polls {
                return Err(run.time_out());
            }

            run.polls += 1;
            let result = fetcher.fetch_status(task).await;
            if cancel.is_cancelled() {
                return Err(run.abort());
            }

            let status = result.map_err(|source| run.transport_failed(source))?;
            if let Some(progress) = &status.progress {
                run.latest_progress = Some(progress.clone());
            }
            tracing::debug!(
                task_id = %task,
                poll = run.polls,
                status = %status.status,
                progress = run.latest_progress.as_deref().unwrap_or(""),
                "task status"
            );
            sink.on_progress(&status, run.latest_progress.as_deref());

            match status.status {
                TaskState::Completed => {
                    run.transition(PollState::Completed);
                    return Ok(status);
                }
                TaskState::Failed => {
                    let message = status
                        .error
                        .clone()
                        .unwrap_or_else(|| "task failed".to_string());
                    return Err(run.task_failed(message));
                }
                TaskState::Pending | TaskState::Running => {}
            }

            if run.polls >= self.max_polls {
                return Err(run.time_out());
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(run.abort()),
                _ = tokio::time::sleep(self.interval) => run.waited += self.interval,
            }
        }
    }
}

/// Bookkeeping for one `poll_until_done` call
struct PollRun<'a> {
    task: &'a TaskHandle,
    state: PollState,
    polls: u32,
    waited: Duration,
    latest_progress: Option<String>,
}

impl<'a> PollRun<'a> {
    fn new(task: &'a TaskHandle) -> Self {
        Self {
            task,
            state: PollState::Polling,
            polls: 0,
            waited: Duration::ZERO,
            latest_progress: None,
        }
    }

    fn transition(&mut self, to: PollState) {
        debug_assert!(!self.state.is_terminal(), "poll run already finished");
        self.state = to;
        match to {
            PollState::Completed => {
                tracing::info!(task_id = %self.task, polls = self.polls, "task completed")
            }
            PollState::Aborted => {
                tracing::info!(task_id = %self.task, polls = self.polls, "polling cancelled")
            }
            PollState::Failed | PollState::TimedOut => {
                tracing::warn!(task_id = %self.task, polls = self.polls, state = ?to, "polling ended")
            }
            PollState::Polling => {}
        }
    }

    fn abort(&mut self) -> Error {
        self.transition(PollState::Aborted);
        Error::Cancelled {
            task_id: self.task.clone(),
            polls: self.polls,
        }
    }

    fn transport_failed(&mut self, source: TransportError) -> Error {
        tracing::warn!(task_id = %self.task, error = %source, "status check failed");
        self.transition(PollState::Failed);
        Error::Polling(PollingError {
            task_id: self.task.clone(),
            source,
        })
    }

    fn task_failed(&mut self, message: String) -> Error {
        tracing::warn!(task_id = %self.task, error = %message, "task reported failure");
        self.transition(PollState::Failed);
        Error::TaskFailed {
            task_id: self.task.clone(),
            message,
        }
    }

    fn time_out(&mut self) -> Error {
        self.transition(PollState::TimedOut);
        Error::Timeout {
            task_id: self.task.clone(),
            polls: self.polls,
            waited: self.waited,
        }
    }
}
