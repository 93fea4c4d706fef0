//! # timetable-client
//!
//! Async client for a timetable optimizer's upload-and-poll workflow.
//!
//! ## Design Philosophy
//!
//! timetable-client is designed to be:
//! - **Validate first** - Bad inputs are rejected locally, before any request
//! - **Sensible defaults** - Endpoints, poll interval and ceiling work out of the box
//! - **Library-first** - No CLI or UI, progress goes to whatever [`ProgressSink`] you plug in
//! - **Cancellable** - Every poll run honours a `CancellationToken`
//!
//! ## Quick Start
//!
//! ```no_run
//! use timetable_client::{
//!     Config, LoadingOverlay, OverlayConfig, SourceFile, SubmissionClient, SubmissionSession,
//!     TaskPoller, Toggle, UploadFile,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SubmissionClient::new(Config::default())?;
//!     let mut session = SubmissionSession::new();
//!
//!     for (file, path) in [
//!         (SourceFile::Courses, "courses.csv"),
//!         (SourceFile::Faculty, "faculty.csv"),
//!         (SourceFile::Students, "students.xlsx"),
//!     ] {
//!         let upload = UploadFile::from_path(path).await?;
//!         let diff = session.load_preview(&client, file, upload).await?;
//!         if !diff.is_clean() {
//!             println!("{file}: missing {:?}", diff.missing);
//!         }
//!     }
//!     session.set_toggle(Toggle::SameDay, true);
//!
//!     let mut overlay = LoadingOverlay::new(OverlayConfig::timetable_generation());
//!     let poller = TaskPoller::from_config(&client.config().polling);
//!     let status = session
//!         .run(&client, &poller, &mut overlay, &CancellationToken::new())
//!         .await?;
//!     println!("timetable ready: {}", status.status);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP client for the optimizer endpoints
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Task-status polling
pub mod poller;
/// Progress sinks and the loading overlay
pub mod progress;
/// Submission session controller
pub mod session;
/// Core types
pub mod types;
/// Upload files, bundles and column mappings
pub mod upload;

// Re-export commonly used types
pub use client::SubmissionClient;
pub use config::{Config, EndpointConfig, PollingConfig};
pub use error::{
    Error, FileIssue, FileProblem, PollingError, Result, SubmissionError, TransportError,
    ValidationError,
};
pub use poller::{StatusFetcher, TaskPoller};
pub use progress::{LoadingOverlay, NoProgress, OverlayConfig, OverlayState, OverlayView, ProgressSink};
pub use session::SubmissionSession;
pub use types::{PollState, SourceFile, TaskHandle, TaskState, TaskStatus, Toggle};
pub use upload::{ColumnDiff, ColumnMapping, PreviewResponse, Row, UploadBundle, UploadFile};

use tokio_util::sync::CancellationToken;

/// Run `session` and cancel polling when the process receives a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with a Ctrl+C fallback if registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// The run ends with [`Error::Cancelled`] when interrupted while polling.
///
/// # Example
///
/// ```no_run
/// use timetable_client::{Config, NoProgress, SubmissionClient, SubmissionSession, TaskPoller, run_until_interrupted};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = SubmissionClient::new(Config::default())?;
///     let session = SubmissionSession::new();
///     let poller = TaskPoller::default();
///
///     run_until_interrupted(&session, &client, &poller, &mut NoProgress).await?;
///     Ok(())
/// }
/// ```
pub async fn run_until_interrupted<S>(
    session: &SubmissionSession,
    client: &SubmissionClient,
    poller: &TaskPoller,
    sink: &mut S,
) -> Result<TaskStatus>
where
    S: ProgressSink + ?Sized,
{
    run_until(session, client, poller, sink, wait_for_signal()).await
}

/// Run `session`, cancelling polling once `shutdown` resolves
///
/// The task watching `shutdown` is aborted when the run ends.
async fn run_until<S, F>(
    session: &SubmissionSession,
    client: &SubmissionClient,
    poller: &TaskPoller,
    sink: &mut S,
    shutdown: F,
) -> Result<TaskStatus>
where
    S: ProgressSink + ?Sized,
    F: Future<Output = ()> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::select! {
                _ = shutdown => cancel.cancel(),
                _ = cancel.cancelled() => {}
            }
        }
    });

    let outcome = session.run(client, poller, sink, &cancel).await;
    cancel.cancel();
    watcher.abort();
    outcome
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, cancelling task polling");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT (Ctrl+C), cancelling task polling");
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C, cancelling task polling");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}
