//! Error types for timetable-client
//!
//! Every public operation returns [`Result`]. The variants follow the stages of a
//! submission run:
//! - [`ValidationError`]: local input rejected, nothing was sent
//! - [`SubmissionError`]: the submission request failed or was refused
//! - `Preview`: a file preview request failed
//! - [`PollingError`]: a task-status query failed at the transport level
//! - `TaskFailed`, `Timeout`, `Cancelled`: how a poll run can end without success

use crate::types::{SourceFile, TaskHandle};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for timetable-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for timetable-client
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "polling.max_polls")
        key: Option<String>,
    },

    /// Upload bundle failed local checks; no request was made
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Submission request failed or was rejected by the server
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// Preview request failed or its answer was unusable
    #[error("preview of {file} failed: {source}")]
    Preview {
        /// File being previewed
        file: SourceFile,
        /// Underlying transport failure
        #[source]
        source: TransportError,
    },

    /// Task-status query failed at the transport level
    #[error(transparent)]
    Polling(#[from] PollingError),

    /// Task reached the `failed` state
    #[error("task {task_id} failed: {message}")]
    TaskFailed {
        /// Task that failed
        task_id: TaskHandle,
        /// Error message reported by the server, unchanged
        message: String,
    },

    /// Poll ceiling reached before the task finished
    #[error("task {task_id} did not finish after {polls} status checks ({waited:?})")]
    Timeout {
        /// Task that was being polled
        task_id: TaskHandle,
        /// Number of status queries issued
        polls: u32,
        /// Time spent waiting between queries
        waited: Duration,
    },

    /// Poll run was cancelled by the caller
    #[error("polling of task {task_id} cancelled after {polls} status checks")]
    Cancelled {
        /// Task that was being polled
        task_id: TaskHandle,
        /// Number of status queries issued
        polls: u32,
    },

    /// I/O error (reading input files, loading configuration)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Endpoint URL could not be built
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Machine-readable error code for UI surfaces
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::Submission(_) => "submission_error",
            Error::Preview { .. } => "preview_error",
            Error::Polling(_) => "polling_error",
            Error::TaskFailed { .. } => "task_failed",
            Error::Timeout { .. } => "timeout",
            Error::Cancelled { .. } => "cancelled",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::InvalidUrl(_) => "invalid_url",
        }
    }
}

/// What is wrong with one input file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileProblem {
    /// No file selected
    Missing,
    /// File has zero bytes
    Empty,
    /// File name does not end in an allowed extension
    UnsupportedExtension {
        /// Offending file name
        file_name: String,
    },
    /// Preview of the file produced no rows
    NoData,
}

/// A single failed check, tied to the file it concerns
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileIssue {
    /// File the check applies to
    pub file: SourceFile,
    /// What went wrong
    pub problem: FileProblem,
}

impl std::fmt::Display for FileIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.file.display_name();
        match &self.problem {
            FileProblem::Missing => write!(f, "{name} is missing"),
            FileProblem::Empty => write!(f, "{name} is empty"),
            FileProblem::UnsupportedExtension { file_name } => {
                write!(f, "{name} must be a CSV or Excel file (got {file_name})")
            }
            FileProblem::NoData => write!(f, "{name} has no data"),
        }
    }
}

/// Upload bundle rejected before any network call
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid upload: {}", join_issues(.issues))]
pub struct ValidationError {
    /// Every failed check, in file order
    pub issues: Vec<FileIssue>,
}

impl ValidationError {
    /// Files named by at least one issue
    pub fn files(&self) -> Vec<SourceFile> {
        let mut files: Vec<_> = self.issues.iter().map(|i| i.file).collect();
        files.dedup();
        files
    }

    /// Whether `file` failed any check
    pub fn concerns(&self, file: SourceFile) -> bool {
        self.issues.iter().any(|i| i.file == file)
    }
}

fn join_issues(issues: &[FileIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Submission request failed or was refused
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("submission failed: {message}")]
pub struct SubmissionError {
    /// HTTP status, when the server answered at all
    pub status: Option<u16>,
    /// Server-supplied `detail`, or a message derived from the status or transport error
    pub message: String,
}

/// Failure of a single request to a collaborator endpoint
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request could not be sent or the response could not be read
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Server-supplied `detail`, or the status reason
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Task-status query failed; the poll run is over
#[derive(Debug, Error)]
#[error("status check for task {task_id} failed: {source}")]
pub struct PollingError {
    /// Task being polled
    pub task_id: TaskHandle,
    /// Underlying transport failure
    #[source]
    pub source: TransportError,
}
