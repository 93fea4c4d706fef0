//! Core types for timetable-client

use serde::{Deserialize, Serialize};

/// Opaque identifier of a background optimizer task
///
/// Issued once by the submission endpoint and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(String);

impl TaskHandle {
    /// Create a handle from a server-issued identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskHandle {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskHandle {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-side task state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Accepted but not started
    Pending,
    /// Optimizer is working on it
    Running,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
}

impl TaskState {
    /// Whether no further transition can happen from this state
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One answer from the task-status endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Current state
    pub status: TaskState,

    /// Human-readable progress text, if the server sent any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,

    /// Error message, set when `status` is `failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskStatus {
    /// Status with no progress or error text
    pub fn new(status: TaskState) -> Self {
        Self {
            status,
            progress: None,
            error: None,
        }
    }

    /// `running` with the given progress text
    pub fn running(progress: impl Into<String>) -> Self {
        Self {
            status: TaskState::Running,
            progress: Some(progress.into()),
            error: None,
        }
    }

    /// `failed` with the given error message
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: TaskState::Failed,
            progress: None,
            error: Some(error.into()),
        }
    }

    /// Whether this status ends the poll loop
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// State of a single poll run
///
/// `Polling` is the only non-terminal state. Every run ends in exactly one of the
/// other four.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    /// Still querying
    Polling,
    /// Task reported `completed`
    Completed,
    /// Task reported `failed`, or a status query failed
    Failed,
    /// Poll ceiling reached without a terminal status
    TimedOut,
    /// Caller cancelled the run
    Aborted,
}

impl PollState {
    /// Whether the run is over
    pub fn is_terminal(self) -> bool {
        !matches!(self, PollState::Polling)
    }
}

/// One of the three input files the optimizer needs
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFile {
    /// Course list with faculty, type and credits
    Courses,
    /// Faculty busy-slot preferences
    Faculty,
    /// Student enrolments
    Students,
}

impl SourceFile {
    /// All source files in submission order
    pub const ALL: [SourceFile; 3] = [SourceFile::Courses, SourceFile::Faculty, SourceFile::Students];

    /// Multipart part name used by the submission endpoint
    pub fn part_name(self) -> &'static str {
        match self {
            SourceFile::Courses => "courses_file",
            SourceFile::Faculty => "faculty_preferences_file",
            SourceFile::Students => "student_courses_file",
        }
    }

    /// `file_type` value understood by the preview endpoint
    pub fn preview_key(self) -> &'static str {
        match self {
            SourceFile::Courses => "courses",
            SourceFile::Faculty => "faculty",
            SourceFile::Students => "students",
        }
    }

    /// Name shown to users in validation messages
    pub fn display_name(self) -> &'static str {
        match self {
            SourceFile::Courses => "Courses file",
            SourceFile::Faculty => "Faculty preferences file",
            SourceFile::Students => "Student courses file",
        }
    }

    /// Column headers the optimizer expects in this file
    pub fn expected_columns(self) -> &'static [&'static str] {
        match self {
            SourceFile::Courses => &["Course code", "Faculty Name", "Type", "Credits"],
            SourceFile::Faculty => &["Name", "Busy Slot"],
            SourceFile::Students => &["Roll No.", "G CODE", "Sections"],
        }
    }
}

impl std::fmt::Display for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Scheduling constraint switches sent with a submission
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    /// Professor availability
    Prof,
    /// Room capacity
    Capacity,
    /// Student clashes
    Student,
    /// Same-day repetition
    SameDay,
    /// Consecutive days
    ConsecDays,
}

impl Toggle {
    /// All toggles in form order
    pub const ALL: [Toggle; 5] = [
        Toggle::Prof,
        Toggle::Capacity,
        Toggle::Student,
        Toggle::SameDay,
        Toggle::ConsecDays,
    ];

    /// Form field name
    pub fn field_name(self) -> &'static str {
        match self {
            Toggle::Prof => "toggle_prof",
            Toggle::Capacity => "toggle_capacity",
            Toggle::Student => "toggle_student",
            Toggle::SameDay => "toggle_same_day",
            Toggle::ConsecDays => "toggle_consec_days",
        }
    }
}
