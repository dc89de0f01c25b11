use std::fmt;
use std::path::PathBuf;

/// Position of a link in harvest order; doubles as the task index of a batch.
pub type TaskIndex = usize;

/// A deduplicated hyperlink and its display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub url: String,
    pub title: String,
    pub order: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingMode {
    #[default]
    ByTitle,
    ByUrl,
}

/// What to do with a file left incomplete by cancellation or a mid-stream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialFilePolicy {
    #[default]
    Keep,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskState {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }

    /// Transitions only ever move forward: a terminal state is final and
    /// `InProgress` cannot return to `Pending`.
    pub fn can_advance_to(self, next: TaskState) -> bool {
        match self {
            TaskState::Pending => next != TaskState::Pending,
            TaskState::InProgress => next.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed { path: PathBuf, bytes_written: u64 },
    Failed { message: String },
    Cancelled,
}

impl TaskOutcome {
    pub fn state(&self) -> TaskState {
        match self {
            TaskOutcome::Completed { .. } => TaskState::Completed,
            TaskOutcome::Failed { .. } => TaskState::Failed,
            TaskOutcome::Cancelled => TaskState::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub outcome: BatchOutcome,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    pub links: Vec<LinkRecord>,
    /// Where the manifest landed, if writing it succeeded.
    pub manifest: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    HarvestCompleted(Result<HarvestReport, String>),
    TaskStarted {
        index: TaskIndex,
        destination: PathBuf,
    },
    /// Only emitted when the response declared its size, and only when the value changed.
    TaskProgress { index: TaskIndex, percent: u8 },
    TaskFinished {
        index: TaskIndex,
        outcome: TaskOutcome,
    },
    BatchFinished(BatchSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// The body was longer than its declared `Content-Length`.
    LengthMismatch,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::LengthMismatch => write!(f, "length mismatch"),
            FailureKind::Io => write!(f, "file error"),
        }
    }
}
