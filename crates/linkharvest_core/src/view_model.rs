use std::fmt;
use std::path::PathBuf;

use crate::{BatchCounts, Notice, RowIndex, RowStatus, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub session: SessionState,
    pub source: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub link_count: usize,
    pub rows: Vec<LinkRowView>,
    pub output_dir: Option<PathBuf>,
    pub counts: Option<BatchCounts>,
    pub notice: Option<Notice>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRowView {
    pub index: RowIndex,
    pub title: String,
    pub url: String,
    pub status: RowStatus,
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowStatus::Pending => write!(f, "pending"),
            RowStatus::Started => write!(f, "started"),
            RowStatus::Percent(p) => write!(f, "{p}%"),
            RowStatus::Done => write!(f, "done"),
            RowStatus::Failed(message) => write!(f, "error: {message}"),
            RowStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Idle => "Idle",
            SessionState::Harvesting => "Harvesting",
            SessionState::Ready => "Ready",
            SessionState::Running => "Running",
            SessionState::Completed => "Completed",
            SessionState::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}
