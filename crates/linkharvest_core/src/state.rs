use std::path::{Path, PathBuf};

use crate::view_model::{AppViewModel, LinkRowView};

pub type RowIndex = usize;

/// A harvested link as the controller sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRow {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingMode {
    #[default]
    ByTitle,
    ByUrl,
}

/// Batch lifecycle: `Idle → Harvesting → Ready → Running → {Completed, Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Harvesting,
    Ready,
    Running,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    Pending,
    Started,
    Percent(u8),
    Done,
    Failed(String),
    Cancelled,
}

impl RowStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RowStatus::Done | RowStatus::Failed(_) | RowStatus::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResultKind {
    Completed,
    Failed(String),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchCounts {
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

/// One-shot message for the user about the last command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    HarvestRejected,
    HarvestFailed(String),
    NoLinksFound,
    DownloadRejected,
    BatchCompleted(BatchCounts),
    BatchCancelled(BatchCounts),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    session: SessionState,
    source: Option<PathBuf>,
    manifest: Option<PathBuf>,
    links: Vec<LinkRow>,
    statuses: Vec<RowStatus>,
    output_dir: Option<PathBuf>,
    cancel_sent: bool,
    counts: Option<BatchCounts>,
    notice: Option<Notice>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn links(&self) -> &[LinkRow] {
        &self.links
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            session: self.session,
            source: self.source.clone(),
            manifest: self.manifest.clone(),
            link_count: self.links.len(),
            rows: self
                .links
                .iter()
                .zip(&self.statuses)
                .enumerate()
                .map(|(index, (link, status))| LinkRowView {
                    index,
                    title: link.title.clone(),
                    url: link.url.clone(),
                    status: status.clone(),
                })
                .collect(),
            output_dir: self.output_dir.clone(),
            counts: self.counts,
            notice: self.notice.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.mark_dirty();
    }

    pub(crate) fn begin_harvest(&mut self, source: PathBuf) {
        self.session = SessionState::Harvesting;
        self.source = Some(source);
        self.manifest = None;
        self.links.clear();
        self.statuses.clear();
        self.counts = None;
        self.notice = None;
        self.mark_dirty();
    }

    pub(crate) fn finish_harvest(
        &mut self,
        result: Result<Vec<LinkRow>, String>,
        manifest: Option<PathBuf>,
    ) {
        self.manifest = manifest;
        match result {
            Ok(links) if links.is_empty() => {
                self.session = SessionState::Idle;
                self.notice = Some(Notice::NoLinksFound);
            }
            Ok(links) => {
                self.statuses = vec![RowStatus::Pending; links.len()];
                self.links = links;
                self.session = SessionState::Ready;
            }
            Err(message) => {
                self.session = SessionState::Idle;
                self.notice = Some(Notice::HarvestFailed(message));
            }
        }
        self.mark_dirty();
    }

    pub(crate) fn begin_batch(&mut self, output_dir: PathBuf) {
        self.session = SessionState::Running;
        self.output_dir = Some(output_dir);
        self.statuses = vec![RowStatus::Pending; self.links.len()];
        self.cancel_sent = false;
        self.counts = None;
        self.notice = None;
        self.mark_dirty();
    }

    /// True only for the first cancel request of a running batch.
    pub(crate) fn request_cancel(&mut self) -> bool {
        if self.cancel_sent {
            return false;
        }
        self.cancel_sent = true;
        self.mark_dirty();
        true
    }

    pub(crate) fn apply_started(&mut self, index: RowIndex) {
        if let Some(status) = self.statuses.get_mut(index) {
            if *status == RowStatus::Pending {
                *status = RowStatus::Started;
                self.dirty = true;
            }
        }
    }

    /// Progress only moves forward and never overrides a terminal status.
    pub(crate) fn apply_progress(&mut self, index: RowIndex, percent: u8) {
        let percent = percent.min(100);
        if let Some(status) = self.statuses.get_mut(index) {
            let advances = match status {
                RowStatus::Pending | RowStatus::Started => true,
                RowStatus::Percent(current) => percent > *current,
                _ => false,
            };
            if advances {
                *status = RowStatus::Percent(percent);
                self.dirty = true;
            }
        }
    }

    pub(crate) fn apply_finished(&mut self, index: RowIndex, result: TaskResultKind) {
        if let Some(status) = self.statuses.get_mut(index) {
            if status.is_terminal() {
                return;
            }
            *status = match result {
                TaskResultKind::Completed => RowStatus::Done,
                TaskResultKind::Failed(message) => RowStatus::Failed(message),
                TaskResultKind::Cancelled => RowStatus::Cancelled,
            };
            self.dirty = true;
        }
    }

    pub(crate) fn finish_batch(&mut self, counts: BatchCounts, cancelled: bool) {
        self.counts = Some(counts);
        if cancelled {
            self.session = SessionState::Cancelled;
            self.notice = Some(Notice::BatchCancelled(counts));
        } else {
            self.session = SessionState::Completed;
            self.notice = Some(Notice::BatchCompleted(counts));
        }
        self.mark_dirty();
    }
}
