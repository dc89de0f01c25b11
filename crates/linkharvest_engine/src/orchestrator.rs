//! Sequential batch download with cooperative cancellation.
//!
//! Tasks run one at a time in harvest order. The cancellation token is polled
//! before each task starts and after each chunk is written; an in-flight write
//! is never interrupted. A failing task is recorded and the batch moves on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine_logging::{engine_info, engine_trace, engine_warn};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::fetch::Fetcher;
use crate::filename::resolve_destination;
use crate::persist::ensure_output_dir;
use crate::progress::{PercentTracker, ProgressSink};
use crate::{
    BatchOutcome, BatchSummary, EngineEvent, FailureKind, FetchError, LinkRecord, NamingMode,
    PartialFilePolicy, TaskIndex, TaskOutcome, TaskState,
};

pub const DEFAULT_CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub chunk_size: usize,
    pub partial_file_policy: PartialFilePolicy,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            partial_file_policy: PartialFilePolicy::Keep,
        }
    }
}

/// One link's unit of work. Only the orchestrator mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub link: LinkRecord,
    state: TaskState,
    pub bytes_written: u64,
    pub total_bytes: Option<u64>,
    pub destination: Option<PathBuf>,
    pub error: Option<String>,
}

impl DownloadTask {
    pub fn new(link: LinkRecord) -> Self {
        Self {
            link,
            state: TaskState::Pending,
            bytes_written: 0,
            total_bytes: None,
            destination: None,
            error: None,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    fn advance(&mut self, next: TaskState) -> bool {
        if !self.state.can_advance_to(next) {
            engine_warn!(
                "Ignoring task transition {:?} -> {:?} for {}",
                self.state,
                next,
                self.link.url
            );
            return false;
        }
        self.state = next;
        true
    }
}

/// The tasks of one download run plus its cancellation signal.
#[derive(Debug)]
pub struct BatchSession {
    tasks: Vec<DownloadTask>,
    cancel: CancellationToken,
    output_dir: PathBuf,
    naming: NamingMode,
}

impl BatchSession {
    pub fn new(
        links: Vec<LinkRecord>,
        output_dir: PathBuf,
        naming: NamingMode,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            tasks: links.into_iter().map(DownloadTask::new).collect(),
            cancel,
            output_dir,
            naming,
        }
    }

    pub fn tasks(&self) -> &[DownloadTask] {
        &self.tasks
    }

    pub fn summary(&self) -> BatchSummary {
        let count = |state: TaskState| self.tasks.iter().filter(|t| t.state == state).count();
        // Cancellation is observed exactly when some task ends up cancelled; a
        // request arriving after the last task finished does not count.
        let cancelled = count(TaskState::Cancelled);
        BatchSummary {
            outcome: if cancelled > 0 {
                BatchOutcome::Cancelled
            } else {
                BatchOutcome::Completed
            },
            completed: count(TaskState::Completed),
            failed: count(TaskState::Failed),
            cancelled,
        }
    }
}

enum TransferEnd {
    Finished,
    Cancelled,
}

pub struct DownloadOrchestrator {
    fetcher: Arc<dyn Fetcher>,
    settings: DownloadSettings,
}

impl DownloadOrchestrator {
    pub fn new(fetcher: Arc<dyn Fetcher>, settings: DownloadSettings) -> Self {
        Self { fetcher, settings }
    }

    /// Drives every task of `session` to a terminal state and reports the
    /// result. Task errors never escape this call.
    pub async fn run(&self, session: &mut BatchSession, sink: &dyn ProgressSink) -> BatchSummary {
        let BatchSession {
            tasks,
            cancel,
            output_dir,
            naming,
        } = session;

        if let Err(err) = ensure_output_dir(output_dir) {
            // Each task will fail on its own when creating its file.
            engine_warn!("Output directory {:?} unusable: {}", output_dir, err);
        }
        engine_info!("Starting batch of {} download(s) into {:?}", tasks.len(), output_dir);

        for index in 0..tasks.len() {
            if cancel.is_cancelled() {
                engine_info!("Cancellation observed before task {}", index);
                cancel_remaining(tasks, index, sink);
                break;
            }

            let outcome = self
                .run_task(index, &mut tasks[index], output_dir, *naming, cancel, sink)
                .await;
            let halted = outcome == TaskOutcome::Cancelled;
            sink.emit(EngineEvent::TaskFinished { index, outcome });
            if halted {
                cancel_remaining(tasks, index + 1, sink);
                break;
            }
        }

        let summary = session.summary();
        engine_info!(
            "Batch finished {:?}: {} completed, {} failed, {} cancelled",
            summary.outcome,
            summary.completed,
            summary.failed,
            summary.cancelled
        );
        sink.emit(EngineEvent::BatchFinished(summary.clone()));
        summary
    }

    async fn run_task(
        &self,
        index: TaskIndex,
        task: &mut DownloadTask,
        output_dir: &Path,
        naming: NamingMode,
        cancel: &CancellationToken,
        sink: &dyn ProgressSink,
    ) -> TaskOutcome {
        task.advance(TaskState::InProgress);
        let destination = resolve_destination(output_dir, &task.link, naming);
        task.destination = Some(destination.clone());
        sink.emit(EngineEvent::TaskStarted {
            index,
            destination: destination.clone(),
        });
        engine_info!("Downloading {} -> {:?}", task.link.url, destination);

        let mut created = false;
        let result = self
            .transfer(index, task, &destination, cancel, sink, &mut created)
            .await;

        let outcome = match result {
            Ok(TransferEnd::Finished) => TaskOutcome::Completed {
                path: destination.clone(),
                bytes_written: task.bytes_written,
            },
            Ok(TransferEnd::Cancelled) => {
                engine_info!(
                    "Cancelled {} after {} byte(s)",
                    task.link.url,
                    task.bytes_written
                );
                TaskOutcome::Cancelled
            }
            Err(err) => {
                engine_warn!("Download of {} failed: {}", task.link.url, err);
                task.error = Some(err.to_string());
                TaskOutcome::Failed {
                    message: err.to_string(),
                }
            }
        };

        let incomplete = !matches!(outcome, TaskOutcome::Completed { .. });
        if incomplete && created {
            self.handle_partial_file(&destination).await;
        }
        task.advance(outcome.state());
        outcome
    }

    async fn transfer(
        &self,
        index: TaskIndex,
        task: &mut DownloadTask,
        destination: &Path,
        cancel: &CancellationToken,
        sink: &dyn ProgressSink,
        created: &mut bool,
    ) -> Result<TransferEnd, FetchError> {
        let mut body = self.fetcher.open(&task.link.url).await?;
        let total = body.total_bytes().filter(|t| *t > 0);
        task.total_bytes = total;

        // create_new: an existing file is never overwritten.
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(destination)
            .await
            .map_err(io_error)?;
        *created = true;

        let mut tracker = PercentTracker::new(total);
        if let Some(percent) = tracker.update(0) {
            sink.emit(EngineEvent::TaskProgress { index, percent });
        }

        let chunk_size = self.settings.chunk_size.max(1);
        while let Some(chunk) = body.next_chunk().await {
            let mut chunk = chunk?;
            while !chunk.is_empty() {
                let piece = chunk.split_to(chunk_size.min(chunk.len()));
                let next_len = task.bytes_written + piece.len() as u64;
                if let Some(declared) = total.filter(|t| next_len > *t) {
                    return Err(FetchError::new(
                        FailureKind::LengthMismatch,
                        format!("body exceeds declared content length of {declared} byte(s)"),
                    ));
                }
                file.write_all(&piece).await.map_err(io_error)?;
                task.bytes_written = next_len;
                engine_trace!("Task {} wrote {} byte(s)", index, next_len);
                if let Some(percent) = tracker.update(task.bytes_written) {
                    sink.emit(EngineEvent::TaskProgress { index, percent });
                }
                if cancel.is_cancelled() {
                    let _ = file.flush().await;
                    return Ok(TransferEnd::Cancelled);
                }
            }
        }

        file.flush().await.map_err(io_error)?;
        Ok(TransferEnd::Finished)
    }

    async fn handle_partial_file(&self, path: &Path) {
        match self.settings.partial_file_policy {
            PartialFilePolicy::Keep => {
                engine_info!("Leaving partial file {:?} on disk", path);
            }
            PartialFilePolicy::Remove => {
                if let Err(err) = tokio::fs::remove_file(path).await {
                    engine_warn!("Could not remove partial file {:?}: {}", path, err);
                }
            }
        }
    }
}

/// Marks every still-pending task from `from` onwards as cancelled without
/// touching the network.
fn cancel_remaining(tasks: &mut [DownloadTask], from: usize, sink: &dyn ProgressSink) {
    for (index, task) in tasks.iter_mut().enumerate().skip(from) {
        if task.state == TaskState::Pending && task.advance(TaskState::Cancelled) {
            sink.emit(EngineEvent::TaskFinished {
                index,
                outcome: TaskOutcome::Cancelled,
            });
        }
    }
}

fn io_error(err: std::io::Error) -> FetchError {
    FetchError::new(FailureKind::Io, err.to_string())
}
