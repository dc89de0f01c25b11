use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_error, engine_info};
use tokio_util::sync::CancellationToken;

use crate::fetch::{FetchSettings, ReqwestFetcher};
use crate::harvest::harvest_file;
use crate::manifest::ManifestStore;
use crate::orchestrator::{BatchSession, DownloadOrchestrator, DownloadSettings};
use crate::progress::{ChannelProgressSink, ProgressSink};
use crate::{EngineEvent, FetchError, HarvestReport, LinkRecord, NamingMode};

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub fetch: FetchSettings,
    pub download: DownloadSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to build http client: {0}")]
    Client(#[from] FetchError),
}

enum EngineCommand {
    Harvest {
        source: PathBuf,
        manifest: Option<PathBuf>,
    },
    Download {
        links: Vec<LinkRecord>,
        output_dir: PathBuf,
        naming: NamingMode,
        cancel: CancellationToken,
    },
}

/// Controller-side handle to the background engine thread.
///
/// Commands run strictly one after another on that thread, so a harvest sent
/// while a batch is downloading waits for the batch to end.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
    current_cancel: Arc<Mutex<CancellationToken>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;
        let fetcher = Arc::new(ReqwestFetcher::new(config.fetch)?);
        let orchestrator = DownloadOrchestrator::new(fetcher, config.download);

        thread::spawn(move || {
            let sink = ChannelProgressSink::new(event_tx);
            while let Ok(command) = cmd_rx.recv() {
                runtime.block_on(handle_command(&orchestrator, command, &sink));
            }
        });

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
            current_cancel: Arc::new(Mutex::new(CancellationToken::new())),
        })
    }

    /// Harvest links from a PDF; the manifest is written when a path is given.
    pub fn harvest(&self, source: impl Into<PathBuf>, manifest: Option<PathBuf>) {
        let _ = self.cmd_tx.send(EngineCommand::Harvest {
            source: source.into(),
            manifest,
        });
    }

    pub fn start_downloads(
        &self,
        links: Vec<LinkRecord>,
        output_dir: PathBuf,
        naming: NamingMode,
    ) {
        let cancel = CancellationToken::new();
        if let Ok(mut current) = self.current_cancel.lock() {
            *current = cancel.clone();
        }
        let _ = self.cmd_tx.send(EngineCommand::Download {
            links,
            output_dir,
            naming,
            cancel,
        });
    }

    /// Request cancellation of the current batch. Takes effect at the next
    /// poll point: before a task starts or after a chunk is written.
    pub fn cancel(&self) {
        if let Ok(current) = self.current_cancel.lock() {
            current.cancel();
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    orchestrator: &DownloadOrchestrator,
    command: EngineCommand,
    sink: &dyn ProgressSink,
) {
    match command {
        EngineCommand::Harvest { source, manifest } => {
            let result = match harvest_file(&source) {
                Ok(links) => {
                    let manifest =
                        manifest.and_then(|path| ManifestStore::new(path).write_logged(&links));
                    Ok(HarvestReport { links, manifest })
                }
                Err(err) => {
                    engine_error!("Harvest of {:?} failed: {}", source, err);
                    Err(err.to_string())
                }
            };
            sink.emit(EngineEvent::HarvestCompleted(result));
        }
        EngineCommand::Download {
            links,
            output_dir,
            naming,
            cancel,
        } => {
            engine_info!("Batch requested: {} link(s), naming {:?}", links.len(), naming);
            let mut session = BatchSession::new(links, output_dir, naming, cancel);
            orchestrator.run(&mut session, sink).await;
        }
    }
}
