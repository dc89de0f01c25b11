use std::path::PathBuf;

use crate::{BatchCounts, LinkRow, NamingMode, RowIndex, TaskResultKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a document to scan for links.
    HarvestRequested {
        source: PathBuf,
        manifest_path: Option<PathBuf>,
    },
    /// Engine finished scanning; the error string is shown verbatim.
    HarvestCompleted {
        result: Result<Vec<LinkRow>, String>,
        manifest: Option<PathBuf>,
    },
    /// User asked to download every harvested link.
    DownloadRequested {
        output_dir: PathBuf,
        naming: NamingMode,
    },
    /// User asked to stop the running batch.
    CancelRequested,
    /// Engine began working on a row.
    TaskStarted { index: RowIndex },
    /// Engine progress for a row with a known size.
    TaskProgress { index: RowIndex, percent: u8 },
    /// Engine reached a terminal state for a row.
    TaskFinished {
        index: RowIndex,
        result: TaskResultKind,
    },
    /// Engine finished the batch.
    BatchFinished { counts: BatchCounts, cancelled: bool },
    /// User asked to reveal the output folder.
    OpenFolderRequested,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
