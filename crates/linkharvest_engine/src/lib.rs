//! Link harvest engine: document reading, harvesting, manifest persistence
//! and the batch download pipeline.
mod document;
mod engine;
mod fetch;
mod filename;
mod harvest;
mod manifest;
mod orchestrator;
mod persist;
mod progress;
mod types;

pub use document::{Document, DocumentError, LinkAnnotation, PdfDocument, Rect};
pub use engine::{EngineConfig, EngineError, EngineHandle};
pub use fetch::{BodyStream, FetchSettings, Fetcher, ReqwestFetcher};
pub use filename::{
    candidate_name, resolve_destination, resolve_unique, sanitize_filename, url_extension,
};
pub use harvest::{harvest_file, harvest_links, is_supported_scheme, HarvestError};
pub use manifest::{render_manifest, ManifestStore, DEFAULT_MANIFEST_FILENAME};
pub use orchestrator::{
    BatchSession, DownloadOrchestrator, DownloadSettings, DownloadTask, DEFAULT_CHUNK_SIZE,
};
pub use persist::{ensure_output_dir, write_atomic, PersistError};
pub use progress::{ChannelProgressSink, ProgressSink};
pub use types::{
    BatchOutcome, BatchSummary, EngineEvent, FailureKind, FetchError, HarvestReport, LinkRecord,
    NamingMode, PartialFilePolicy, TaskIndex, TaskOutcome, TaskState,
};
