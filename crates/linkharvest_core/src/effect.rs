use std::path::PathBuf;

use crate::{LinkRow, NamingMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartHarvest {
        source: PathBuf,
        manifest_path: Option<PathBuf>,
    },
    StartDownloads {
        links: Vec<LinkRow>,
        output_dir: PathBuf,
        naming: NamingMode,
    },
    Cancel,
    OpenFolder {
        path: PathBuf,
    },
}
