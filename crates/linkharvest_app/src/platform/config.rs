use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use engine_logging::engine_info;
use linkharvest_core::NamingMode;
use linkharvest_engine::{EngineConfig, PartialFilePolicy, DEFAULT_MANIFEST_FILENAME};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

const DEFAULT_OUTPUT_DIR: &str = "downloads";

/// Optional settings file, e.g.
///
/// ```ron
/// (output_dir: Some("papers"), name_by_url: true, read_timeout_secs: Some(30))
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct FileConfig {
    output_dir: Option<PathBuf>,
    name_by_url: bool,
    connect_timeout_secs: Option<u64>,
    read_timeout_secs: Option<u64>,
    chunk_size: Option<usize>,
    remove_partial_files: bool,
}

/// Everything one run needs, after merging the settings file with the flags.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub naming: NamingMode,
    pub list_only: bool,
    pub open_folder: bool,
    pub engine: EngineConfig,
}

pub fn resolve(cli: &Cli) -> anyhow::Result<RunSettings> {
    let file = match &cli.config {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };
    merge(cli, file)
}

pub(crate) fn load_file_config(path: &Path) -> anyhow::Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: FileConfig = ron::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    engine_info!("Loaded settings from {:?}", path);
    Ok(config)
}

fn merge(cli: &Cli, file: FileConfig) -> anyhow::Result<RunSettings> {
    let output_dir = cli
        .output_dir
        .clone()
        .or(file.output_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let manifest_path = cli
        .manifest
        .clone()
        .unwrap_or_else(|| output_dir.join(DEFAULT_MANIFEST_FILENAME));

    let mut engine = EngineConfig::default();
    if let Some(secs) = file.connect_timeout_secs {
        engine.fetch.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.read_timeout_secs {
        engine.fetch.read_timeout = Duration::from_secs(secs);
    }
    if let Some(size) = file.chunk_size {
        if size == 0 {
            bail!("chunk_size must be greater than zero");
        }
        engine.download.chunk_size = size;
    }
    if cli.remove_partial || file.remove_partial_files {
        engine.download.partial_file_policy = PartialFilePolicy::Remove;
    }

    let naming = if cli.name_by_url || file.name_by_url {
        NamingMode::ByUrl
    } else {
        NamingMode::ByTitle
    };

    Ok(RunSettings {
        source: cli.source.clone(),
        output_dir,
        manifest_path,
        naming,
        list_only: cli.list_only,
        open_folder: cli.open,
        engine,
    })
}
