use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::LevelFilter;

/// Extract the hyperlinks of a PDF and download every target.
#[derive(Debug, Parser)]
#[command(name = "linkharvest", version)]
pub struct Cli {
    /// PDF document to scan for links.
    pub source: PathBuf,

    /// Folder receiving downloads and the manifest.
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Name files after the URL instead of the link text.
    #[arg(long)]
    pub name_by_url: bool,

    /// Manifest location [default: <DIR>/extracted_urls.csv].
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Harvest and write the manifest without downloading.
    #[arg(long)]
    pub list_only: bool,

    /// Open the output folder once the batch ends.
    #[arg(long)]
    pub open: bool,

    /// RON settings file; command line flags take precedence.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Delete files left incomplete by cancellation or failure.
    #[arg(long)]
    pub remove_partial: bool,

    /// Also write the log to this file.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
