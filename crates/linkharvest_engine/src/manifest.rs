//! Harvest manifest: an auditable `title,url` table of one harvest.

use std::path::{Path, PathBuf};

use engine_logging::{engine_error, engine_info};

use crate::persist::{write_atomic, PersistError};
use crate::LinkRecord;

pub const DEFAULT_MANIFEST_FILENAME: &str = "extracted_urls.csv";

/// Owns the manifest location. Each write replaces the previous manifest.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Manifest at the default file name inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(DEFAULT_MANIFEST_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, links: &[LinkRecord]) -> Result<(), PersistError> {
        write_atomic(&self.path, render_manifest(links).as_bytes())
    }

    /// Writes the manifest, logging instead of failing: the manifest is an
    /// audit artifact and must never hold up downloads.
    pub fn write_logged(&self, links: &[LinkRecord]) -> Option<PathBuf> {
        match self.write(links) {
            Ok(()) => {
                engine_info!("Wrote manifest with {} row(s) to {:?}", links.len(), self.path);
                Some(self.path.clone())
            }
            Err(err) => {
                engine_error!("Failed to write manifest {:?}: {}", self.path, err);
                None
            }
        }
    }
}

/// UTF-8 CSV with a `title,url` header and one row per link in harvest order.
pub fn render_manifest(links: &[LinkRecord]) -> String {
    let mut out = String::from("title,url\r\n");
    for link in links {
        out.push_str(&csv_field(&link.title));
        out.push(',');
        out.push_str(&csv_field(&link.url));
        out.push_str("\r\n");
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
