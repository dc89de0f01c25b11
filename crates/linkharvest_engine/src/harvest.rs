use std::collections::HashSet;
use std::path::Path;

use engine_logging::{engine_debug, engine_info, engine_warn};
use url::Url;

use crate::document::{Document, DocumentError, PdfDocument};
use crate::LinkRecord;

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// True for absolute `http`/`https` URLs. The scheme match is case-insensitive
/// because `Url` lowercases it while parsing.
pub fn is_supported_scheme(uri: &str) -> bool {
    Url::parse(uri.trim())
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Collects `http`/`https` link annotations with their labels, in page and
/// annotation order, keeping only the first occurrence of each URL.
///
/// An empty result is a valid outcome.
pub fn harvest_links(document: &dyn Document) -> Result<Vec<LinkRecord>, HarvestError> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for page in 0..document.page_count() {
        for link in document.link_annotations(page)? {
            let uri = link.uri.trim();
            if !is_supported_scheme(uri) {
                engine_debug!("Skipping unsupported link on page {}: {}", page + 1, uri);
                continue;
            }
            if !seen.insert(uri.to_string()) {
                continue;
            }

            let label = match document.text_in_rect(page, link.rect) {
                Ok(text) => text,
                Err(err) => {
                    engine_warn!("No label for {} on page {}: {}", uri, page + 1, err);
                    String::new()
                }
            };
            let label = label.trim();
            let title = if label.is_empty() { uri } else { label };

            records.push(LinkRecord {
                url: uri.to_string(),
                title: title.to_string(),
                order: records.len(),
            });
        }
    }

    Ok(records)
}

/// Opens a PDF and harvests its links.
pub fn harvest_file(path: &Path) -> Result<Vec<LinkRecord>, HarvestError> {
    let document = PdfDocument::open(path)?;
    let records = harvest_links(&document)?;
    engine_info!(
        "Harvested {} link(s) from {} page(s) of {:?}",
        records.len(),
        document.page_count(),
        path
    );
    Ok(records)
}
