use std::path::{Path, PathBuf};

use url::Url;

use crate::{LinkRecord, NamingMode};

const FALLBACK_NAME: &str = "file";
const MAX_NAME_CHARS: usize = 150;
const MAX_EXTENSION_CHARS: usize = 10;

/// Destination for `link` inside `dir` that does not collide with any file
/// present at the moment of the call. Nothing is reserved: resolve right
/// before creating the file.
pub fn resolve_destination(dir: &Path, link: &LinkRecord, mode: NamingMode) -> PathBuf {
    let name = candidate_name(link, mode);
    resolve_unique(dir, &name, |path| path.exists())
}

/// Sanitized file name for a link, with the URL's extension appended when missing.
pub fn candidate_name(link: &LinkRecord, mode: NamingMode) -> String {
    let mut name = match mode {
        NamingMode::ByTitle => sanitize_filename(&link.title, true),
        NamingMode::ByUrl => sanitize_filename(&url_host_and_path(&link.url), false),
    };
    if let Some(ext) = url_extension(&link.url) {
        if !name.to_lowercase().ends_with(&ext.to_lowercase()) {
            name.push_str(&ext);
        }
    }
    name
}

/// First of `name`, `stem_1.ext`, `stem_2.ext`, ... for which `exists` is false.
pub fn resolve_unique(dir: &Path, name: &str, exists: impl Fn(&Path) -> bool) -> PathBuf {
    let first = dir.join(name);
    if !exists(&first) {
        return first;
    }

    let (stem, ext) = split_extension(name);
    let mut counter: u64 = 1;
    loop {
        let candidate = dir.join(format!("{stem}_{counter}{ext}"));
        if !exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Replaces characters that are illegal in file names, collapses `_` runs
/// (and whitespace runs when asked), trims, and never returns an empty name.
pub fn sanitize_filename(input: &str, collapse_whitespace: bool) -> String {
    let source = if collapse_whitespace {
        input.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        input.to_string()
    };

    let mut compacted = String::with_capacity(source.len());
    let mut prev_underscore = false;
    for c in source.chars() {
        let c = if is_forbidden(c) { '_' } else { c };
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }

    let mut cleaned: String = trim_name(&compacted)
        .chars()
        .take(MAX_NAME_CHARS)
        .collect();
    cleaned = trim_name(&cleaned).to_string();
    if cleaned.is_empty() {
        return FALLBACK_NAME.to_string();
    }
    if is_reserved_windows_name(&cleaned) {
        cleaned.push('_');
    }
    cleaned
}

/// Extension of the URL's last path segment, including the leading dot.
pub fn url_extension(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last_segment = parsed.path_segments()?.next_back()?;
    let dot = last_segment.rfind('.')?;
    let ext = &last_segment[dot + 1..];
    let valid = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_CHARS
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| format!(".{ext}"))
}

fn url_host_and_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => format!("{}{}", parsed.host_str().unwrap_or_default(), parsed.path()),
        Err(_) => url.to_string(),
    }
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    }
}

fn trim_name(name: &str) -> &str {
    name.trim_matches(&['_', ' ', '.'][..])
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}' | '\u{7F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(stem))
}
