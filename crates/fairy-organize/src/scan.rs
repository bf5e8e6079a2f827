//! Directory scanning and the scan report.

use chrono::{DateTime, Utc};
use fairy_core::{extension_of, Error, FileEntry, Result};
use std::collections::HashMap;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// How many of the oldest files the report lists.
pub const OLDEST_COUNT: usize = 5;

/// Label for files without an extension.
pub const NO_EXTENSION: &str = ".no_extension";

fn is_excluded(entry: &DirEntry, exclude: &[String]) -> bool {
    let name = entry.file_name().to_string_lossy();
    exclude.iter().any(|e| *e == name)
}

fn file_entry(entry: &DirEntry) -> std::io::Result<FileEntry> {
    let metadata = entry.metadata().map_err(std::io::Error::from)?;
    let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    let created = metadata.created().unwrap_or(modified);

    Ok(FileEntry {
        path: entry.path().to_path_buf(),
        extension: extension_of(entry.path()),
        created_at: DateTime::<Utc>::from(created),
        modified_at: DateTime::<Utc>::from(modified),
        size_bytes: metadata.len(),
    })
}

/// Files under `root`, sorted by path.
///
/// Entries whose name equals one of `exclude` are skipped; excluded
/// directories are not descended into. Without `recursive` only the top
/// level is listed.
pub fn scan(root: &Path, recursive: bool, exclude: &[String]) -> Result<Vec<FileEntry>> {
    if !root.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("not a directory: {}", root.display()),
        )));
    }

    let walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
    let walker = if recursive { walker } else { walker.max_depth(1) };

    let mut files = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded(e, exclude))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match file_entry(&entry) {
            Ok(file) => files.push(file),
            Err(e) => warn!("Cannot stat {:?}: {}", entry.path(), e),
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("Scanned {} files under {:?}", files.len(), root);
    Ok(files)
}

/// Summary of a directory: totals, extension histogram and oldest files.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub total_files: usize,
    /// Sorted by count descending, then extension
    pub by_extension: Vec<(String, usize)>,
    /// Oldest by modification time, at most [`OLDEST_COUNT`]
    pub oldest: Vec<FileEntry>,
}

impl ScanReport {
    pub fn from_entries(files: &[FileEntry]) -> Self {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for file in files {
            let ext = if file.extension.is_empty() {
                NO_EXTENSION.to_string()
            } else {
                file.extension.clone()
            };
            *counts.entry(ext).or_default() += 1;
        }
        let mut by_extension: Vec<(String, usize)> = counts.into_iter().collect();
        by_extension.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut oldest = files.to_vec();
        oldest.sort_by(|a, b| a.modified_at.cmp(&b.modified_at).then_with(|| a.path.cmp(&b.path)));
        oldest.truncate(OLDEST_COUNT);

        Self {
            total_files: files.len(),
            by_extension,
            oldest,
        }
    }
}
