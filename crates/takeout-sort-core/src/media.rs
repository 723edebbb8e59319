use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::date::{self, DateResult};

/// Extensions the archiver buckets into date folders.
pub const ARCHIVE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "mp4"];

/// Extensions the merger pairs with sidecars. Differs from [`ARCHIVE_EXTENSIONS`]
/// (no tiff/webp, adds heic/mov); both sets are kept as the export tooling uses them.
pub const MERGE_EXTENSIONS: &[&str] = &["jpg", "png", "gif", "heic", "mp4", "mov", "bmp"];

/// A media file found during one directory scan.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub path: PathBuf,
    /// Just the filename
    pub filename: String,
    /// Filename without the final extension
    pub stem: String,
    /// Lowercase extension without the dot
    pub extension: String,
    /// Resolved lazily by [`MediaFile::resolve_date`]
    pub date: Option<DateResult>,
    /// Sidecar paired by the merger
    pub sidecar: Option<PathBuf>,
}

impl MediaFile {
    pub fn new(path: PathBuf) -> Option<Self> {
        let filename = path.file_name()?.to_str()?.to_string();
        let stem = path.file_stem()?.to_str()?.to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        Some(Self {
            path,
            filename,
            stem,
            extension,
            date: None,
            sidecar: None,
        })
    }

    pub fn has_extension_in(&self, extensions: &[&str]) -> bool {
        extensions.contains(&self.extension.as_str())
    }

    pub fn is_jpeg(&self) -> bool {
        matches!(self.extension.as_str(), "jpg" | "jpeg")
    }

    /// Resolve (once) and return the capture date.
    pub fn resolve_date(&mut self) -> Option<DateResult> {
        if self.date.is_none() {
            self.date = date::resolve_date(&self.path);
        }
        self.date
    }
}

/// Regular files directly inside `dir`, sorted by name.
pub fn list_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("reading directory {}", dir.display()))?;
        if entry.file_type().map_or(false, |t| t.is_file()) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Media files directly inside `dir` whose extension (any case) is in `extensions`.
pub fn scan_media(dir: &Path, extensions: &[&str]) -> anyhow::Result<Vec<MediaFile>> {
    Ok(list_files(dir)?
        .into_iter()
        .filter_map(MediaFile::new)
        .filter(|m| m.has_extension_in(extensions))
        .collect())
}
