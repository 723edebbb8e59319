pub mod archiver;
pub mod date;
pub mod exif_write;
pub mod gps;
pub mod matcher;
pub mod media;
pub mod merger;
pub mod normalize;
pub mod sidecar;

#[cfg(test)]
pub(crate) mod testing;

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

pub use archiver::{archive, ArchiveOutcome, ArchiveReport};
pub use date::{resolve_date, DateResult, DateSource};
pub use matcher::{match_sidecar, MatchRule, SidecarCandidate, SidecarMatch};
pub use merger::{merge, MergeOutcome, MergeReport};
pub use normalize::normalize;

/// Directory name used by the export for the year being processed.
pub const DEFAULT_SOURCE_DIR: &str = "Photos from 2015";
/// Flat directory that receives merged files and is later archived in place.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

fn default_true() -> bool {
    true
}

/// Options for pairing media with sidecars and writing `<epoch>_<name>` copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeOptions {
    /// Directory holding the exported media files.
    pub source_dir: PathBuf,
    /// Directory holding the sidecar JSON files (usually the same as `source_dir`).
    pub sidecar_dir: PathBuf,
    /// Flat destination directory.
    pub output_dir: PathBuf,
    /// Also match against sidecars already present in `output_dir`.
    #[serde(default = "default_true")]
    pub include_output_sidecars: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            sidecar_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            include_output_sidecars: true,
        }
    }
}

impl MergeOptions {
    /// Media and sidecars in one directory, results in `output_dir`.
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        let source_dir = source_dir.into();
        Self {
            sidecar_dir: source_dir.clone(),
            source_dir,
            output_dir: output_dir.into(),
            include_output_sidecars: true,
        }
    }
}

/// Options for bucketing a flat directory into `<year>/<month>` folders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveOptions {
    pub output_dir: PathBuf,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl ArchiveOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

/// Type alias for progress callback: `(stage, current, total, message)`.
pub type ProgressCallback<'a> = dyn Fn(&str, u64, u64, &str) + 'a;

/// Throttled progress reporter - emits at most every 200ms or on completion.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback<'a>,
    last_emit: Cell<Instant>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: &'a ProgressCallback<'a>) -> Self {
        let start = Instant::now();
        Self {
            inner,
            last_emit: Cell::new(start.checked_sub(Duration::from_secs(1)).unwrap_or(start)),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        let is_done = current + 1 >= total;
        if !is_done {
            if self.last_emit.get().elapsed() < Duration::from_millis(200) {
                return;
            }
            self.last_emit.set(Instant::now());
        }
        (self.inner)(stage, current, total, message);
    }
}

/// Compare two directories, resolving symlinks and `.` where possible.
pub(crate) fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
