use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::media::{self, MediaFile, ARCHIVE_EXTENSIONS};
use crate::{ArchiveOptions, ProgressCallback, ThrottledProgress};

/// What happened to one file during archiving.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveOutcome {
    Moved(PathBuf),
    /// No source produced a date; the file stays where it is.
    Unresolved,
    /// A file with the same name already occupies the target; nothing was moved.
    DestinationExists(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveReport {
    pub total_media: u64,
    pub moved: u64,
    pub unresolved: u64,
    pub failed: u64,
}

impl ArchiveReport {
    fn record(&mut self, outcome: &ArchiveOutcome) {
        match outcome {
            ArchiveOutcome::Moved(_) => self.moved += 1,
            ArchiveOutcome::Unresolved => self.unresolved += 1,
            ArchiveOutcome::DestinationExists(_) | ArchiveOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Move every supported media file in `options.output_dir` into `<year>/<MM>/`.
pub fn archive(
    options: &ArchiveOptions,
    progress_callback: &ProgressCallback<'_>,
) -> anyhow::Result<ArchiveReport> {
    let tp = ThrottledProgress::new(progress_callback);
    let output_dir = &options.output_dir;
    let mut report = ArchiveReport::default();

    if !output_dir.is_dir() {
        log::error!("Output directory not found: {}", output_dir.display());
        return Ok(report);
    }

    let mut media_list = media::scan_media(output_dir, ARCHIVE_EXTENSIONS)?;
    let total = media_list.len() as u64;
    report.total_media = total;

    for (i, m) in media_list.iter_mut().enumerate() {
        tp.report("archive", i as u64, total, &m.filename);
        let outcome = archive_file(m, output_dir);
        report.record(&outcome);
    }

    Ok(report)
}

/// Resolve the date of one file and move it under `root/<year>/<MM>/`.
pub fn archive_file(media: &mut MediaFile, root: &Path) -> ArchiveOutcome {
    let Some(resolved) = media.resolve_date() else {
        log::warn!("Could not get date taken for {}", media.filename);
        return ArchiveOutcome::Unresolved;
    };

    let month_dir = root
        .join(resolved.date.year().to_string())
        .join(format!("{:02}", resolved.date.month()));
    if let Err(e) = fs::create_dir_all(&month_dir) {
        log::error!("Error creating {}: {}", month_dir.display(), e);
        return ArchiveOutcome::Failed(e.to_string());
    }

    let dest = month_dir.join(&media.filename);
    match move_no_clobber(&media.path, &dest) {
        Ok(()) => {
            log::info!("Moved {} to {} ({})", media.filename, month_dir.display(), resolved.source);
            ArchiveOutcome::Moved(dest)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            log::error!("Error moving {}: {} already exists", media.filename, dest.display());
            ArchiveOutcome::DestinationExists(dest)
        }
        Err(e) => {
            log::error!("Error moving {}: {}", media.filename, e);
            ArchiveOutcome::Failed(e.to_string())
        }
    }
}

/// Move `src` to `dest`, refusing to replace an existing `dest`.
///
/// Falls back to copy + remove when a plain rename is not possible (e.g. across
/// filesystems); the copy creates `dest` exclusively.
pub(crate) fn move_no_clobber(src: &Path, dest: &Path) -> io::Result<()> {
    if dest.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", dest.display()),
        ));
    }
    if fs::rename(src, dest).is_ok() {
        return Ok(());
    }

    let mut out = BufWriter::new(OpenOptions::new().write(true).create_new(true).open(dest)?);
    let copied = File::open(src)
        .and_then(|f| io::copy(&mut BufReader::new(f), &mut out))
        .and_then(|_| out.flush());
    if let Err(e) = copied {
        let _ = fs::remove_file(dest);
        return Err(e);
    }
    fs::remove_file(src)
}
