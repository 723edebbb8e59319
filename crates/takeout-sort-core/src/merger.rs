use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use filetime::FileTime;
use serde::{Deserialize, Serialize};

use crate::exif_write::embed_jpeg_tags;
use crate::gps::to_exif_gps;
use crate::matcher::{match_sidecar, SidecarCandidate};
use crate::media::{self, MediaFile, MERGE_EXTENSIONS};
use crate::sidecar::{self, Sidecar, SIDECAR_EXTENSION};
use crate::{same_dir, MergeOptions, ProgressCallback, ThrottledProgress};

const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// What happened to one media file during merging.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    Merged {
        /// The renamed copy in the output directory
        output: PathBuf,
        /// The sidecar it was paired with
        sidecar: PathBuf,
    },
    /// No sidecar matched; the media file is left untouched.
    NoSidecar,
    /// The sidecar has no usable `photoTakenTime.timestamp`.
    NoTimestamp(PathBuf),
    /// `<epoch>_<name>` is already in the output directory from an earlier run.
    AlreadyMerged(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeReport {
    pub total_media: u64,
    pub merged: u64,
    pub no_sidecar: u64,
    pub no_timestamp: u64,
    pub already_merged: u64,
    pub failed: u64,
    /// Source sidecars removed after their media were merged
    pub sidecars_removed: u64,
}

impl MergeReport {
    fn record(&mut self, outcome: &MergeOutcome) {
        match outcome {
            MergeOutcome::Merged { .. } => self.merged += 1,
            MergeOutcome::NoSidecar => self.no_sidecar += 1,
            MergeOutcome::NoTimestamp(_) => self.no_timestamp += 1,
            MergeOutcome::AlreadyMerged(_) => self.already_merged += 1,
            MergeOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Pair every media file in `options.source_dir` with its sidecar and write
/// `<epoch>_<name>` copies (plus `<epoch>_<name>.json`) into `options.output_dir`.
///
/// Originals are removed once copied. Source sidecars are removed at the end of the
/// batch, so several media files (an edited copy and its original) can share one.
pub fn merge(
    options: &MergeOptions,
    progress_callback: &ProgressCallback<'_>,
) -> anyhow::Result<MergeReport> {
    let tp = ThrottledProgress::new(progress_callback);
    fs::create_dir_all(&options.output_dir)
        .with_context(|| format!("creating {}", options.output_dir.display()))?;

    let mut media_list = media::scan_media(&options.source_dir, MERGE_EXTENSIONS)?;
    let candidates = collect_candidates(options)?;
    log::debug!(
        "{} media files, {} sidecar candidates",
        media_list.len(),
        candidates.len()
    );

    let total = media_list.len() as u64;
    let mut report = MergeReport {
        total_media: total,
        ..Default::default()
    };
    let mut consumed: BTreeSet<PathBuf> = BTreeSet::new();

    for (i, m) in media_list.iter_mut().enumerate() {
        tp.report("merge", i as u64, total, &m.filename);
        let outcome = match merge_one(m, &candidates, &options.output_dir) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Error processing {}: {:#}", m.filename, e);
                MergeOutcome::Failed(format!("{:#}", e))
            }
        };
        if let MergeOutcome::Merged { sidecar, .. } = &outcome {
            if candidates.iter().any(|c| c.in_source && &c.path == sidecar) {
                consumed.insert(sidecar.clone());
            }
        }
        report.record(&outcome);
    }

    for path in &consumed {
        match fs::remove_file(path) {
            Ok(()) => report.sidecars_removed += 1,
            Err(e) => log::warn!("Could not remove sidecar {}: {}", path.display(), e),
        }
    }

    Ok(report)
}

/// Sidecars from the sidecar directory first, then (optionally) the output directory.
fn collect_candidates(options: &MergeOptions) -> anyhow::Result<Vec<SidecarCandidate>> {
    let mut candidates = sidecars_in(
        &options.sidecar_dir,
        same_dir(&options.sidecar_dir, &options.source_dir),
    )?;
    if options.include_output_sidecars && !same_dir(&options.output_dir, &options.sidecar_dir) {
        candidates.extend(sidecars_in(
            &options.output_dir,
            same_dir(&options.output_dir, &options.source_dir),
        )?);
    }
    Ok(candidates)
}

fn sidecars_in(dir: &Path, in_source: bool) -> anyhow::Result<Vec<SidecarCandidate>> {
    Ok(media::list_files(dir)?
        .into_iter()
        .filter(|p| sidecar::is_sidecar(p))
        .filter_map(|p| SidecarCandidate::new(p, in_source))
        .collect())
}

/// Merge a single media file. Errors are per-file; the caller keeps going.
pub fn merge_one(
    media: &mut MediaFile,
    candidates: &[SidecarCandidate],
    output_dir: &Path,
) -> anyhow::Result<MergeOutcome> {
    let Some(found) = match_sidecar(&media.stem, candidates) else {
        log::warn!("No JSON file found for {}, skipping", media.filename);
        return Ok(MergeOutcome::NoSidecar);
    };
    let sidecar_path = found.candidate.path.clone();
    log::debug!(
        "{} paired with {} ({})",
        media.filename,
        found.candidate.file_name(),
        found.rule
    );
    media.sidecar = Some(sidecar_path.clone());

    let meta = Sidecar::load(&sidecar_path)?;
    let Some(epoch) = meta.timestamp else {
        log::warn!(
            "No photoTakenTime timestamp in {}, skipping {}",
            sidecar_path.display(),
            media.filename
        );
        return Ok(MergeOutcome::NoTimestamp(sidecar_path));
    };

    let new_name = format!("{}_{}", epoch, media.filename);
    let dest = output_dir.join(&new_name);
    if dest.exists() {
        log::info!("{} already merged, leaving source in place", dest.display());
        return Ok(MergeOutcome::AlreadyMerged(dest));
    }

    fs::copy(&media.path, &dest)
        .with_context(|| format!("copying {} to {}", media.path.display(), dest.display()))?;

    if media.is_jpeg() {
        embed_metadata(&dest, &meta, epoch);
    }

    let sidecar_dest = output_dir.join(format!("{}.{}", new_name, SIDECAR_EXTENSION));
    fs::copy(&sidecar_path, &sidecar_dest)
        .with_context(|| format!("copying {}", sidecar_path.display()))?;

    let people = meta.people_names();
    if !people.is_empty() {
        log::info!("People in photo: {}", people.join(", "));
    }

    fs::remove_file(&media.path)
        .with_context(|| format!("removing {}", media.path.display()))?;
    log::info!("Merged {} -> {}", media.filename, new_name);

    Ok(MergeOutcome::Merged {
        output: dest,
        sidecar: sidecar_path,
    })
}

/// Write date and location tags into the copied JPEG, then stamp its file times.
/// Failures are logged; the merged copy is kept either way.
fn embed_metadata(dest: &Path, meta: &Sidecar, epoch: i64) {
    match meta.taken_at() {
        Some(taken) => embed_tags(dest, meta, &taken.format(EXIF_DATETIME_FORMAT).to_string()),
        None => log::warn!(
            "Timestamp {} has no calendar date, not writing EXIF to {}",
            epoch,
            dest.display()
        ),
    }

    let ft = FileTime::from_unix_time(epoch, 0);
    if let Err(e) = filetime::set_file_times(dest, ft, ft) {
        log::warn!("Could not set file times on {}: {}", dest.display(), e);
    }
}

fn embed_tags(dest: &Path, meta: &Sidecar, datetime: &str) {
    if let Some(formatted) = &meta.formatted {
        log::debug!("{}: taken {}", dest.display(), formatted);
    }

    // (0, 0) is what the export writes for "no location".
    let gps = meta
        .geo
        .filter(|g| !g.is_unknown())
        .map(|g| to_exif_gps(g.latitude, g.longitude).with_altitude(g.altitude));
    if let Err(e) = embed_jpeg_tags(dest, datetime, gps.as_ref()) {
        log::warn!("Could not write EXIF to {}: {:#}", dest.display(), e);
    }
}
