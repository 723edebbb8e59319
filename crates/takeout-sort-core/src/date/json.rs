use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use super::{in_valid_range, Lookup};
use crate::sidecar::Sidecar;

/// Leading `<epoch>_` added when a file was merged.
static RENAME_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+_").unwrap());

/// One way of deriving a sidecar path from a media path.
#[derive(Debug, Clone, Copy)]
pub struct SidecarRule {
    /// Undo a previous merge rename before swapping the extension.
    pub strip_rename_prefix: bool,
    /// Replacement for the media file's extension.
    pub extension: &'static str,
}

impl SidecarRule {
    pub fn candidate(&self, media: &Path) -> Option<PathBuf> {
        let base = if self.strip_rename_prefix {
            let name = media.file_name()?.to_str()?;
            media.with_file_name(&*RENAME_PREFIX_RE.replace(name, ""))
        } else {
            media.to_path_buf()
        };
        Some(base.with_extension(self.extension))
    }
}

const fn rule(strip_rename_prefix: bool, extension: &'static str) -> SidecarRule {
    SidecarRule {
        strip_rename_prefix,
        extension,
    }
}

/// Sidecar locations tried in order; the first existing, parseable, in-range one wins.
pub const SIDECAR_RULES: &[SidecarRule] = &[
    rule(false, "jpg.json"),
    rule(false, "jpeg.json"),
    rule(false, "png.json"),
    rule(false, "gif.json"),
    rule(false, "mp4.json"),
    rule(false, "bmp.json"),
    rule(false, "json"),
    rule(true, "json"),
    rule(true, "bmp.json"),
];

/// Candidate sidecar paths for `media`, in rule order, without repeats.
pub fn sidecar_candidates(media: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::with_capacity(SIDECAR_RULES.len());
    for candidate in SIDECAR_RULES.iter().filter_map(|r| r.candidate(media)) {
        if candidate != media && !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

/// Read `photoTakenTime` from the first usable sidecar next to `media`.
pub fn read_sidecar_date(media: &Path) -> Lookup<NaiveDateTime> {
    let mut malformed: Option<String> = None;

    for candidate in sidecar_candidates(media) {
        if !candidate.is_file() {
            continue;
        }
        let sidecar = match Sidecar::load(&candidate) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Error reading JSON data: {}", e);
                malformed = Some(e.to_string());
                continue;
            }
        };
        match sidecar.taken_at() {
            Some(dt) if in_valid_range(&dt) => return Lookup::Found(dt),
            Some(dt) => log::debug!("{}: sidecar date {} out of range", candidate.display(), dt),
            None => {}
        }
    }

    match malformed {
        Some(reason) => Lookup::Malformed(reason),
        None => Lookup::NotFound,
    }
}
