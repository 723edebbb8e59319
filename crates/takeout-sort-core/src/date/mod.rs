pub mod exif;
pub mod guess;
pub mod json;

use std::fmt;
use std::path::Path;

use chrono::{Datelike, NaiveDateTime};

/// Earliest capture year accepted from any source.
pub const MIN_YEAR: i32 = 1900;

/// Outcome of consulting one date source.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    /// The source has nothing (or nothing usable) for this file.
    NotFound,
    /// The source exists but could not be read or parsed.
    Malformed(String),
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(v) => Some(v),
            _ => None,
        }
    }
}

/// Where a resolved date came from, in rank order (most trusted first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateSource {
    Exif,
    Sidecar,
    Filename,
}

impl DateSource {
    pub const RANKED: [DateSource; 3] = [DateSource::Exif, DateSource::Sidecar, DateSource::Filename];

    fn lookup(self, path: &Path) -> Lookup<NaiveDateTime> {
        match self {
            DateSource::Exif => exif::read_exif_date(path),
            DateSource::Sidecar => json::read_sidecar_date(path),
            DateSource::Filename => {
                let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                guess::date_from_filename(filename)
            }
        }
    }
}

impl fmt::Display for DateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DateSource::Exif => "EXIF",
            DateSource::Sidecar => "sidecar JSON",
            DateSource::Filename => "filename",
        })
    }
}

/// Result of date extraction: date + the source it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateResult {
    pub date: NaiveDateTime,
    pub source: DateSource,
}

/// Resolve the capture date of the file at `path`, trying sources in rank order.
///
/// A source that is missing, unreadable or out of range falls through to the next one.
/// `None` means no source produced a date; there is no synthetic fallback.
pub fn resolve_date(path: &Path) -> Option<DateResult> {
    for source in DateSource::RANKED {
        match source.lookup(path) {
            Lookup::Found(date) => {
                log::debug!("{}: date {} from {}", path.display(), date, source);
                return Some(DateResult { date, source });
            }
            Lookup::NotFound => {}
            Lookup::Malformed(reason) => {
                log::warn!("{}: unreadable {} date: {}", path.display(), source, reason);
            }
        }
    }
    None
}

/// Years 1900 through the current year are plausible capture dates.
pub fn in_valid_range(date: &NaiveDateTime) -> bool {
    (MIN_YEAR..=chrono::Local::now().year()).contains(&date.year())
}

/// Convert UTC epoch seconds to local naive datetime.
pub fn epoch_to_local(epoch: i64) -> Option<NaiveDateTime> {
    let utc = chrono::DateTime::from_timestamp(epoch, 0)?;
    Some(utc.with_timezone(&chrono::Local).naive_local())
}
