use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::{in_valid_range, Lookup};

static DATE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]{8}").unwrap());

/// Guess a capture date from a `YYYYMMDD` run in the file name.
///
/// Every 8-digit run is tried left to right, so a leading epoch prefix such as
/// `1552560000_` does not hide a date later in the name.
pub fn date_from_filename(filename: &str) -> Lookup<NaiveDateTime> {
    let basename = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    for run in DATE_RUN_RE.find_iter(basename) {
        let Ok(date) = NaiveDate::parse_from_str(run.as_str(), "%Y%m%d") else {
            continue;
        };
        let Some(dt) = date.and_hms_opt(0, 0, 0) else {
            continue;
        };
        if in_valid_range(&dt) {
            return Lookup::Found(dt);
        }
    }

    Lookup::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guess(name: &str) -> Option<NaiveDate> {
        date_from_filename(name).found().map(|dt| dt.date())
    }

    #[test]
    fn test_guess_patterns() {
        assert_eq!(guess("IMG_20190314_154733.jpg"), NaiveDate::from_ymd_opt(2019, 3, 14));
        assert_eq!(guess("Screenshot_20190919-053857.png"), NaiveDate::from_ymd_opt(2019, 9, 19));
        assert_eq!(guess("1552560000_IMG_20190314.jpg"), NaiveDate::from_ymd_opt(2019, 3, 14));
        assert_eq!(guess("random_photo.jpg"), None);
    }

    #[test]
    fn test_rejects_implausible_dates() {
        assert_eq!(guess("IMG_18991231.jpg"), None);
        assert_eq!(guess("IMG_20191340.jpg"), None);
        assert_eq!(guess("IMG_99990101.jpg"), None);
    }
}
