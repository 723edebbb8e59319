use std::sync::LazyLock;

use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

/// Media extension left on sidecar stems (`photo.jpg` from `photo.jpg.json`), optionally
/// followed by the duplicate counter the export appends after it (`photo.jpg(1)`).
static MEDIA_EXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(?:jpe?g|png|gif|heic|mp4|mov|bmp|tiff?|webp)(?P<counter>\(\d+\))?$").unwrap()
});
static NUMBERING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\d+\)").unwrap());
static EDITED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)-edited(?P<counter>\(\d+\))?$").unwrap());
static P_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_p(?P<counter>\(\d+\))?$").unwrap());
static HUMAN_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})-(\d{2})-(\d{2})\s+(\d{2})\.(\d{2})\.(\d{2})").unwrap()
});
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static TRAILING_UNDERSCORES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+$").unwrap());

/// Collapse superficial filename variants onto one canonical form.
///
/// Drops a trailing media extension, `(n)` numbering groups that are followed by other
/// text, `-edited` and `_p` suffixes, whitespace, dots and trailing underscores, and
/// rewrites `YYYY-MM-DD HH.MM.SS` as `YYYYMMDD_HHMMSS`. A terminal `(n)` is kept: it is
/// the duplicate counter, and [`crate::matcher`] strips it as a separate, looser rule.
///
/// The pass is repeated until the name is stable, so `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(name: &str) -> String {
    let mut current: String = name.nfc().collect();
    loop {
        let next: String = normalize_pass(&current).nfc().collect();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_pass(name: &str) -> String {
    let name = MEDIA_EXT_RE.replace(name, "${counter}");

    let len = name.len();
    let name = NUMBERING_RE.replace_all(&name, |caps: &Captures| {
        let terminal = caps.get(0).map_or(false, |m| m.end() == len);
        if terminal {
            caps[0].to_string()
        } else {
            String::new()
        }
    });

    // Both suffixes may sit in front of the duplicate counter: `x-edited(1)`.
    let name = EDITED_RE.replace(&name, "${counter}");
    let name = P_SUFFIX_RE.replace(&name, "${counter}");
    let name = HUMAN_DATE_RE.replace_all(&name, "${1}${2}${3}_${4}${5}${6}");
    let name = WHITESPACE_RE.replace_all(&name, "");
    let name = name.replace('.', "");
    TRAILING_UNDERSCORES_RE.replace(&name, "").into_owned()
}
