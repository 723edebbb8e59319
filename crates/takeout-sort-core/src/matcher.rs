use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::normalize;

static TERMINAL_NUMBERING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\d+\)$").unwrap());
static DATE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{8}_\d{6}").unwrap());
static DECORATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\d+\)|-\w+$|_\w+$").unwrap());

/// Rung of the matching ladder that paired a media file with its sidecar,
/// from most to least specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRule {
    /// Sidecar stem starts with the raw media stem.
    Prefix,
    /// Normalized stems are equal.
    Normalized,
    /// Normalized stems are equal once a trailing `(n)` is dropped.
    Numbering,
    /// Both normalized stems carry the same `YYYYMMDD_HHMMSS` token.
    DateToken,
    /// Normalized stems are equal once numbering and a trailing `-word`/`_word` are dropped.
    Decoration,
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchRule::Prefix => "prefix",
            MatchRule::Normalized => "normalized",
            MatchRule::Numbering => "numbering",
            MatchRule::DateToken => "date-token",
            MatchRule::Decoration => "decoration",
        };
        f.write_str(name)
    }
}

/// A sidecar JSON file that a media file may be paired with.
#[derive(Debug, Clone)]
pub struct SidecarCandidate {
    pub path: PathBuf,
    /// File name without the final `.json`
    pub stem: String,
    /// Whether the sidecar lives in the media source directory
    pub in_source: bool,
    normalized: String,
}

impl SidecarCandidate {
    pub fn new(path: PathBuf, in_source: bool) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?.to_string();
        let normalized = normalize(&stem);
        Some(Self {
            path,
            stem,
            in_source,
            normalized,
        })
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.stem)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SidecarMatch<'a> {
    pub candidate: &'a SidecarCandidate,
    pub rule: MatchRule,
}

fn strip_numbering(name: &str) -> String {
    TERMINAL_NUMBERING_RE.replace(name, "").into_owned()
}

fn strip_decorations(name: &str) -> String {
    DECORATION_RE.replace_all(name, "").into_owned()
}

/// Find the sidecar for `media_stem` (file name without extension).
///
/// Rules are tried in order of specificity and the first candidate satisfying the
/// earliest rule wins, so candidate order breaks ties within a rule.
pub fn match_sidecar<'a>(
    media_stem: &str,
    candidates: &'a [SidecarCandidate],
) -> Option<SidecarMatch<'a>> {
    if media_stem.is_empty() {
        return None;
    }

    let hit = |rule: MatchRule, pred: &dyn Fn(&SidecarCandidate) -> bool| {
        candidates
            .iter()
            .find(|c| pred(c))
            .map(|candidate| SidecarMatch { candidate, rule })
    };

    if let Some(m) = hit(MatchRule::Prefix, &|c: &SidecarCandidate| {
        c.stem.starts_with(media_stem)
    }) {
        return Some(m);
    }

    let normalized = normalize(media_stem);
    if normalized.is_empty() {
        return None;
    }

    if let Some(m) = hit(MatchRule::Normalized, &|c: &SidecarCandidate| {
        c.normalized == normalized
    }) {
        return Some(m);
    }

    let base = strip_numbering(&normalized);
    if let Some(m) = hit(MatchRule::Numbering, &|c: &SidecarCandidate| {
        strip_numbering(&c.normalized) == base
    }) {
        return Some(m);
    }

    if let Some(token) = DATE_TOKEN_RE.find(&normalized) {
        let token = token.as_str();
        if let Some(m) = hit(MatchRule::DateToken, &|c: &SidecarCandidate| {
            c.normalized.contains(token)
        }) {
            return Some(m);
        }
    }

    let clean = strip_decorations(&normalized);
    if clean.is_empty() {
        return None;
    }
    hit(MatchRule::Decoration, &|c: &SidecarCandidate| {
        strip_decorations(&c.normalized) == clean
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(stems: &[&str]) -> Vec<SidecarCandidate> {
        stems
            .iter()
            .filter_map(|s| SidecarCandidate::new(PathBuf::from(format!("src/{s}.json")), true))
            .collect()
    }

    fn matched(media_stem: &str, stems: &[&str]) -> Option<(String, MatchRule)> {
        let cands = candidates(stems);
        match_sidecar(media_stem, &cands).map(|m| (m.candidate.stem.clone(), m.rule))
    }

    #[test]
    fn test_prefix_rule() {
        assert_eq!(
            matched("IMG_1234", &["IMG_1234.jpg", "IMG_9999.jpg"]),
            Some(("IMG_1234.jpg".to_string(), MatchRule::Prefix))
        );
    }

    #[test]
    fn test_normalized_rule() {
        assert_eq!(
            matched("IMG_1234-edited", &["IMG_1234.jpg"]),
            Some(("IMG_1234.jpg".to_string(), MatchRule::Normalized))
        );
        assert_eq!(
            matched("Screenshot 2021-06-15 14.30.00", &["Screenshot20210615_143000"]),
            Some(("Screenshot20210615_143000".to_string(), MatchRule::Normalized))
        );
    }

    #[test]
    fn test_duplicate_counter_prefers_own_sidecar() {
        assert_eq!(
            matched("photo(1)", &["photo.jpg", "photo.jpg(1)"]),
            Some(("photo.jpg(1)".to_string(), MatchRule::Normalized))
        );
    }

    #[test]
    fn test_numbering_rule() {
        assert_eq!(
            matched("photo(1)", &["photo"]),
            Some(("photo".to_string(), MatchRule::Numbering))
        );
    }

    #[test]
    fn test_edited_duplicate_pairs_with_original_sidecar() {
        assert_eq!(
            matched("IMG_1234-edited(1)", &["IMG_1234"]),
            Some(("IMG_1234".to_string(), MatchRule::Numbering))
        );
        assert_eq!(
            matched("IMG_1234-edited(1)", &["IMG_1234.jpg"]),
            Some(("IMG_1234.jpg".to_string(), MatchRule::Numbering))
        );
    }

    #[test]
    fn test_date_token_rule() {
        assert_eq!(
            matched("20210615_143000", &["VID_20210615_143000_export"]),
            Some(("VID_20210615_143000_export".to_string(), MatchRule::DateToken))
        );
        assert_eq!(
            matched("VID_20210615_143000_export", &["20210615_143000"]),
            Some(("20210615_143000".to_string(), MatchRule::DateToken))
        );
    }

    #[test]
    fn test_decoration_rule() {
        assert_eq!(
            matched("beach-collage", &["beach-animation"]),
            Some(("beach-animation".to_string(), MatchRule::Decoration))
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(matched("sunset", &["IMG_1234.jpg", "holiday.jpg"]), None);
        assert_eq!(matched("sunset", &[]), None);
        assert_eq!(matched("", &["anything"]), None);
    }

    #[test]
    fn test_earlier_candidate_wins_within_rule() {
        let mut cands = candidates(&["photo.jpg"]);
        cands.extend(SidecarCandidate::new(PathBuf::from("out/photo.jpg.json"), false));
        let m = match_sidecar("photo", &cands).unwrap();
        assert!(m.candidate.in_source);
        assert_eq!(m.rule, MatchRule::Prefix);
    }
}
