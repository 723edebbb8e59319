use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;

use crate::date::epoch_to_local;

/// Extension of the export's metadata sidecars.
pub const SIDECAR_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum SidecarError {
    #[error("failed to read sidecar {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid sidecar JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSidecar {
    #[serde(default)]
    photo_taken_time: Option<RawTakenTime>,
    #[serde(default)]
    geo_data: Option<RawGeoData>,
    #[serde(default)]
    people: Vec<RawPerson>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTakenTime {
    #[serde(default)]
    timestamp: Option<serde_json::Value>,
    #[serde(default)]
    formatted: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGeoData {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    altitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPerson {
    #[serde(default)]
    name: String,
}

/// Location block of a sidecar. Missing components read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeoData {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl GeoData {
    /// The export writes `0.0, 0.0` when it has no location.
    pub fn is_unknown(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

/// Capture metadata carried by one sidecar JSON file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sidecar {
    /// `photoTakenTime.timestamp`, epoch seconds
    pub timestamp: Option<i64>,
    /// `photoTakenTime.formatted`, human readable
    pub formatted: Option<String>,
    pub geo: Option<GeoData>,
    pub people: Vec<String>,
}

impl Sidecar {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let raw: RawSidecar = serde_json::from_slice(bytes)?;

        let (timestamp, formatted) = match raw.photo_taken_time {
            Some(t) => (t.timestamp.as_ref().and_then(parse_timestamp), t.formatted),
            None => (None, None),
        };
        let geo = raw.geo_data.map(|g| GeoData {
            latitude: g.latitude.unwrap_or(0.0),
            longitude: g.longitude.unwrap_or(0.0),
            altitude: g.altitude.unwrap_or(0.0),
        });
        let people = raw.people.into_iter().map(|p| p.name).collect();

        Ok(Self {
            timestamp,
            formatted,
            geo,
            people,
        })
    }

    pub fn load(path: &Path) -> Result<Self, SidecarError> {
        let bytes = fs::read(path).map_err(|source| SidecarError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&bytes).map_err(|source| SidecarError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Capture time as local wall-clock time.
    pub fn taken_at(&self) -> Option<NaiveDateTime> {
        epoch_to_local(self.timestamp?)
    }

    /// Names of tagged people, skipping blanks.
    pub fn people_names(&self) -> Vec<&str> {
        self.people
            .iter()
            .map(|n| n.as_str())
            .filter(|n| !n.is_empty())
            .collect()
    }
}

/// The export writes the timestamp as a decimal string; some tools write a number.
fn parse_timestamp(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

/// Whether `path` looks like a sidecar JSON file.
pub fn is_sidecar(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(SIDECAR_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_sidecar() {
        let json = br#"{
            "title": "IMG_1234.jpg",
            "photoTakenTime": {"timestamp": "1000000000", "formatted": "Sep 9, 2001, 1:46:40 AM UTC"},
            "geoData": {"latitude": -33.86, "longitude": 151.2, "altitude": 12.5},
            "people": [{"name": "Alice"}, {"name": ""}, {"name": "Bob"}]
        }"#;
        let sidecar = Sidecar::from_slice(json).unwrap();
        assert_eq!(sidecar.timestamp, Some(1_000_000_000));
        assert_eq!(sidecar.formatted.as_deref(), Some("Sep 9, 2001, 1:46:40 AM UTC"));
        let geo = sidecar.geo.unwrap();
        assert_eq!(geo.latitude, -33.86);
        assert_eq!(geo.altitude, 12.5);
        assert_eq!(sidecar.people_names(), vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_numeric_timestamp() {
        let sidecar = Sidecar::from_slice(br#"{"photoTakenTime": {"timestamp": 1552564800}}"#).unwrap();
        assert_eq!(sidecar.timestamp, Some(1_552_564_800));
        assert!(sidecar.taken_at().is_some());
    }

    #[test]
    fn test_missing_fields() {
        let sidecar = Sidecar::from_slice(b"{}").unwrap();
        assert_eq!(sidecar, Sidecar::default());
        assert!(sidecar.taken_at().is_none());

        let sidecar = Sidecar::from_slice(br#"{"photoTakenTime": {"timestamp": "soon"}}"#).unwrap();
        assert_eq!(sidecar.timestamp, None);

        let sidecar = Sidecar::from_slice(br#"{"geoData": {"latitude": 1.5}}"#).unwrap();
        let geo = sidecar.geo.unwrap();
        assert_eq!(geo.longitude, 0.0);
        assert!(!geo.is_unknown());
    }

    #[test]
    fn test_malformed_json() {
        assert!(Sidecar::from_slice(b"{not json").is_err());
        assert!(Sidecar::from_slice(br#"{"people": "nobody"}"#).is_err());
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, b"[").unwrap();
        let err = Sidecar::load(&path).unwrap_err();
        assert!(matches!(err, SidecarError::Json { .. }));
        assert!(err.to_string().contains("broken.json"));

        let err = Sidecar::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, SidecarError::Io { .. }));
    }

    #[test]
    fn test_is_sidecar() {
        assert!(is_sidecar(Path::new("photo.jpg.json")));
        assert!(is_sidecar(Path::new("photo.JSON")));
        assert!(!is_sidecar(Path::new("photo.jpg")));
    }
}
