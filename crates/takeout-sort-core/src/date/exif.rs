use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};

use super::{in_valid_range, Lookup};

/// Whether the leading bytes belong to a container that carries EXIF tags (JPEG or TIFF).
pub fn supports_embedded_tags(header: &[u8]) -> bool {
    header.starts_with(&[0xFF, 0xD8, 0xFF])
        || header.starts_with(b"II*\0")
        || header.starts_with(b"MM\0*")
}

/// Read `DateTimeOriginal` from a JPEG or TIFF file.
/// EXIF datetimes have no timezone info - they are local time as-is.
pub fn read_exif_date(path: &Path) -> Lookup<NaiveDateTime> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => return Lookup::Malformed(e.to_string()),
    };
    let mut reader = BufReader::new(file);
    match reader.fill_buf() {
        Ok(header) if supports_embedded_tags(header) => {}
        Ok(_) => return Lookup::NotFound,
        Err(e) => return Lookup::Malformed(e.to_string()),
    }

    let exif = match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Lookup::NotFound,
        Err(e) => return Lookup::Malformed(e.to_string()),
    };

    let Some(field) = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY) else {
        return Lookup::NotFound;
    };
    let raw = match &field.value {
        Value::Ascii(parts) => parts.first().map(|p| String::from_utf8_lossy(p).into_owned()),
        _ => None,
    };
    let Some(raw) = raw else {
        return Lookup::Malformed("DateTimeOriginal is not an ASCII value".to_string());
    };

    match parse_exif_datetime(&raw) {
        Some(dt) if in_valid_range(&dt) => Lookup::Found(dt),
        Some(dt) => {
            log::debug!("{}: EXIF date {} out of range", path.display(), dt);
            Lookup::NotFound
        }
        None => Lookup::Malformed(format!("unparseable DateTimeOriginal {:?}", raw)),
    }
}

/// Parse the EXIF `YYYY:MM:DD HH:MM:SS` form.
pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let cleaned = s.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    NaiveDateTime::parse_from_str(cleaned, "%Y:%m:%d %H:%M:%S").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{jpeg_with_exif_date, MINIMAL_JPEG};
    use std::fs;

    #[test]
    fn test_parse_exif_datetime() {
        assert!(parse_exif_datetime("2019:03:14 09:26:53").is_some());
        assert!(parse_exif_datetime("2019:03:14 09:26:53\0").is_some());
        assert!(parse_exif_datetime("0000:00:00 00:00:00").is_none());
        assert!(parse_exif_datetime("2019-03-14").is_none());
    }

    #[test]
    fn test_sniffing() {
        assert!(supports_embedded_tags(MINIMAL_JPEG));
        assert!(supports_embedded_tags(b"II*\0rest"));
        assert!(supports_embedded_tags(b"MM\0*rest"));
        assert!(!supports_embedded_tags(b"\x89PNG\r\n"));
        assert!(!supports_embedded_tags(b""));
    }

    #[test]
    fn test_read_exif_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");

        fs::write(&path, jpeg_with_exif_date("2019:03:14 09:26:53")).unwrap();
        assert!(matches!(read_exif_date(&path), Lookup::Found(_)));

        fs::write(&path, jpeg_with_exif_date("1850:01:01 00:00:00")).unwrap();
        assert_eq!(read_exif_date(&path), Lookup::NotFound);

        fs::write(&path, jpeg_with_exif_date("garbage")).unwrap();
        assert!(matches!(read_exif_date(&path), Lookup::Malformed(_)));

        fs::write(&path, MINIMAL_JPEG).unwrap();
        assert_eq!(read_exif_date(&path), Lookup::NotFound);
    }

    #[test]
    fn test_png_is_not_consulted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        fs::write(&path, b"\x89PNG\r\n\x1a\n").unwrap();
        assert_eq!(read_exif_date(&path), Lookup::NotFound);
    }
}
