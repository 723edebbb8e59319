//! Fixtures shared by unit tests.

use std::io::Cursor;
use std::path::Path;

use chrono::NaiveDate;
use exif::{Field, In, Tag, Value};

/// SOI followed directly by EOI.
pub const MINIMAL_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xD9];

/// A JPEG whose only segment is an APP1 EXIF block carrying `DateTimeOriginal`.
pub fn jpeg_with_exif_date(datetime: &str) -> Vec<u8> {
    let field = Field {
        tag: Tag::DateTimeOriginal,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![datetime.as_bytes().to_vec()]),
    };
    let mut writer = exif::experimental::Writer::new();
    writer.push_field(&field);
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let segment_len = u16::try_from(2 + 6 + tiff.len()).unwrap();
    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// First ASCII value of `tag` in the primary image, if present.
pub fn read_ascii_tag(path: &Path, tag: Tag) -> Option<String> {
    let file = std::fs::File::open(path).ok()?;
    let exif = exif::Reader::new()
        .read_from_container(&mut std::io::BufReader::new(file))
        .ok()?;
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(parts) => parts.first().map(|p| String::from_utf8_lossy(p).into_owned()),
        _ => None,
    }
}

/// Epoch seconds of noon UTC on the given day.
pub fn epoch_of(year: i32, month: u32, day: u32) -> i64 {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp()
}
