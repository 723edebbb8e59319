use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::{anyhow, Context as _};
use exif::{Context, Field, In, Reader, Tag, Value};
use img_parts::jpeg::Jpeg;
use img_parts::{Bytes, ImageEXIF};

use crate::gps::GpsTags;

/// Tags the writer lays out itself; copying them from the old block would corrupt it.
const STRUCTURAL_TAGS: &[Tag] = &[
    Tag::ExifIFDPointer,
    Tag::GPSInfoIFDPointer,
    Tag::InteropIFDPointer,
    Tag::JPEGInterchangeFormat,
    Tag::JPEGInterchangeFormatLength,
    Tag::StripOffsets,
    Tag::StripByteCounts,
    Tag::TileOffsets,
    Tag::TileByteCounts,
];

const DATE_TAGS: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

/// Write `DateTimeOriginal`, `DateTimeDigitized` and `DateTime` (and optionally the GPS
/// group) into the JPEG at `path`, keeping its other primary-image EXIF fields.
///
/// `datetime` must already be in EXIF form, `YYYY:MM:DD HH:MM:SS`.
pub fn embed_jpeg_tags(path: &Path, datetime: &str, gps: Option<&GpsTags>) -> anyhow::Result<()> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut jpeg = Jpeg::from_bytes(Bytes::from(bytes))
        .map_err(|e| anyhow!("parsing JPEG {}: {}", path.display(), e))?;

    let mut fields = existing_fields(&jpeg, gps.is_some());
    for tag in DATE_TAGS {
        fields.push(Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![datetime.as_bytes().to_vec()]),
        });
    }
    if let Some(gps) = gps {
        fields.extend(gps.fields());
    }

    let mut writer = exif::experimental::Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut buf = Cursor::new(Vec::new());
    writer
        .write(&mut buf, false)
        .with_context(|| format!("encoding EXIF for {}", path.display()))?;

    jpeg.set_exif(Some(Bytes::from(buf.into_inner())));
    fs::write(path, jpeg.encoder().bytes()).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Primary-image fields of the current EXIF block that survive the rewrite.
fn existing_fields(jpeg: &Jpeg, replace_gps: bool) -> Vec<Field> {
    let Some(raw) = jpeg.exif() else {
        return Vec::new();
    };
    let exif = match Reader::new().read_raw(raw.to_vec()) {
        Ok(exif) => exif,
        Err(e) => {
            log::debug!("Discarding unreadable EXIF block: {}", e);
            return Vec::new();
        }
    };

    exif.fields()
        .filter(|f| f.ifd_num == In::PRIMARY)
        .filter(|f| !STRUCTURAL_TAGS.contains(&f.tag) && !DATE_TAGS.contains(&f.tag))
        .filter(|f| !(replace_gps && f.tag.context() == Context::Gps))
        .map(|f| Field {
            tag: f.tag,
            ifd_num: f.ifd_num,
            value: f.value.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::to_exif_gps;
    use crate::testing::{jpeg_with_exif_date, read_ascii_tag, MINIMAL_JPEG};

    #[test]
    fn test_embed_dates_and_gps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        fs::write(&path, MINIMAL_JPEG).unwrap();

        let gps = to_exif_gps(-33.86, 151.2);
        embed_jpeg_tags(&path, "2001:09:09 01:46:40", Some(&gps)).unwrap();

        for tag in DATE_TAGS {
            assert_eq!(read_ascii_tag(&path, tag).as_deref(), Some("2001:09:09 01:46:40"));
        }
        assert_eq!(read_ascii_tag(&path, Tag::GPSLatitudeRef).as_deref(), Some("S"));
        assert_eq!(read_ascii_tag(&path, Tag::GPSLongitudeRef).as_deref(), Some("E"));
        assert_eq!(read_ascii_tag(&path, Tag::GPSMapDatum).as_deref(), Some("WGS-84"));
    }

    #[test]
    fn test_replaces_existing_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        fs::write(&path, jpeg_with_exif_date("1999:12:31 23:59:59")).unwrap();

        embed_jpeg_tags(&path, "2019:03:14 12:00:00", None).unwrap();

        assert_eq!(
            read_ascii_tag(&path, Tag::DateTimeOriginal).as_deref(),
            Some("2019:03:14 12:00:00")
        );
        assert_eq!(read_ascii_tag(&path, Tag::GPSLatitudeRef), None);
    }

    #[test]
    fn test_rejects_non_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        fs::write(&path, b"definitely not a jpeg").unwrap();
        assert!(embed_jpeg_tags(&path, "2019:03:14 12:00:00", None).is_err());
    }
}
