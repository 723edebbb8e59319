use exif::{Field, In, Rational, Tag, Value};

/// Degrees, minutes, seconds as whole numbers.
pub type Dms = [u32; 3];

/// Decimal-degree position converted to the EXIF GPS representation.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsTags {
    pub latitude_ref: &'static str,
    pub latitude: Dms,
    pub longitude_ref: &'static str,
    pub longitude: Dms,
    /// Metres above sea level, 0 when unknown.
    pub altitude: f64,
}

/// Convert decimal degrees to EXIF GPS tags. Minutes and seconds are truncated.
pub fn to_exif_gps(latitude: f64, longitude: f64) -> GpsTags {
    GpsTags {
        latitude_ref: if latitude >= 0.0 { "N" } else { "S" },
        latitude: to_dms(latitude),
        longitude_ref: if longitude >= 0.0 { "E" } else { "W" },
        longitude: to_dms(longitude),
        altitude: 0.0,
    }
}

fn to_dms(value: f64) -> Dms {
    let d = value.abs();
    let degrees = d.trunc();
    let minutes = ((d - degrees) * 60.0).trunc();
    let seconds = (((d - degrees) * 60.0 - minutes) * 60.0).trunc();
    [degrees as u32, minutes as u32, seconds as u32]
}

fn ascii(tag: Tag, s: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![s.as_bytes().to_vec()]),
    }
}

fn rational(tag: Tag, values: &[(u32, u32)]) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(
            values
                .iter()
                .map(|&(num, denom)| Rational { num, denom })
                .collect(),
        ),
    }
}

fn triple(tag: Tag, dms: Dms) -> Field {
    rational(tag, &[(dms[0], 1), (dms[1], 1), (dms[2], 1)])
}

fn byte(tag: Tag, values: &[u8]) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Byte(values.to_vec()),
    }
}

/// Empty text in the EXIF "character code + text" encoding.
fn undefined_text(tag: Tag) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Undefined(b"ASCII\0\0\0".to_vec(), 0),
    }
}

impl GpsTags {
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    /// The complete GPS tag group. Tags the sidecar cannot supply carry fixed
    /// placeholders; some readers reject a partial group.
    pub fn fields(&self) -> Vec<Field> {
        let (altitude_ref, altitude) = if self.altitude == 0.0 {
            (0, (0, 1))
        } else {
            let cm = (self.altitude.abs() * 100.0).round() as u32;
            (u8::from(self.altitude < 0.0), (cm, 100))
        };

        vec![
            byte(Tag::GPSVersionID, &[2, 2, 0, 0]),
            ascii(Tag::GPSLatitudeRef, self.latitude_ref),
            triple(Tag::GPSLatitude, self.latitude),
            ascii(Tag::GPSLongitudeRef, self.longitude_ref),
            triple(Tag::GPSLongitude, self.longitude),
            byte(Tag::GPSAltitudeRef, &[altitude_ref]),
            rational(Tag::GPSAltitude, &[altitude]),
            triple(Tag::GPSTimeStamp, [0, 0, 0]),
            ascii(Tag::GPSSatellites, ""),
            ascii(Tag::GPSStatus, "A"),
            ascii(Tag::GPSMeasureMode, "3"),
            rational(Tag::GPSDOP, &[(0, 1)]),
            ascii(Tag::GPSSpeedRef, "K"),
            rational(Tag::GPSSpeed, &[(0, 1)]),
            ascii(Tag::GPSTrackRef, "T"),
            rational(Tag::GPSTrack, &[(0, 1)]),
            ascii(Tag::GPSImgDirectionRef, "M"),
            rational(Tag::GPSImgDirection, &[(0, 1)]),
            ascii(Tag::GPSMapDatum, "WGS-84"),
            ascii(Tag::GPSDestLatitudeRef, "N"),
            triple(Tag::GPSDestLatitude, [0, 0, 0]),
            ascii(Tag::GPSDestLongitudeRef, "E"),
            triple(Tag::GPSDestLongitude, [0, 0, 0]),
            ascii(Tag::GPSDestBearingRef, "M"),
            rational(Tag::GPSDestBearing, &[(0, 1)]),
            ascii(Tag::GPSDestDistanceRef, "K"),
            rational(Tag::GPSDestDistance, &[(0, 1)]),
            undefined_text(Tag::GPSProcessingMethod),
            undefined_text(Tag::GPSAreaInformation),
            ascii(Tag::GPSDateStamp, ""),
            Field {
                tag: Tag::GPSDifferential,
                ifd_num: In::PRIMARY,
                value: Value::Short(vec![0]),
            },
        ]
    }
}
