use anyhow::{Context, Result};
use chrono::Utc;
use nom_exif::*;
use std::io::Cursor;

use super::{EmbeddedMetadata, GPS_LATITUDE, GPS_LONGITUDE, MetadataValue, parse_datetime};

/// EXIF tag codes and the field names they are reported under.
///
/// GPS tags are absent on purpose: coordinates go through nom-exif's GPS
/// parser and are reported as decimal degrees.
const TAG_NAMES: &[(u16, &str)] = &[
    // IFD0
    (0x010E, "ImageDescription"),
    (0x010F, "Make"),
    (0x0110, "Model"),
    (0x0112, "Orientation"),
    (0x011A, "XResolution"),
    (0x011B, "YResolution"),
    (0x0128, "ResolutionUnit"),
    (0x0131, "Software"),
    (0x0132, "DateTime"),
    (0x013B, "Artist"),
    (0x8298, "Copyright"),
    // Exif IFD
    (0x829A, "ExposureTime"),
    (0x829D, "FNumber"),
    (0x8822, "ExposureProgram"),
    (0x8827, "ISOSpeedRatings"),
    (0x9000, "ExifVersion"),
    (0x9003, "DateTimeOriginal"),
    (0x9004, "DateTimeDigitized"),
    (0x9010, "OffsetTime"),
    (0x9011, "OffsetTimeOriginal"),
    (0x9201, "ShutterSpeedValue"),
    (0x9202, "ApertureValue"),
    (0x9203, "BrightnessValue"),
    (0x9204, "ExposureBiasValue"),
    (0x9205, "MaxApertureValue"),
    (0x9207, "MeteringMode"),
    (0x9208, "LightSource"),
    (0x9209, "Flash"),
    (0x920A, "FocalLength"),
    (0x927C, "MakerNote"),
    (0x9286, "UserComment"),
    (0x9291, "SubSecTimeOriginal"),
    (0xA001, "ColorSpace"),
    (0xA002, "PixelXDimension"),
    (0xA003, "PixelYDimension"),
    (0xA20E, "FocalPlaneXResolution"),
    (0xA20F, "FocalPlaneYResolution"),
    (0xA210, "FocalPlaneResolutionUnit"),
    (0xA217, "SensingMethod"),
    (0xA300, "FileSource"),
    (0xA301, "SceneType"),
    (0xA401, "CustomRendered"),
    (0xA402, "ExposureMode"),
    (0xA403, "WhiteBalance"),
    (0xA404, "DigitalZoomRatio"),
    (0xA405, "FocalLengthIn35mmFilm"),
    (0xA406, "SceneCaptureType"),
    (0xA407, "GainControl"),
    (0xA408, "Contrast"),
    (0xA409, "Saturation"),
    (0xA40A, "Sharpness"),
    (0xA40C, "SubjectDistanceRange"),
    (0xA420, "ImageUniqueID"),
    (0xA431, "BodySerialNumber"),
    (0xA432, "LensSpecification"),
    (0xA433, "LensMake"),
    (0xA434, "LensModel"),
];

fn tag_name(code: u16) -> Option<&'static str> {
    TAG_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Decode the EXIF metadata embedded in raw image bytes.
///
/// Fields whose tag code is not in the known vocabulary are skipped.
/// Returns an error when the bytes are not a recognizable image or carry no
/// EXIF block at all.
pub fn read_metadata(bytes: &[u8]) -> Result<EmbeddedMetadata> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::seekable(Cursor::new(bytes)).context("Unrecognized image data")?;
    let iter: ExifIter = parser.parse(ms).context("No EXIF data found")?;

    // GPS is parsed from the iterator before it is consumed below
    let gps_info = iter.parse_gps_info().ok().flatten();

    let mut data = EmbeddedMetadata::new();

    for mut entry in iter {
        // IFD1 describes the embedded thumbnail, not the photo
        if entry.ifd_index() != 0 {
            continue;
        }
        let code = entry.tag_code();
        let Some(name) = tag_name(code) else {
            log::trace!("Skipping unknown EXIF tag 0x{code:04x}");
            continue;
        };
        let Some(value) = entry.take_value() else {
            continue;
        };
        if let Some(value) = entry_to_value(code, value) {
            data.insert(name, value);
        }
    }

    if let Some(gps) = gps_info {
        data.insert(
            GPS_LATITUDE,
            latlng_to_decimal(&gps.latitude, gps.latitude_ref),
        );
        data.insert(
            GPS_LONGITUDE,
            latlng_to_decimal(&gps.longitude, gps.longitude_ref),
        );
    }

    log::debug!("Decoded {} embedded metadata field(s)", data.len());
    Ok(data)
}

/// Like [`read_metadata`], but a failed extraction yields an empty map.
pub fn read_metadata_or_empty(bytes: &[u8]) -> EmbeddedMetadata {
    match read_metadata(bytes) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("Could not read embedded metadata: {e:#}");
            EmbeddedMetadata::default()
        }
    }
}

/// Normalize an EXIF entry value. Empty text yields `None`.
fn entry_to_value(code: u16, val: EntryValue) -> Option<MetadataValue> {
    let value = match val {
        EntryValue::Text(s) => {
            let s = s.trim().trim_matches('\0').trim();
            if s.is_empty() {
                return None;
            }
            MetadataValue::Text(s.to_string())
        }
        EntryValue::Time(dt) => MetadataValue::Date(dt.with_timezone(&Utc)),
        // No offset recorded: the wall-clock time is taken as UTC
        EntryValue::NaiveDateTime(ndt) => MetadataValue::Date(ndt.and_utc()),
        EntryValue::URational(r) => rational(r.0 as f64, r.1 as f64),
        EntryValue::IRational(r) => rational(r.0 as f64, r.1 as f64),
        EntryValue::U8(n) => MetadataValue::Number(n as f64),
        EntryValue::U16(n) => MetadataValue::Number(n as f64),
        EntryValue::U32(n) => MetadataValue::Number(n as f64),
        EntryValue::I16(n) => MetadataValue::Number(n as f64),
        EntryValue::I32(n) => MetadataValue::Number(n as f64),
        EntryValue::F32(n) => MetadataValue::Number(n as f64),
        EntryValue::F64(n) => MetadataValue::Number(n),
        EntryValue::U16Array(v) => {
            MetadataValue::Sequence(v.iter().map(|n| n.to_string()).collect())
        }
        EntryValue::U32Array(v) => {
            MetadataValue::Sequence(v.iter().map(|n| n.to_string()).collect())
        }
        EntryValue::URationalArray(v) => MetadataValue::Sequence(
            v.iter()
                .map(|r| format_rational(r.0 as f64, r.1 as f64))
                .collect(),
        ),
        EntryValue::Undefined(bytes) => undefined_to_value(code, &bytes),
        // Anything else with a date-like text form
        other => match parse_datetime(&other.to_string()) {
            Some(dt) => MetadataValue::Date(dt),
            None => MetadataValue::Unsupported,
        },
    };
    Some(value)
}

/// Decode an UNDEFINED-typed field.
///
/// Version strings (`0232`) are printable ASCII and become text. Single-byte
/// enumerations such as `FileSource` and `SceneType` become numbers.
/// `UserComment` is decoded when its character code is ASCII. Anything else,
/// maker notes included, has no text form.
fn undefined_to_value(code: u16, bytes: &[u8]) -> MetadataValue {
    const MAKER_NOTE: u16 = 0x927C;
    const USER_COMMENT: u16 = 0x9286;

    match code {
        MAKER_NOTE => MetadataValue::Unsupported,
        USER_COMMENT => match bytes.strip_prefix(b"ASCII\0\0\0") {
            Some(text) => ascii_text(text).unwrap_or(MetadataValue::Unsupported),
            None => MetadataValue::Unsupported,
        },
        _ if bytes.len() == 1 => MetadataValue::Number(bytes[0] as f64),
        _ => ascii_text(bytes).unwrap_or(MetadataValue::Unsupported),
    }
}

/// Printable ASCII (NUL padding allowed at the end) as text.
fn ascii_text(bytes: &[u8]) -> Option<MetadataValue> {
    let text = std::str::from_utf8(bytes).ok()?;
    let text = text.trim_end_matches('\0').trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
        return None;
    }
    Some(MetadataValue::Text(text.to_string()))
}

fn rational(num: f64, den: f64) -> MetadataValue {
    if den == 0.0 {
        MetadataValue::Unsupported
    } else {
        MetadataValue::Number(num / den)
    }
}

fn format_rational(num: f64, den: f64) -> String {
    if den == 0.0 {
        String::new()
    } else {
        (num / den).to_string()
    }
}

/// Convert a nom-exif LatLng (3 URationals: deg, min, sec) to decimal degrees.
fn latlng_to_decimal(latlng: &LatLng, reference: char) -> f64 {
    let degrees = latlng.0.0 as f64 / latlng.0.1 as f64;
    let minutes = latlng.1.0 as f64 / latlng.1.1 as f64;
    let seconds = latlng.2.0 as f64 / latlng.2.1 as f64;

    let mut coord = degrees + minutes / 60.0 + seconds / 3600.0;

    if reference == 'S' || reference == 'W' {
        coord = -coord;
    }

    coord
}
