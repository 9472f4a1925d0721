//! XMP GPS coordinates.
//!
//! XMP stores `exif:GPSLatitude` / `exif:GPSLongitude` as `D,M,S.ssH`:
//! whole degrees, whole minutes, seconds with two decimals and a hemisphere
//! letter. The sign of the decimal input picks the hemisphere.

/// Which coordinate is being encoded; decides the hemisphere letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn hemisphere(&self, coordinate: f64) -> char {
        let positive = coordinate >= 0.0;
        match (self, positive) {
            (Self::Latitude, true) => 'N',
            (Self::Latitude, false) => 'S',
            (Self::Longitude, true) => 'E',
            (Self::Longitude, false) => 'W',
        }
    }
}

const CENTISECONDS_PER_DEGREE: u64 = 360_000;
const CENTISECONDS_PER_MINUTE: u64 = 6_000;

/// Encode decimal degrees as `D,M,S.ssH`.
///
/// The value is rounded once, to the nearest hundredth of a second, and then
/// split with integer division, so seconds never read `60.00`: a carry rolls
/// into the minutes (and degrees) instead.
pub fn to_dms(coordinate: f64, axis: Axis) -> String {
    let hemisphere = axis.hemisphere(coordinate);
    let total = (coordinate.abs() * CENTISECONDS_PER_DEGREE as f64).round() as u64;

    let degrees = total / CENTISECONDS_PER_DEGREE;
    let rest = total % CENTISECONDS_PER_DEGREE;
    let minutes = rest / CENTISECONDS_PER_MINUTE;
    let centis = rest % CENTISECONDS_PER_MINUTE;

    format!(
        "{degrees},{minutes},{}.{:02}{hemisphere}",
        centis / 100,
        centis % 100
    )
}

/// Decode a `D,M,S.ssH` coordinate back to signed decimal degrees.
///
/// Returns `None` for anything that is not in that form, including a
/// hemisphere letter that does not fit the axis.
pub fn parse_dms(value: &str, axis: Axis) -> Option<f64> {
    let value = value.trim();
    let hemisphere = value.chars().last()?;
    let sign = match (axis, hemisphere) {
        (Axis::Latitude, 'N') | (Axis::Longitude, 'E') => 1.0,
        (Axis::Latitude, 'S') | (Axis::Longitude, 'W') => -1.0,
        _ => return None,
    };

    let body = &value[..value.len() - hemisphere.len_utf8()];
    let mut parts = body.split(',');
    let degrees: f64 = parts.next()?.trim().parse().ok()?;
    let minutes: f64 = parts.next()?.trim().parse().ok()?;
    let seconds: f64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || minutes >= 60.0 || seconds >= 60.0 {
        return None;
    }

    Some(sign * (degrees + minutes / 60.0 + seconds / 3600.0))
}
