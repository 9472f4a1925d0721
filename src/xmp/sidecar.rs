use chrono::{DateTime, Utc};

use super::classify::{iso_timestamp, render_fragments};
use super::escape::xml_escape;
use super::gps::{Axis, to_dms};
use crate::ai::AnalysisResult;
use crate::metadata::{
    DATE_TIME_ORIGINAL, EmbeddedMetadata, GPS_LATITUDE, GPS_LONGITUDE, MetadataValue,
};

/// Extension substituted for the image's own.
pub const SIDECAR_EXTENSION: &str = "xmp";

/// Media type of a sidecar document.
pub const SIDECAR_MIME_TYPE: &str = "application/rdf+xml;charset=utf-8";

const XMP_HEADER: &str = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/" x:xmptk="Adobe XMP Core 5.6-c140 79.160451, 2017/05/06-01:08:21        ">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about=""
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:xmp="http://ns.adobe.com/xap/1.0/"
    xmlns:exif="http://ns.adobe.com/exif/1.0/"
    xmlns:tiff="http://ns.adobe.com/tiff/1.0/"
    xmlns:Iptc4xmpCore="http://iptc.org/std/Iptc4xmpCore/1.0/xmlns/">
"#;

const XMP_FOOTER: &str = "  </rdf:Description>
 </rdf:RDF>
</x:xmpmeta>";

/// Source of the fallback capture time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always the same instant; makes sidecar output reproducible.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Build the XMP sidecar document for one image.
///
/// Layout, in order: `dc:title`, `dc:description`, `dc:subject` keywords,
/// `xmp:CreateDate`, the embedded `tiff:`/`exif:` fields, then
/// `Iptc4xmpCore:Location` and the AI coordinates.
///
/// `xmp:CreateDate` is the embedded `DateTimeOriginal` when it parses as a
/// date, otherwise `clock.now()`. AI coordinates are written only when the
/// image carries no GPS of its own (see [`has_embedded_gps`]) and the AI
/// supplied both of them.
///
/// Every piece of text from the image or the AI is escaped; an empty
/// `metadata` map is fine and yields a document built from the AI fields.
pub fn build_sidecar(
    result: &AnalysisResult,
    metadata: &EmbeddedMetadata,
    clock: &dyn Clock,
) -> String {
    let create_date = metadata
        .date(DATE_TIME_ORIGINAL)
        .unwrap_or_else(|| clock.now());

    let mut body: Vec<String> = Vec::new();
    body.push(format!(
        "<xmp:CreateDate>{}</xmp:CreateDate>",
        xml_escape(&iso_timestamp(&create_date))
    ));
    body.extend(render_fragments(metadata));
    body.extend(location_fragments(result, metadata));

    let mut xmp = String::from(XMP_HEADER);
    push_alt(&mut xmp, "dc:title", &result.title);
    push_alt(&mut xmp, "dc:description", &result.description);

    xmp.push_str("   <dc:subject>\n    <rdf:Bag>\n");
    for tag in &result.tags {
        xmp.push_str(&format!("     <rdf:li>{}</rdf:li>\n", xml_escape(tag)));
    }
    xmp.push_str("    </rdf:Bag>\n   </dc:subject>\n");

    for fragment in &body {
        xmp.push_str("   ");
        xmp.push_str(fragment);
        xmp.push('\n');
    }

    xmp.push_str(XMP_FOOTER);
    xmp
}

fn push_alt(xmp: &mut String, tag: &str, text: &str) {
    xmp.push_str(&format!(
        "   <{tag}>\n    <rdf:Alt>\n     <rdf:li xml:lang=\"x-default\">{}</rdf:li>\n    </rdf:Alt>\n   </{tag}>\n",
        xml_escape(text)
    ));
}

/// Location name and coordinate fragments, after precedence is applied.
fn location_fragments(result: &AnalysisResult, metadata: &EmbeddedMetadata) -> Vec<String> {
    let mut fragments = Vec::new();

    if let Some(location) = result.location.as_deref().filter(|l| !l.is_empty()) {
        fragments.push(format!(
            "<Iptc4xmpCore:Location>{}</Iptc4xmpCore:Location>",
            xml_escape(location)
        ));
    }

    if has_embedded_gps(metadata) {
        if result.latitude.is_some() || result.longitude.is_some() {
            log::debug!("Keeping embedded GPS; AI coordinates not written");
        }
        return fragments;
    }

    match result.coordinates() {
        Some((lat, lon)) => {
            fragments.push(format!(
                "<exif:GPSLatitude>{}</exif:GPSLatitude>",
                xml_escape(&to_dms(lat, Axis::Latitude))
            ));
            fragments.push(format!(
                "<exif:GPSLongitude>{}</exif:GPSLongitude>",
                xml_escape(&to_dms(lon, Axis::Longitude))
            ));
        }
        None if result.latitude.is_some() || result.longitude.is_some() => {
            log::debug!("Incomplete AI coordinates; GPS not written");
        }
        None => {}
    }

    fragments
}

/// Whether the image already carries usable GPS coordinates.
///
/// Both `GPSLatitude` and `GPSLongitude` must hold a value (a finite number
/// or non-blank text). A pair of numeric zeros is a placeholder written by
/// some cameras without a fix and does not count.
pub fn has_embedded_gps(metadata: &EmbeddedMetadata) -> bool {
    let usable = |name: &str| match metadata.get(name) {
        Some(MetadataValue::Number(n)) => n.is_finite(),
        Some(MetadataValue::Text(s)) => !s.trim().is_empty(),
        _ => false,
    };

    if !usable(GPS_LATITUDE) || !usable(GPS_LONGITUDE) {
        return false;
    }

    !matches!(
        (metadata.number(GPS_LATITUDE), metadata.number(GPS_LONGITUDE)),
        (Some(lat), Some(lon)) if lat == 0.0 && lon == 0.0
    )
}

/// Sidecar file name for an image: the name up to its last `.`, plus `.xmp`.
/// A name without a usable base (`IMG_0001`, `.jpg`) is kept whole.
pub fn sidecar_file_name(image_name: &str) -> String {
    let base = match image_name.rfind('.') {
        Some(idx) if idx > 0 => &image_name[..idx],
        _ => image_name,
    };
    format!("{base}.{SIDECAR_EXTENSION}")
}
