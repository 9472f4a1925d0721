use chrono::{DateTime, SecondsFormat, Utc};

use super::escape::xml_escape;
use crate::metadata::{DATE_TIME_ORIGINAL, EmbeddedMetadata, MetadataValue};

/// Camera and file attributes mirrored under `tiff:`.
pub const TIFF_TAGS: &[&str] = &[
    "Make",
    "Model",
    "Orientation",
    "XResolution",
    "YResolution",
    "ResolutionUnit",
    "Software",
    "DateTime",
    "Artist",
    "Copyright",
];

/// Capture conditions mirrored under `exif:`.
pub const EXIF_TAGS: &[&str] = &[
    "ExposureTime",
    "FNumber",
    "ExposureProgram",
    "ISOSpeedRatings",
    "ExifVersion",
    "DateTimeDigitized",
    "ShutterSpeedValue",
    "ApertureValue",
    "BrightnessValue",
    "ExposureBiasValue",
    "MaxApertureValue",
    "MeteringMode",
    "LightSource",
    "Flash",
    "FocalLength",
    "ColorSpace",
    "PixelXDimension",
    "PixelYDimension",
    "FocalPlaneXResolution",
    "FocalPlaneYResolution",
    "FocalPlaneResolutionUnit",
    "SensingMethod",
    "FileSource",
    "SceneType",
    "CustomRendered",
    "ExposureMode",
    "WhiteBalance",
    "DigitalZoomRatio",
    "FocalLengthIn35mmFilm",
    "SceneCaptureType",
    "GainControl",
    "Contrast",
    "Saturation",
    "Sharpness",
    "SubjectDistanceRange",
    "LensSpecification",
    "LensMake",
    "LensModel",
    "BodySerialNumber",
    "ImageUniqueID",
];

/// XMP namespace an embedded field is mirrored into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Tiff,
    Exif,
}

impl Namespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Tiff => "tiff",
            Self::Exif => "exif",
        }
    }
}

/// Look up the namespace of an embedded field name. `tiff` wins if a name
/// were ever listed in both tables.
pub fn classify(name: &str) -> Option<Namespace> {
    if TIFF_TAGS.contains(&name) {
        Some(Namespace::Tiff)
    } else if EXIF_TAGS.contains(&name) {
        Some(Namespace::Exif)
    } else {
        None
    }
}

/// Render every recognized embedded field as a `<ns:Name>…</ns:Name>`
/// fragment, in map order.
///
/// `DateTimeOriginal` is left out: it becomes `xmp:CreateDate` instead.
/// Unsupported values and unrecognized names are skipped.
pub fn render_fragments(metadata: &EmbeddedMetadata) -> Vec<String> {
    let mut fragments = Vec::new();

    for (name, value) in metadata.iter() {
        if name == DATE_TIME_ORIGINAL {
            continue;
        }
        let Some(namespace) = classify(name) else {
            continue;
        };
        let Some(content) = render_value(value) else {
            log::debug!("Skipping {name}: value has no text form");
            continue;
        };

        let tag = format!("{}:{name}", namespace.prefix());
        fragments.push(format!("<{tag}>{content}</{tag}>"));
    }

    fragments
}

fn render_value(value: &MetadataValue) -> Option<String> {
    let content = match value {
        MetadataValue::Text(s) => xml_escape(s),
        MetadataValue::Number(n) => xml_escape(&n.to_string()),
        MetadataValue::Date(dt) => xml_escape(&iso_timestamp(dt)),
        MetadataValue::Sequence(items) => {
            let items: String = items
                .iter()
                .map(|item| format!("<rdf:li>{}</rdf:li>", xml_escape(item)))
                .collect();
            format!("<rdf:Seq>{items}</rdf:Seq>")
        }
        MetadataValue::Unsupported => return None,
    };
    Some(content)
}

/// ISO-8601 UTC timestamp with millisecond precision (`2024-01-15T10:30:45.000Z`).
pub(crate) fn iso_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // ── classify ─────────────────────────────────────────────────────

    #[test]
    fn classify_tiff() {
        assert_eq!(classify("Make"), Some(Namespace::Tiff));
        assert_eq!(classify("Copyright"), Some(Namespace::Tiff));
    }

    #[test]
    fn classify_exif() {
        assert_eq!(classify("FNumber"), Some(Namespace::Exif));
        assert_eq!(classify("LensModel"), Some(Namespace::Exif));
    }

    #[test]
    fn classify_unknown() {
        assert_eq!(classify("MakerNote"), None);
        assert_eq!(classify("GPSLatitude"), None);
        assert_eq!(classify("make"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn tables_disjoint() {
        for name in TIFF_TAGS {
            assert!(!EXIF_TAGS.contains(name), "{name} listed in both tables");
        }
    }

    #[test]
    fn capture_time_not_in_tables() {
        assert_eq!(classify(DATE_TIME_ORIGINAL), None);
    }

    // ── render_fragments ─────────────────────────────────────────────

    #[test]
    fn render_scalars() {
        let metadata: EmbeddedMetadata = [
            ("Make", MetadataValue::from("Canon")),
            ("FNumber", MetadataValue::from(2.8)),
            ("PixelXDimension", MetadataValue::from(6000.0)),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            render_fragments(&metadata),
            [
                "<tiff:Make>Canon</tiff:Make>",
                "<exif:FNumber>2.8</exif:FNumber>",
                "<exif:PixelXDimension>6000</exif:PixelXDimension>",
            ]
        );
    }

    #[test]
    fn render_sequence() {
        let mut metadata = EmbeddedMetadata::new();
        metadata.insert(
            "ISOSpeedRatings",
            MetadataValue::Sequence(vec!["100".into(), "<200>".into()]),
        );

        assert_eq!(
            render_fragments(&metadata),
            ["<exif:ISOSpeedRatings><rdf:Seq><rdf:li>100</rdf:li><rdf:li>&lt;200&gt;</rdf:li></rdf:Seq></exif:ISOSpeedRatings>"]
        );
    }

    #[test]
    fn render_empty_sequence() {
        let mut metadata = EmbeddedMetadata::new();
        metadata.insert("LensSpecification", MetadataValue::Sequence(Vec::new()));
        assert_eq!(
            render_fragments(&metadata),
            ["<exif:LensSpecification><rdf:Seq></rdf:Seq></exif:LensSpecification>"]
        );
    }

    #[test]
    fn render_date() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap();
        let mut metadata = EmbeddedMetadata::new();
        metadata.insert("DateTimeDigitized", dt);

        assert_eq!(
            render_fragments(&metadata),
            ["<exif:DateTimeDigitized>2024-01-15T10:30:45.000Z</exif:DateTimeDigitized>"]
        );
    }

    #[test]
    fn render_escapes_text() {
        let mut metadata = EmbeddedMetadata::new();
        metadata.insert("Copyright", "© Smith & \"Sons\" <studio>");

        assert_eq!(
            render_fragments(&metadata),
            ["<tiff:Copyright>© Smith &amp; &quot;Sons&quot; &lt;studio&gt;</tiff:Copyright>"]
        );
    }

    #[test]
    fn render_skips_unsupported_and_unknown() {
        let metadata: EmbeddedMetadata = [
            ("MakerNote", MetadataValue::Unsupported),
            ("ExifVersion", MetadataValue::Unsupported),
            ("UserComment", MetadataValue::from("hello")),
            ("GPSLatitude", MetadataValue::from(43.65)),
            ("Model", MetadataValue::from("EOS R5")),
        ]
        .into_iter()
        .collect();

        assert_eq!(render_fragments(&metadata), ["<tiff:Model>EOS R5</tiff:Model>"]);
    }

    #[test]
    fn render_skips_capture_time() {
        let mut metadata = EmbeddedMetadata::new();
        metadata.insert(DATE_TIME_ORIGINAL, "2024:01:15 10:30:45");
        metadata.insert("DateTime", "2024:01:16 08:00:00");

        assert_eq!(
            render_fragments(&metadata),
            ["<tiff:DateTime>2024:01:16 08:00:00</tiff:DateTime>"]
        );
    }

    #[test]
    fn render_follows_map_order() {
        let metadata: EmbeddedMetadata = [
            ("LensModel", MetadataValue::from("RF24-70mm")),
            ("Make", MetadataValue::from("Canon")),
        ]
        .into_iter()
        .collect();

        let fragments = render_fragments(&metadata);
        assert!(fragments[0].starts_with("<exif:LensModel>"));
        assert!(fragments[1].starts_with("<tiff:Make>"));
    }

    #[test]
    fn render_empty_map() {
        assert!(render_fragments(&EmbeddedMetadata::new()).is_empty());
    }

    #[test]
    fn iso_timestamp_millis() {
        let dt = Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(iso_timestamp(&dt), "1999-12-31T23:59:59.000Z");
    }
}
