//! Hand-built JPEG files with EXIF blocks, for tests that exercise the real
//! extraction path.

const ASCII: u16 = 2;
const SHORT: u16 = 3;
const LONG: u16 = 4;
const RATIONAL: u16 = 5;
const UNDEFINED: u16 = 7;

/// A single IFD field for the test TIFF writer.
pub(crate) enum Field {
    Ascii(&'static str),
    Short(u16),
    Rationals(Vec<(u32, u32)>),
    Undefined(&'static [u8]),
    /// Offset of another IFD in the same block, by index.
    Pointer(usize),
}

impl Field {
    fn encode(&self, ifd_offsets: &[u32]) -> (u16, u32, Vec<u8>) {
        match self {
            Field::Ascii(s) => {
                let mut bytes = s.as_bytes().to_vec();
                bytes.push(0);
                (ASCII, bytes.len() as u32, bytes)
            }
            Field::Short(n) => (SHORT, 1, n.to_le_bytes().to_vec()),
            Field::Rationals(values) => {
                let bytes = values
                    .iter()
                    .flat_map(|(n, d)| n.to_le_bytes().into_iter().chain(d.to_le_bytes()))
                    .collect();
                (RATIONAL, values.len() as u32, bytes)
            }
            Field::Undefined(bytes) => (UNDEFINED, bytes.len() as u32, bytes.to_vec()),
            Field::Pointer(idx) => (LONG, 1, ifd_offsets[*idx].to_le_bytes().to_vec()),
        }
    }
}

/// Little-endian TIFF block. IFDs are laid out back to back after the
/// header, with out-of-line values after the last IFD. `ifd1` names the
/// IFD chained after IFD0, if any.
pub(crate) fn tiff_block(ifds: &[Vec<(u16, Field)>], ifd1: Option<usize>) -> Vec<u8> {
    let mut offsets = Vec::new();
    let mut pos = 8u32;
    for ifd in ifds {
        offsets.push(pos);
        pos += 2 + 12 * ifd.len() as u32 + 4;
    }

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());

    let mut data = Vec::new();
    for (i, ifd) in ifds.iter().enumerate() {
        tiff.extend_from_slice(&(ifd.len() as u16).to_le_bytes());
        for (tag, field) in ifd {
            let (kind, count, mut bytes) = field.encode(&offsets);
            tiff.extend_from_slice(&tag.to_le_bytes());
            tiff.extend_from_slice(&kind.to_le_bytes());
            tiff.extend_from_slice(&count.to_le_bytes());
            if bytes.len() <= 4 {
                bytes.resize(4, 0);
                tiff.extend_from_slice(&bytes);
            } else {
                let offset = pos + data.len() as u32;
                tiff.extend_from_slice(&offset.to_le_bytes());
                if bytes.len() % 2 == 1 {
                    bytes.push(0);
                }
                data.extend_from_slice(&bytes);
            }
        }
        let next = match (i, ifd1) {
            (0, Some(idx)) => offsets[idx],
            _ => 0,
        };
        tiff.extend_from_slice(&next.to_le_bytes());
    }
    tiff.extend_from_slice(&data);
    tiff
}

/// Wrap a TIFF block in a JPEG APP1 segment. A comment segment pads the
/// file well past the parser's 128-byte header probe.
pub(crate) fn jpeg_with_tiff(tiff: &[u8]) -> Vec<u8> {
    let mut app1 = b"Exif\0\0".to_vec();
    app1.extend_from_slice(tiff);

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
    jpeg.extend_from_slice(&app1);

    let comment = [b' '; 256];
    jpeg.extend_from_slice(&[0xFF, 0xFE]);
    jpeg.extend_from_slice(&((comment.len() + 2) as u16).to_be_bytes());
    jpeg.extend_from_slice(&comment);

    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

/// IFD0 with `Make` and `Model` only.
pub(crate) fn jpeg_with_exif() -> Vec<u8> {
    jpeg_with_tiff(&tiff_block(
        &[vec![
            (0x010F, Field::Ascii("Canon")),
            (0x0110, Field::Ascii("EOS")),
        ]],
        None,
    ))
}

/// IFD0 (landscape), an Exif IFD, a GPS IFD for Toronto, and a
/// thumbnail IFD1 with its own orientation and resolution.
pub(crate) fn jpeg_with_gps_and_thumbnail() -> Vec<u8> {
    const EXIF: usize = 1;
    const GPS: usize = 2;
    const THUMBNAIL: usize = 3;

    let ifd0 = vec![
        (0x010F, Field::Ascii("Sony")),
        (0x0112, Field::Short(1)),
        (0x011A, Field::Rationals(vec![(300, 1)])),
        (0x8769, Field::Pointer(EXIF)),
        (0x8825, Field::Pointer(GPS)),
    ];
    let exif = vec![
        (0x829D, Field::Rationals(vec![(28, 10)])),
        (0x9000, Field::Undefined(b"0232")),
        (0x9003, Field::Ascii("2024:06:01 10:30:00")),
        (0xA300, Field::Undefined(&[3])),
    ];
    let gps = vec![
        (0x0001, Field::Ascii("N")),
        (0x0002, Field::Rationals(vec![(43, 1), (39, 1), (1152, 100)])),
        (0x0003, Field::Ascii("W")),
        (0x0004, Field::Rationals(vec![(79, 1), (22, 1), (5952, 100)])),
    ];
    let thumbnail = vec![
        (0x0112, Field::Short(6)),
        (0x011A, Field::Rationals(vec![(72, 1)])),
    ];

    jpeg_with_tiff(&tiff_block(&[ifd0, exif, gps, thumbnail], Some(THUMBNAIL)))
}
