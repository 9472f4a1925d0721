//! XMP sidecar generation.
//!
//! - [`escape`]: XML escaping for every piece of text placed in the document
//! - [`classify`]: mirrors embedded EXIF fields into the `tiff:` and `exif:` namespaces
//! - [`gps`]: decimal degrees to the XMP `D,M,S.ssH` coordinate form
//! - [`sidecar`]: assembles the final `.xmp` document

pub mod classify;
pub mod escape;
pub mod gps;
pub mod sidecar;

pub use classify::{Namespace, classify, render_fragments};
pub use escape::xml_escape;
pub use gps::{Axis, parse_dms, to_dms};
pub use sidecar::{
    Clock, FixedClock, SIDECAR_EXTENSION, SIDECAR_MIME_TYPE, SystemClock, build_sidecar,
    has_embedded_gps, sidecar_file_name,
};
