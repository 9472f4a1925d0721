//! # xmp-sidecar-ai
//!
//! Generate XMP sidecar files for JPEG photos. A vision model (Google Gemini)
//! supplies a title, a description and keywords; the photo's own EXIF fields
//! are carried over into the same RDF/XML document.
//!
//! ## Quick Start
//!
//! The pipeline module handles the full read → analyze → compose → write flow:
//!
//! ```rust,no_run
//! use xmp_sidecar_ai::ai::GeminiService;
//! use xmp_sidecar_ai::config::Config;
//! use xmp_sidecar_ai::pipeline::{collect_images, process_image};
//! use xmp_sidecar_ai::xmp::SystemClock;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!     let service = GeminiService::new(&config.gemini)?;
//!
//!     for path in &collect_images(&[PathBuf::from("./photos")]) {
//!         let result = process_image(path, &service, &config, &SystemClock).await;
//!
//!         if let Some(ref err) = result.error {
//!             eprintln!("Error processing {}: {err}", path.display());
//!         } else if let Some(ref sidecar) = result.sidecar_path {
//!             println!("Sidecar XMP written: {}", sidecar.display());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level Usage
//!
//! Composition is a pure function of the analysis, the embedded metadata and
//! a clock:
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use xmp_sidecar_ai::ai::AnalysisResult;
//! use xmp_sidecar_ai::metadata::EmbeddedMetadata;
//! use xmp_sidecar_ai::xmp::{FixedClock, build_sidecar, sidecar_file_name};
//!
//! let result = AnalysisResult {
//!     title: "Harbour Front".into(),
//!     description: "Boats moored at the harbour.".into(),
//!     tags: vec!["harbour".into()],
//!     ..Default::default()
//! };
//! let mut embedded = EmbeddedMetadata::new();
//! embedded.insert("Make", "Canon");
//!
//! let clock = FixedClock(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());
//! let document = build_sidecar(&result, &embedded, &clock);
//! assert!(document.contains("<tiff:Make>Canon</tiff:Make>"));
//! assert_eq!(sidecar_file_name("IMG_0042.jpg"), "IMG_0042.xmp");
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: AI service trait, prompt, response parsing and the Gemini client
//! - [`config`]: Configuration types and loading/saving
//! - [`metadata`]: Embedded EXIF extraction into an ordered field map
//! - [`xmp`]: Escaping, namespace classification, GPS formatting and sidecar composition
//! - [`session`]: Per-file analysis state for a batch
//! - [`pipeline`]: High-level processing pipeline and image collection

pub mod ai;
pub mod config;
pub mod metadata;
pub mod pipeline;
pub mod session;
pub mod xmp;
