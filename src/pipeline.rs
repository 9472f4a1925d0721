use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::ai::{AiService, AnalysisResult};
use crate::config::Config;
use crate::metadata::{self, EmbeddedMetadata};
use crate::session::IncomingFile;
use crate::xmp::{self, Clock};

/// Supported image extensions.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// The result of processing a single image.
///
/// # Example
///
/// ```rust,no_run
/// # use xmp_sidecar_ai::ai::GeminiService;
/// # use xmp_sidecar_ai::config::Config;
/// # use xmp_sidecar_ai::pipeline::process_image;
/// # use xmp_sidecar_ai::xmp::SystemClock;
/// # async fn example() -> anyhow::Result<()> {
/// # let config = Config::default();
/// let service = GeminiService::new(&config.gemini)?;
/// let result = process_image("photo.jpg".as_ref(), &service, &config, &SystemClock).await;
///
/// if result.error.is_none() {
///     println!("Embedded fields: {}", result.embedded_fields);
///     if let Some(ref sidecar) = result.sidecar_path {
///         println!("Sidecar: {}", sidecar.display());
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ProcessResult {
    pub path: PathBuf,
    pub ai_result: Option<AnalysisResult>,
    /// Number of fields decoded from the image's own metadata.
    pub embedded_fields: usize,
    /// `true` when the image carried GPS, so AI coordinates were not used.
    pub embedded_gps: bool,
    /// The composed document.
    pub sidecar: Option<String>,
    /// Where the document was written; `None` on dry runs.
    pub sidecar_path: Option<PathBuf>,
    pub error: Option<String>,
}

/// Collect supported image files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively (following symlinks). Only JPEG files are included.
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_image(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && is_supported_image(p) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Check if a file has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// MIME type of an image, from its extension.
pub fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Describe a file on disk for [`Session::add_files`](crate::session::Session::add_files).
pub fn incoming_file(path: &Path) -> Result<IncomingFile> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();
    Ok(IncomingFile {
        path: path.to_path_buf(),
        name: file_name(path),
        size,
        mime_type: mime_type(path).to_string(),
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Write a sidecar document into `dir`, named after the image.
pub fn write_sidecar(dir: &Path, image_name: &str, document: &str) -> Result<PathBuf> {
    let sidecar_path = dir.join(xmp::sidecar_file_name(image_name));
    std::fs::write(&sidecar_path, document)
        .with_context(|| format!("Failed to write {}", sidecar_path.display()))?;
    log::debug!("Sidecar written: {}", sidecar_path.display());
    Ok(sidecar_path)
}

/// Compose the sidecar for an already-analyzed image.
///
/// Embedded metadata that cannot be read is treated as absent.
pub fn compose_for_image(
    image_bytes: &[u8],
    result: &AnalysisResult,
    clock: &dyn Clock,
) -> (String, EmbeddedMetadata) {
    let embedded = metadata::read_metadata_or_empty(image_bytes);
    let document = xmp::build_sidecar(result, &embedded, clock);
    (document, embedded)
}

/// Process a single image through the full pipeline.
///
/// 1. **Read**: loads the image and decodes its embedded metadata
/// 2. **Analyze**: sends the image to the AI service
/// 3. **Compose**: merges both into an XMP sidecar
/// 4. **Write**: saves `<name>.xmp` next to the image, or into
///    `output.dir` (skipped on dry runs)
///
/// Failures are reported in [`ProcessResult::error`]; unreadable embedded
/// metadata is not a failure.
pub async fn process_image(
    path: &Path,
    service: &dyn AiService,
    config: &Config,
    clock: &dyn Clock,
) -> ProcessResult {
    let mut result = ProcessResult {
        path: path.to_path_buf(),
        ..Default::default()
    };

    let image_bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            result.error = Some(format!("Failed to read file: {e}"));
            return result;
        }
    };
    let image_base64 =
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &image_bytes);

    let location = config.location();
    let analysis = match service
        .analyze(&image_base64, mime_type(path), location)
        .await
    {
        Ok(analysis) => analysis.with_location(location),
        Err(e) => {
            log::warn!("  {} failed: {e:#}", service.name());
            result.error = Some(format!("{e:#}"));
            return result;
        }
    };

    let (document, embedded) = compose_for_image(&image_bytes, &analysis, clock);
    result.embedded_fields = embedded.len();
    result.embedded_gps = xmp::has_embedded_gps(&embedded);

    if !config.output.dry_run {
        let dir = match &config.output.dir {
            Some(dir) => dir.clone(),
            None => path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        match write_sidecar(&dir, &file_name(path), &document) {
            Ok(p) => result.sidecar_path = Some(p),
            Err(e) => result.error = Some(format!("{e:#}")),
        }
    }

    result.ai_result = Some(analysis);
    result.sidecar = Some(document);
    result
}
