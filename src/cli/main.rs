use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;

use xmp_sidecar_ai::ai::GeminiService;
use xmp_sidecar_ai::metadata::{self, MetadataValue};
use xmp_sidecar_ai::session::{FileId, FileStatus, Session};
use xmp_sidecar_ai::xmp::SystemClock;
use xmp_sidecar_ai::{config, pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "xmp-sidecar-ai",
    version,
    about = "Generate XMP sidecars for JPEG photos: AI titles, descriptions and keywords merged with the camera's own metadata"
)]
struct Cli {
    /// JPEG files or directories to process
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Where the photos were taken; sent to the model and written to the sidecar
    #[arg(short, long, value_name = "TEXT")]
    location: Option<String>,

    /// Compose sidecars without writing any files
    #[arg(long)]
    dry_run: bool,

    /// Directory for .xmp files (default: next to each image)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Print each sidecar document to stdout
    #[arg(long)]
    print: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Display the embedded metadata of each image and exit
    #[arg(long = "show-metadata")]
    show_metadata: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No input files or directories specified. Use --help for usage.");
    }

    let images = pipeline::collect_images(&cli.paths);
    if images.is_empty() {
        anyhow::bail!("No JPEG files found in the specified paths.");
    }

    if cli.show_metadata {
        for image_path in &images {
            print_metadata(image_path)?;
        }
        return Ok(());
    }

    let mut config = config::Config::load(cli.config.as_deref())?;
    if cli.dry_run {
        config.output.dry_run = true;
    }
    if cli.location.is_some() {
        config.location = cli.location.clone();
    }
    if cli.output.is_some() {
        config.output.dir = cli.output.clone();
    }
    if let Some(dir) = &config.output.dir {
        std::fs::create_dir_all(dir)?;
    }

    let service = Arc::new(GeminiService::new(&config.gemini)?);

    let mut session = Session::new(config.limits.clone());
    let mut incoming = Vec::new();
    for path in &images {
        match pipeline::incoming_file(path) {
            Ok(file) => incoming.push(file),
            Err(e) => log::warn!("{e:#}"),
        }
    }
    for rejection in session.add_files(incoming) {
        log::warn!("{rejection}");
    }
    if session.is_empty() {
        anyhow::bail!("No images accepted for analysis.");
    }

    log::info!("Analyzing {} image(s)", session.len());
    if let Some(location) = config.location() {
        log::info!("Location: {location}");
    }
    if config.output.dry_run {
        log::info!("DRY RUN: no sidecars will be written");
    }

    let config = Arc::new(config);
    let mut tasks = JoinSet::new();
    for entry in session.start_analysis() {
        let service = Arc::clone(&service);
        let config = Arc::clone(&config);
        tasks.spawn(async move {
            log::info!("Processing: {}", entry.path.display());
            let result =
                pipeline::process_image(&entry.path, service.as_ref(), &config, &SystemClock)
                    .await;
            (entry.id, result)
        });
    }

    let mut results: Vec<(FileId, pipeline::ProcessResult)> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (id, result) = joined?;
        match (&result.error, &result.ai_result) {
            (None, Some(ai)) => {
                session.mark_analyzed(&id, ai.clone());
                log::info!("  {}: \"{}\"", id.name, ai.title);
                if result.embedded_gps {
                    log::info!("  {}: kept embedded GPS", id.name);
                }
                if let Some(ref sidecar) = result.sidecar_path {
                    log::info!("  Sidecar XMP: {}", sidecar.display());
                }
            }
            (Some(err), _) => {
                session.mark_failed(&id, err.clone());
                log::error!("  {}: {err}", id.name);
            }
            (None, None) => session.mark_failed(&id, "No analysis result"),
        }
        results.push((id, result));
    }

    // Report in selection order, not completion order
    let order: Vec<FileId> = session.files().iter().map(|f| f.id.clone()).collect();
    results.sort_by_key(|(id, _)| order.iter().position(|o| o == id));

    if cli.print {
        for (_, result) in &results {
            if let Some(ref document) = result.sidecar {
                println!("{document}");
            }
        }
    }

    if cli.json {
        let json_results: Vec<serde_json::Value> = results
            .iter()
            .map(|(id, r)| {
                serde_json::json!({
                    "path": r.path.display().to_string(),
                    "id": id.to_string(),
                    "ai_result": r.ai_result,
                    "embedded_fields": r.embedded_fields,
                    "embedded_gps": r.embedded_gps,
                    "sidecar_path": r.sidecar_path.as_ref().map(|p| p.display().to_string()),
                    "error": r.error,
                })
            })
            .collect();

        println!("{}", serde_json::to_string_pretty(&json_results)?);
    }

    let failed = session
        .files()
        .iter()
        .filter(|f| matches!(f.status, FileStatus::Failed(_)))
        .count();
    let total = session.len();
    log::info!(
        "Done: {} succeeded, {failed} failed out of {total} images",
        total - failed
    );
    if session.all_analyzed() && !config.output.dry_run {
        log::info!("All sidecars written");
    }

    Ok(())
}

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (tag column width + " : " = 25 chars + 2 leading spaces).
const INDENT: &str = "                           ";

/// Print the embedded metadata of a file, one field per row.
fn print_metadata(path: &std::path::Path) -> Result<()> {
    let bytes = std::fs::read(path)?;
    let data = metadata::read_metadata_or_empty(&bytes);

    println!();
    println!("{BOLD}File:{RESET} {}", path.display());
    println!("{DIM}{}{RESET}", "═".repeat(72));

    if data.is_empty() {
        println!("  {DIM}(no embedded metadata found){RESET}");
        println!();
        return Ok(());
    }

    for (name, value) in data.iter() {
        if let Some(text) = display_value(value) {
            print_row(name, &text);
        }
    }
    println!();
    Ok(())
}

fn display_value(value: &MetadataValue) -> Option<String> {
    match value {
        MetadataValue::Text(s) => Some(s.clone()),
        MetadataValue::Number(n) => Some(n.to_string()),
        MetadataValue::Date(dt) => Some(dt.to_rfc3339()),
        MetadataValue::Sequence(items) => Some(items.join("; ")),
        MetadataValue::Unsupported => None,
    }
}

/// Print a single row in the metadata table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<22}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}
