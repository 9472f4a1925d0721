use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder key written by `--init`; treated the same as no key.
pub const API_KEY_PLACEHOLDER: &str = "[Put your Google Gemini API key Here]";

/// Environment variable consulted when the config file carries no key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Top-level configuration for xmp-sidecar-ai.
///
/// # Loading
///
/// ```rust,no_run
/// use xmp_sidecar_ai::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.gemini.api_key = "AIza...".into();
/// config.location = Some("Toronto, Canada".into());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gemini credentials and model.
    pub gemini: GeminiConfig,
    /// Where the photos were taken. Sent to the model and written as
    /// `Iptc4xmpCore:Location`.
    pub location: Option<String>,
    /// Which files are accepted for analysis.
    pub limits: Limits,
    /// Output behavior (dry run, sidecar directory).
    pub output: OutputConfig,
}

/// Google Gemini service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

/// Upload limits applied before any analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum number of images per batch.
    pub max_files: usize,
    /// Maximum size of a single image, in bytes.
    pub max_file_size: u64,
}

/// Output and behavior configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// If `true`, compose sidecars without writing any files.
    pub dry_run: bool,
    /// Directory for `.xmp` files. Defaults to the image's own directory.
    pub dir: Option<PathBuf>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: API_KEY_PLACEHOLDER.to_string(),
            model: "gemini-2.5-flash".to_string(),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_files: 5,
            max_file_size: 2 * 1024 * 1024,
        }
    }
}

impl GeminiConfig {
    /// `true` when a real key is configured.
    pub fn has_api_key(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != API_KEY_PLACEHOLDER
    }
}

impl Config {
    /// Resolve the config file path, in the same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    ///
    /// A missing file yields the defaults. An unset API key is filled in
    /// from `GEMINI_API_KEY` when that variable is set.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let mut config = if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            Self::default()
        };

        if !config.gemini.has_api_key() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                config.gemini.api_key = key;
            }
        }

        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// The configured location, if it has any non-blank text.
    pub fn location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}
