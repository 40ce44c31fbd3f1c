use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{ViewfinderError, ViewfinderResult};

/// Tool configuration, loaded from `config.toml`. Every field has a default
/// so the tool runs with no config file at all.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub pointer: PointerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Durable template library.
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
    /// Scratch directory for session state and zoom artifacts.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { template_dir: default_template_dir(), work_dir: default_work_dir() }
    }
}

fn default_template_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".viewfinder").join("templates"))
        .unwrap_or_else(|| PathBuf::from(".viewfinder/templates"))
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("viewfinder")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Floor of the adaptive confidence sweep.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    /// Frames larger than this are searched downscaled.
    #[serde(default = "default_max_search_dim")]
    pub max_search_dim: u32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self { min_confidence: default_min_confidence(), max_search_dim: default_max_search_dim() }
    }
}

fn default_min_confidence() -> f32 {
    0.5
}

fn default_max_search_dim() -> u32 {
    1920
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointerConfig {
    /// Pause between moving the pointer and pressing the button.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Capture a screenshot of the target shortly after clicking.
    #[serde(default = "default_true")]
    pub verify_screenshot: bool,
    /// How long to wait for the UI to react before that screenshot.
    #[serde(default = "default_verify_delay_ms")]
    pub verify_delay_ms: u64,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            verify_screenshot: default_true(),
            verify_delay_ms: default_verify_delay_ms(),
        }
    }
}

fn default_settle_ms() -> u64 {
    50
}

fn default_verify_delay_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("VIEWFINDER_CONFIG") {
        let candidate = PathBuf::from(path);
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config from VIEWFINDER_CONFIG");
            return Some(candidate);
        }
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Some(candidate);
            }
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        let candidate = cwd.join("config.toml");
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in working directory");
            return Some(candidate);
        }
    }

    None
}

/// Load `config.toml` if one is discoverable, otherwise run on defaults.
/// A present-but-malformed file is an error; silently ignoring it would
/// make the tool click with the wrong thresholds.
pub fn load_or_default() -> ViewfinderResult<AppConfig> {
    let Some(path) = resolve_config_path() else {
        tracing::debug!("no config.toml found, using defaults");
        return Ok(AppConfig::default());
    };
    let content = std::fs::read_to_string(&path)?;
    let config = parse_config(&content)?;
    tracing::info!(path = %path.display(), "config loaded");
    Ok(config)
}

fn parse_config(content: &str) -> ViewfinderResult<AppConfig> {
    let config: AppConfig = toml::from_str(content)?;
    if !(0.0..=1.0).contains(&config.matching.min_confidence) {
        return Err(ViewfinderError::Config(format!(
            "matching.min_confidence must be within 0.0..=1.0, got {}",
            config.matching.min_confidence
        )));
    }
    Ok(config)
}
