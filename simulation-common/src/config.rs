use serde::{Deserialize, Serialize};
use crate::error::{Result, SimError};
use std::path::{Path, PathBuf};

/// Smallest marker size (matplotlib-style area, points^2), used for `min_mass`.
pub const MIN_MARK: f64 = 30.0;
/// Largest marker size, used for `max_mass`.
pub const MAX_MARK: f64 = 150.0;

/// Output directory used when neither the CLI nor the config names one.
pub const DEFAULT_OUTPUT_DIR: &str = "vis";

// Where to read the snapshot file from
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct InputConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// Where and how frames are written
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String, // Frames are named <prefix><index>.png
    #[serde(default)]
    pub animation: Option<PathBuf>, // Optional GIF with every frame
    #[serde(default = "default_frame_delay_ms")]
    pub frame_delay_ms: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: None,
            file_prefix: default_file_prefix(),
            animation: None,
            frame_delay_ms: default_frame_delay_ms(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColormapKind {
    #[default]
    Viridis,
    Plasma,
    Greys,
}

// Figure appearance, shared by every frame
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct StyleConfig {
    #[serde(default = "default_width_px")]
    pub width_px: u32,
    #[serde(default = "default_height_px")]
    pub height_px: u32,
    #[serde(default = "default_dpi")]
    pub dpi: f64, // Converts marker sizes (points^2) to pixels
    #[serde(default = "default_min_marker")]
    pub min_marker: f64,
    #[serde(default = "default_max_marker")]
    pub max_marker: f64,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default)]
    pub colormap: ColormapKind,
}

impl Default for StyleConfig {
    fn default() -> Self {
        StyleConfig {
            width_px: default_width_px(),
            height_px: default_height_px(),
            dpi: default_dpi(),
            min_marker: default_min_marker(),
            max_marker: default_max_marker(),
            alpha: default_alpha(),
            colormap: ColormapKind::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub parallel: bool, // Render frames on the rayon pool
    #[serde(default = "default_progress")]
    pub progress: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            parallel: false,
            progress: default_progress(),
        }
    }
}

/// Render configuration, loaded from a TOML file. Every section is optional.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct RenderConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub style: StyleConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl RenderConfig {
    /// Loads the render configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| SimError::Config(format!("Failed to read config file '{}': {}", path_ref.display(), e)))?;
        let config = Self::from_toml_str(&config_str).map_err(|e| match e {
            SimError::Config(msg) => SimError::Config(format!("'{}': {}", path_ref.display(), msg)),
            other => other,
        })?;

        Ok(config)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: RenderConfig = toml::from_str(text)
            .map_err(|e| SimError::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let style = &self.style;
        if style.width_px == 0 || style.height_px == 0 {
            return Err(SimError::Config("width_px and height_px must be positive.".into()));
        }
        if !style.dpi.is_finite() || style.dpi <= 0.0 {
            return Err(SimError::Config("dpi must be positive.".into()));
        }
        if style.min_marker.is_nan() || style.min_marker <= 0.0 || style.min_marker >= style.max_marker {
            return Err(SimError::Config(format!(
                "marker range must satisfy 0 < min_marker < max_marker, got [{}, {}].",
                style.min_marker, style.max_marker
            )));
        }
        if !(0.0..=1.0).contains(&style.alpha) {
            return Err(SimError::Config(format!("alpha must lie in [0, 1], got {}.", style.alpha)));
        }
        if self.output.file_prefix.contains(['/', '\\']) {
            return Err(SimError::Config("file_prefix must not contain path separators.".into()));
        }
        Ok(())
    }

    /// Output directory from the config, or the default.
    pub fn output_directory(&self) -> PathBuf {
        self.output
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }
}

fn default_file_prefix() -> String {
    "timestep_".to_string()
}

fn default_frame_delay_ms() -> u32 {
    200
}

fn default_width_px() -> u32 {
    640 // 6.4 in at 100 dpi
}

fn default_height_px() -> u32 {
    480
}

fn default_dpi() -> f64 {
    100.0
}

fn default_min_marker() -> f64 {
    MIN_MARK
}

fn default_max_marker() -> f64 {
    MAX_MARK
}

fn default_alpha() -> f64 {
    0.6
}

fn default_progress() -> bool {
    true
}
