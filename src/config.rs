//! Converter configuration.
//!
//! Handles loading, validating, and merging a TOML config file. Stock defaults
//! are the base layer; a user file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [encode]
//! quality = 75              # JPEG quality (0-100)
//!
//! [resize]
//! filter = "lanczos3"       # nearest | triangle | catmull-rom | gaussian | lanczos3
//! boxes = [32, 64, 128, 150, 256, 800]  # Set produced by Converter::thumbnail_set
//!
//! [files]
//! default_name = "filename" # Name used when wrapping base64 as a file
//! default_extension = "png" # Extension (and image/<ext> type) for the same
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{BoundingBoxSize, Quality, ResizeConfig, ResizeFilter};
use crate::upload::{content_type_for_extension, is_accepted_content_type};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Converter configuration.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// JPEG encode settings.
    pub encode: EncodeConfig,
    /// Resampling settings.
    pub resize: ResizeSection,
    /// Defaults for wrapping base64 as an uploaded file.
    pub files: FilesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ConverterConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.encode.quality > 100 {
            return Err(ConfigError::Validation(
                "encode.quality must be 0-100".into(),
            ));
        }
        if self.resize.boxes.is_empty() {
            return Err(ConfigError::Validation(
                "resize.boxes must not be empty".into(),
            ));
        }
        if self.files.default_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "files.default_name must not be empty".into(),
            ));
        }
        if !is_accepted_content_type(&content_type_for_extension(&self.files.default_extension)) {
            return Err(ConfigError::Validation(format!(
                "files.default_extension \"{}\" does not map to an accepted image type",
                self.files.default_extension
            )));
        }
        Ok(())
    }

    /// Quality and filter as handed to resize operations.
    pub fn resize_config(&self) -> ResizeConfig {
        ResizeConfig {
            filter: self.resize.filter,
            quality: Quality::new(self.encode.quality),
        }
    }
}

/// JPEG encode settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodeConfig {
    /// JPEG quality (0 = worst, 100 = best).
    pub quality: u32,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default().value() as u32,
        }
    }
}

/// Resampling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeSection {
    /// Resampling kernel.
    pub filter: ResizeFilter,
    /// Boxes produced by a full thumbnail set.
    pub boxes: Vec<BoundingBoxSize>,
}

impl Default for ResizeSection {
    fn default() -> Self {
        Self {
            filter: ResizeFilter::default(),
            boxes: BoundingBoxSize::ALL.to_vec(),
        }
    }
}

/// Defaults for `base64 → file` wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilesConfig {
    pub default_name: String,
    pub default_extension: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            default_name: "filename".to_string(),
            default_extension: "png".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel resize workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// The base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ConverterConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ConverterConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ConverterConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate config text.
pub fn parse_config(content: &str) -> Result<ConverterConfig, ConfigError> {
    resolve_config(Some(toml::from_str(content)?))
}

/// Load config from a TOML file, falling back to defaults if it is absent.
pub fn load_config(path: &Path) -> Result<ConverterConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock config file with all keys and explanations.
pub fn stock_config_toml() -> &'static str {
    r##"# thumbfit Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[encode]
# JPEG quality (0 = worst, 100 = best). Every encode emits JPEG.
quality = 75

# ---------------------------------------------------------------------------
# Resizing
# ---------------------------------------------------------------------------
[resize]
# Resampling kernel: nearest, triangle, catmull-rom, gaussian, lanczos3.
filter = "lanczos3"

# Bounding boxes produced by a full thumbnail set.
# Allowed values: 32, 64, 128, 150, 256, 800.
boxes = [32, 64, 128, 150, 256, 800]

# ---------------------------------------------------------------------------
# Wrapping base64 as a file
# ---------------------------------------------------------------------------
[files]
# File name (without extension).
default_name = "filename"

# Extension; the declared content type becomes image/<extension>.
default_extension = "png"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel resize workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
