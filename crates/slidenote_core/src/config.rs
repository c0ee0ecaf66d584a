//! Session configuration.
//!
//! # Responsibility
//! - Provide defaults for page height, zoom ranges, layout metrics and the
//!   export file name.
//! - Load overrides from a JSON file named by `SLIDENOTE_CONFIG`.
//!
//! # Invariants
//! - A config returned by `load_from_env` or `from_path` has passed `validate`.
//! - Missing fields fall back to defaults.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Environment variable holding the config file path.
pub const CONFIG_ENV_VAR: &str = "SLIDENOTE_CONFIG";

/// Approximate height of one printed A4 page at 96 dpi.
pub const A4_PAGE_HEIGHT_PX: f64 = 1123.0;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Tunables for one note-taking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Content height that counts as one page for automatic page breaks.
    pub page_height_px: f64,
    pub pdf_scale: f32,
    pub pdf_scale_min: f32,
    pub pdf_scale_max: f32,
    pub note_scale: f32,
    pub note_scale_min: f32,
    pub note_scale_max: f32,
    pub line_height_px: f64,
    pub chars_per_line: usize,
    pub top_padding_px: f64,
    pub export_file_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_height_px: A4_PAGE_HEIGHT_PX,
            pdf_scale: 1.5,
            pdf_scale_min: 0.25,
            pdf_scale_max: 4.0,
            note_scale: 1.0,
            note_scale_min: 0.5,
            note_scale_max: 3.0,
            line_height_px: 24.0,
            chars_per_line: 80,
            top_padding_px: 12.0,
            export_file_name: "document.pdf".to_string(),
        }
    }
}

impl SessionConfig {
    /// Loads the file named by `SLIDENOTE_CONFIG`, or defaults when unset.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(raw) if !raw.trim().is_empty() => Self::from_path(raw.trim()),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects non-positive metrics and inconsistent zoom ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.page_height_px.is_finite() && self.page_height_px > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "page_height_px must be positive, got {}",
                self.page_height_px
            )));
        }
        if !(self.line_height_px.is_finite() && self.line_height_px > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "line_height_px must be positive, got {}",
                self.line_height_px
            )));
        }
        if self.chars_per_line == 0 {
            return Err(ConfigError::Invalid(
                "chars_per_line must be at least 1".to_string(),
            ));
        }
        if self.export_file_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "export_file_name cannot be empty".to_string(),
            ));
        }
        check_range("pdf_scale", self.pdf_scale, self.pdf_scale_min, self.pdf_scale_max)?;
        check_range(
            "note_scale",
            self.note_scale,
            self.note_scale_min,
            self.note_scale_max,
        )?;
        Ok(())
    }
}

fn check_range(name: &str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
        return Err(ConfigError::Invalid(format!(
            "{name} range [{min}, {max}] is not a positive ascending range"
        )));
    }
    if !(min..=max).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{name} {value} is outside [{min}, {max}]"
        )));
    }
    Ok(())
}
