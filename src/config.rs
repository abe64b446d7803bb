// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::{PreviewGravity, PreviewOptions};
use crate::constants::{APP_ID, SessionPreset, pipeline};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// User configuration
///
/// Read once at startup from `config.json` in the user config directory.
/// The application never writes it back.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mirror camera preview horizontally (selfie mode)
    pub mirror_preview: bool,
    /// How the preview fills its window
    pub preview_gravity: PreviewGravity,
    /// Resolution bound for the capture session
    pub session_preset: SessionPreset,
    /// GStreamer sink element used for the preview window
    pub video_sink: String,
    /// Aspect ratio the preview is cropped to in fill mode
    pub fill_aspect: (i32, i32),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mirror_preview: true, // Default to mirrored (selfie mode)
            preview_gravity: PreviewGravity::default(),
            session_preset: SessionPreset::default(),
            video_sink: pipeline::DEFAULT_VIDEO_SINK.to_string(),
            fill_aspect: pipeline::DEFAULT_FILL_ASPECT,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_ID).join("config.json"))
    }

    /// Load the config from the default location, falling back to defaults
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load the config from `path`
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;

        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if self.video_sink.trim().is_empty() {
            return Err(AppError::Config("video_sink must not be empty".into()));
        }
        if self.fill_aspect.0 <= 0 || self.fill_aspect.1 <= 0 {
            return Err(AppError::Config(format!(
                "fill_aspect must be positive, got {}:{}",
                self.fill_aspect.0, self.fill_aspect.1
            )));
        }
        Ok(())
    }

    /// Preview surface options derived from this config
    pub fn preview_options(&self) -> PreviewOptions {
        PreviewOptions {
            mirror: self.mirror_preview,
            gravity: self.preview_gravity,
            fill_aspect: self.fill_aspect,
            video_sink: self.video_sink.clone(),
        }
    }
}
