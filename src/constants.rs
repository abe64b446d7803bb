// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application identifier, used for config and cache directories
pub const APP_ID: &str = "camera-mirror";

/// Capture session quality presets
///
/// A preset bounds the resolution negotiated with the camera. The camera
/// picks its best mode within the bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPreset {
    /// Up to 640x480
    Low,
    /// Up to 1280x720
    Medium,
    /// Up to 1920x1080 (default)
    #[default]
    High,
    /// Whatever the camera offers
    Max,
}

impl SessionPreset {
    /// Get all preset variants for UI iteration
    pub const ALL: [SessionPreset; 4] = [
        SessionPreset::Low,
        SessionPreset::Medium,
        SessionPreset::High,
        SessionPreset::Max,
    ];

    /// Get display name for the preset
    pub fn display_name(&self) -> &'static str {
        match self {
            SessionPreset::Low => "Low",
            SessionPreset::Medium => "Medium",
            SessionPreset::High => "High",
            SessionPreset::Max => "Max",
        }
    }

    /// Upper resolution bound, `None` for unbounded
    pub fn max_resolution(&self) -> Option<(u32, u32)> {
        match self {
            SessionPreset::Low => Some((640, 480)),
            SessionPreset::Medium => Some((1280, 720)),
            SessionPreset::High => Some((1920, 1080)),
            SessionPreset::Max => None,
        }
    }

    /// GStreamer caps string restricting camera output to this preset
    ///
    /// Covers both raw and MJPEG output since most USB cameras only offer
    /// their larger modes as MJPEG.
    pub fn caps_string(&self) -> String {
        match self.max_resolution() {
            Some((w, h)) => format!(
                "video/x-raw,width=(int)[1,{w}],height=(int)[1,{h}];\
                 image/jpeg,width=(int)[1,{w}],height=(int)[1,{h}]"
            ),
            None => "video/x-raw;image/jpeg".to_string(),
        }
    }
}

impl std::str::FromStr for SessionPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(SessionPreset::Low),
            "medium" => Ok(SessionPreset::Medium),
            "high" => Ok(SessionPreset::High),
            "max" => Ok(SessionPreset::Max),
            other => Err(format!("unknown preset '{}'", other)),
        }
    }
}

/// GStreamer pipeline settings
pub mod pipeline {
    /// Default sink element for the preview window
    pub const DEFAULT_VIDEO_SINK: &str = "autovideosink";

    /// Aspect ratio cropped to when the preview fills its window
    pub const DEFAULT_FILL_ASPECT: (i32, i32) = (16, 9);

    /// Name of the preview surface bin inside the pipeline
    pub const PREVIEW_BIN_NAME: &str = "preview-surface";
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Stop timeout in seconds
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Pipeline start timeout in seconds
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// How often the session actor polls the capture session for errors
    pub const HEALTH_CHECK_INTERVAL: Duration = Duration::from_millis(500);

    /// Terminal menu input poll interval
    pub const MENU_POLL_INTERVAL: Duration = Duration::from_millis(50);
}

/// Capacity of the session event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 32;
