// SPDX-License-Identifier: MPL-2.0

//! Camera Mirror - a mirrored camera preview with device switching
//!
//! This library provides the capture core of the `camera-mirror` binary:
//! camera permission handling, device enumeration, and a capture session
//! that can be switched between cameras while it renders a live preview.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Permission gate, session controller and the actor owning them
//! - [`backends`]: V4L2 enumeration, GStreamer capture session, permission services
//! - [`config`]: User configuration handling
//! - [`terminal`]: Terminal camera menu
//!
//! # Example
//!
//! ```ignore
//! let config = camera_mirror::Config::load()?;
//! let (actor, handle) = camera_mirror::app::build_session(&config)?;
//! tokio::spawn(actor.run());
//! handle.select(1)?;
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod terminal;

// Re-export commonly used types
pub use app::{CaptureSessionController, PermissionGate, SessionEvent, SessionHandle, SessionState};
pub use backends::camera::{CameraDevice, PreviewGravity};
pub use config::Config;
pub use constants::SessionPreset;
pub use errors::{AppError, AppResult};
