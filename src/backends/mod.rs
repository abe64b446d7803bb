// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for the system services the app depends on
//!
//! - [`camera`]: Camera enumeration (V4L2) and the capture session (GStreamer)
//! - [`permission`]: Camera authorization (device nodes or XDG portal)

pub mod camera;
pub mod permission;
