// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! The session controller talks to two collaborators through the traits in
//! this module:
//!
//! ```text
//! ┌──────────────────────────┐
//! │ CaptureSessionController │  ← Lifecycle state machine
//! └──────┬────────────┬──────┘
//!        │            │
//!        ▼            ▼
//! ┌────────────┐ ┌──────────────┐
//! │ Enumerator │ │CaptureSession│  ← Common interfaces
//! └─────┬──────┘ └──────┬───────┘
//!       │               │
//!       ▼               ▼
//!   ┌──────┐      ┌───────────┐
//!   │ V4L2 │      │ GStreamer │  ← Concrete implementations
//!   └──────┘      └───────────┘
//! ```

pub mod pipeline;
pub mod types;
pub mod v4l2;
pub mod v4l2_utils;

pub use types::*;

use crate::constants::SessionPreset;

/// Discovers camera-class devices
pub trait DeviceEnumerator: Send {
    /// Enumerate available cameras in discovery order
    ///
    /// Must be callable any number of times and must not touch the capture
    /// session.
    fn enumerate(&self) -> BackendResult<Vec<CameraDevice>>;
}

/// The media resource streaming one camera into a preview surface
///
/// Modelled as a session that holds at most one input. Inputs are created
/// from a device first and attached separately, so creation failures leave
/// the session untouched.
pub trait CaptureSession: Send {
    /// A device input that has been opened but not necessarily attached
    type Input: Send;

    /// Open an input for `device`
    ///
    /// Fails when the device is busy, gone or not accessible.
    fn create_input(&mut self, device: &CameraDevice) -> BackendResult<Self::Input>;

    /// Whether `input` may be added right now
    fn can_add_input(&self, input: &Self::Input) -> bool;

    /// Attach `input`. Callers check [`CaptureSession::can_add_input`] first.
    fn add_input(&mut self, input: Self::Input) -> BackendResult<()>;

    /// Detach and release the attached input, returns whether one was attached
    fn remove_input(&mut self) -> bool;

    /// Apply a quality preset to subsequently created inputs
    fn set_preset(&mut self, preset: SessionPreset);

    /// Start streaming. No-op when already running.
    fn start_running(&mut self) -> BackendResult<()>;

    /// Stop streaming, keeping the input attached. No-op when stopped.
    fn stop_running(&mut self);

    /// Whether the session is streaming
    fn is_running(&self) -> bool;

    /// Take the first asynchronous error raised since the last call
    ///
    /// Covers failures after a successful start, e.g. the camera being
    /// unplugged.
    fn take_error(&mut self) -> Option<BackendError> {
        None
    }
}

/// Get the default device enumerator (V4L2)
pub fn get_enumerator() -> Box<dyn DeviceEnumerator> {
    Box::new(v4l2::V4l2Enumerator::new())
}
