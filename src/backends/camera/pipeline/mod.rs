// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer capture session
//!
//! One pipeline per process. The preview surface is added at construction,
//! device inputs are swapped in and out in front of it:
//!
//! ```text
//! ┌──────────────────────────────────────────┐    ┌─────────────────┐
//! │ input: v4l2src ! capsfilter ! decodebin  │───▶│ preview surface │
//! │        ! videoconvert                    │    │                 │
//! └──────────────────────────────────────────┘    └─────────────────┘
//! ```

pub mod preview;

pub use preview::PreviewSurface;

use super::CaptureSession;
use super::types::{BackendError, BackendResult, CameraDevice, PreviewOptions};
use super::v4l2::probe_device;
use crate::constants::{SessionPreset, timing};
use gstreamer::prelude::*;
use tracing::{debug, error, info, warn};

/// A camera source bin, opened but possibly not yet attached
pub struct PipelineInput {
    device: CameraDevice,
    bin: gstreamer::Bin,
}

/// Capture session backed by a GStreamer pipeline
pub struct PipelineCaptureSession {
    pipeline: gstreamer::Pipeline,
    preview: PreviewSurface,
    input: Option<PipelineInput>,
    preset: SessionPreset,
    running: bool,
}

/// Source description for a device input
pub fn input_description(device_path: &str, preset: SessionPreset) -> String {
    format!(
        "v4l2src device=\"{}\" ! capsfilter caps=\"{}\" ! decodebin ! videoconvert",
        device_path,
        preset.caps_string()
    )
}

/// Map a GStreamer error message to a backend error
fn bus_error_to_backend(err: &gstreamer::message::Error) -> BackendError {
    let glib_err = err.error();
    let msg = match err.debug() {
        Some(debug) => format!("{} ({})", glib_err, debug),
        None => glib_err.to_string(),
    };

    match glib_err.kind::<gstreamer::ResourceError>() {
        Some(gstreamer::ResourceError::Busy) => BackendError::DeviceBusy(msg),
        Some(gstreamer::ResourceError::NotFound) => BackendError::DeviceNotFound(msg),
        Some(gstreamer::ResourceError::NotAuthorized) => BackendError::PermissionDenied(msg),
        Some(gstreamer::ResourceError::OpenRead | gstreamer::ResourceError::OpenReadWrite) => {
            BackendError::DeviceNotFound(msg)
        }
        _ => BackendError::StreamError(msg),
    }
}

impl PipelineCaptureSession {
    /// Create the pipeline with its preview surface
    pub fn new(options: &PreviewOptions) -> BackendResult<Self> {
        debug!("Initializing GStreamer");
        gstreamer::init().map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        let pipeline = gstreamer::Pipeline::builder().name("camera-mirror").build();
        let preview = PreviewSurface::new(options)?;
        pipeline
            .add(preview.bin())
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        info!("Capture session created");
        Ok(Self {
            pipeline,
            preview,
            input: None,
            preset: SessionPreset::default(),
            running: false,
        })
    }

    /// Pop the first error message waiting on the bus
    fn pop_bus_error(&self) -> Option<BackendError> {
        let bus = self.pipeline.bus()?;
        let mut first = None;
        while let Some(msg) = bus.pop_filtered(&[gstreamer::MessageType::Error]) {
            if let gstreamer::MessageView::Error(err) = msg.view() {
                error!(
                    error = %err.error(),
                    debug = ?err.debug(),
                    source = ?err.src().map(|s| s.name()),
                    "GStreamer error"
                );
                if first.is_none() {
                    first = Some(bus_error_to_backend(err));
                }
            }
        }
        first
    }

    fn wait_for_state(&self, timeout_secs: u64) -> Result<gstreamer::State, String> {
        let (result, state, pending) = self
            .pipeline
            .state(gstreamer::ClockTime::from_seconds(timeout_secs));
        debug!(?result, ?state, ?pending, "Pipeline state");
        match result {
            Ok(_) => Ok(state),
            Err(e) => Err(format!("{:?} (state: {:?}, pending: {:?})", e, state, pending)),
        }
    }
}

impl CaptureSession for PipelineCaptureSession {
    type Input = PipelineInput;

    fn create_input(&mut self, device: &CameraDevice) -> BackendResult<PipelineInput> {
        info!(device = %device.name, path = %device.path, "Creating device input");

        probe_device(&device.path)?;

        let description = input_description(&device.path, self.preset);
        debug!(description = %description, "Input description");
        let bin = gstreamer::parse::bin_from_description(&description, true)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        Ok(PipelineInput {
            device: device.clone(),
            bin,
        })
    }

    fn can_add_input(&self, _input: &PipelineInput) -> bool {
        self.input.is_none()
    }

    fn add_input(&mut self, input: PipelineInput) -> BackendResult<()> {
        if self.input.is_some() {
            return Err(BackendError::InputRejected(
                "an input is already attached".to_string(),
            ));
        }

        self.pipeline
            .add(&input.bin)
            .map_err(|e| BackendError::InputRejected(e.to_string()))?;

        if let Err(e) = input.bin.link(self.preview.bin()) {
            warn!(device = %input.device.name, error = %e, "Failed to link input");
            let _ = self.pipeline.remove(&input.bin);
            return Err(BackendError::InputRejected(e.to_string()));
        }

        info!(device = %input.device.name, "Input attached");
        self.input = Some(input);
        Ok(())
    }

    fn remove_input(&mut self) -> bool {
        let Some(input) = self.input.take() else {
            return false;
        };

        // Release the device before detaching
        let _ = input.bin.set_state(gstreamer::State::Null);
        input.bin.unlink(self.preview.bin());
        if let Err(e) = self.pipeline.remove(&input.bin) {
            warn!(error = %e, "Failed to remove input bin from pipeline");
        }

        info!(device = %input.device.name, "Input removed");
        true
    }

    fn set_preset(&mut self, preset: SessionPreset) {
        debug!(preset = preset.display_name(), "Session preset");
        self.preset = preset;
    }

    fn start_running(&mut self) -> BackendResult<()> {
        if self.running {
            return Ok(());
        }

        // Discard errors from a previous run
        let _ = self.pop_bus_error();

        info!("Setting pipeline to PLAYING state");
        let started = self
            .pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| e.to_string())
            .and_then(|_| self.wait_for_state(timing::START_TIMEOUT_SECS));

        match started {
            Ok(state) => {
                if state != gstreamer::State::Playing {
                    warn!(?state, "Pipeline is not in PLAYING state yet");
                }
                self.running = true;
                Ok(())
            }
            Err(reason) => {
                let err = self
                    .pop_bus_error()
                    .unwrap_or_else(|| BackendError::StreamError(reason));
                error!(error = %err, "Failed to start pipeline");
                let _ = self.pipeline.set_state(gstreamer::State::Ready);
                Err(err)
            }
        }
    }

    fn stop_running(&mut self) {
        if !self.running {
            return;
        }

        info!("Stopping pipeline");
        // READY keeps the input and the preview window alive
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Ready) {
            warn!(error = %e, "Failed to set pipeline to READY");
        }
        if let Err(e) = self.wait_for_state(timing::STOP_TIMEOUT_SECS) {
            debug!(error = %e, "Pipeline state change had issues");
        }
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn take_error(&mut self) -> Option<BackendError> {
        self.pop_bus_error()
    }
}

impl Drop for PipelineCaptureSession {
    fn drop(&mut self) {
        info!("Dropping capture session - explicitly stopping");
        // Explicitly set pipeline to Null to release device immediately
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_description_quotes_device_and_caps() {
        let desc = input_description("/dev/video2", SessionPreset::Low);
        assert!(desc.starts_with("v4l2src device=\"/dev/video2\""));
        assert!(desc.contains("width=(int)[1,640]"));
        assert!(desc.ends_with("decodebin ! videoconvert"));
    }
}
