// SPDX-License-Identifier: GPL-3.0-only

//! Capture session controller
//!
//! Owns the capture session and the device list and drives the session
//! lifecycle:
//!
//! ```text
//! Idle    ──bind_and_start(ok)──▶ Running
//! Running ──stop───────────────▶ Bound
//! Bound   ──bind_and_start(ok)──▶ Running
//! Running/Bound ──unbind───────▶ Idle
//! any     ──bind_and_start(err)─▶ Idle   (reported, not fatal)
//! ```
//!
//! The controller is not thread-safe on purpose: it lives inside the
//! session actor, which serializes every call.

use super::state::{SelectionState, SessionState};
use crate::backends::camera::{
    BackendError, BackendResult, CameraDevice, CaptureSession, DeviceEnumerator, DeviceList,
};
use crate::constants::SessionPreset;
use crate::errors::{DeviceUnavailableError, InvariantViolation, SessionError};
use tracing::{debug, info, warn};

pub struct CaptureSessionController<S: CaptureSession> {
    session: S,
    enumerator: Box<dyn DeviceEnumerator>,
    devices: DeviceList,
    selection: SelectionState,
    current_device: Option<CameraDevice>,
    state: SessionState,
    preset: SessionPreset,
}

impl<S: CaptureSession> CaptureSessionController<S> {
    pub fn new(session: S, enumerator: Box<dyn DeviceEnumerator>, preset: SessionPreset) -> Self {
        Self {
            session,
            enumerator,
            devices: DeviceList::default(),
            selection: SelectionState::default(),
            current_device: None,
            state: SessionState::Idle,
            preset,
        }
    }

    // ===== Accessors =====

    pub fn devices(&self) -> &DeviceList {
        &self.devices
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selection.index()
    }

    pub fn current_device(&self) -> Option<&CameraDevice> {
        self.current_device.as_ref()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn set_preset(&mut self, preset: SessionPreset) {
        self.preset = preset;
    }

    // ===== Devices and selection =====

    /// Query the enumerator and replace the device list
    ///
    /// The selection follows the attached device, or the current one when
    /// nothing is attached, and is clamped into range when that device is
    /// gone. An attached device that disappeared is unbound, so the current
    /// device always matches the bound one.
    pub fn enumerate_devices(&mut self) -> BackendResult<&DeviceList> {
        let devices = DeviceList::new(self.enumerator.enumerate()?);

        let followed = self
            .state
            .device()
            .or(self.current_device.as_ref())
            .and_then(|device| devices.position(&device.id));
        let len = devices.len();
        match followed {
            Some(index) if self.selection.select(index, len).is_ok() => {}
            _ => self.selection.clamp(len),
        }

        if let Some(attached) = self.state.device()
            && devices.position(&attached.id).is_none()
        {
            warn!(device = %attached.name, "Bound camera disappeared");
            self.unbind();
        }

        self.current_device = self
            .selection
            .index()
            .and_then(|index| devices.get(index))
            .cloned();
        self.devices = devices;

        info!(
            count = self.devices.len(),
            selected = ?self.selection.index(),
            "Enumerated cameras"
        );
        Ok(&self.devices)
    }

    /// Re-enumerate on request
    ///
    /// Reports the bound camera as unavailable when the rescan lost it. A
    /// failing enumerator keeps the previous list.
    pub fn refresh(&mut self) -> Result<(), SessionError> {
        let attached = self.state.device().cloned();

        if let Err(e) = self.enumerate_devices() {
            warn!(error = %e, "Camera enumeration failed");
            return Ok(());
        }

        match attached {
            Some(device) if self.state == SessionState::Idle => Err(DeviceUnavailableError {
                device: device.name,
                reason: "camera disconnected".to_string(),
            }
            .into()),
            _ => Ok(()),
        }
    }

    /// Move the selection without touching the session
    pub fn set_selection(&mut self, index: usize) -> Result<&CameraDevice, SessionError> {
        self.selection.select(index, self.devices.len())?;
        let device = self
            .devices
            .get(index)
            .cloned()
            .ok_or(SessionError::InvalidSelection {
                index,
                len: self.devices.len(),
            })?;
        Ok(self.current_device.insert(device))
    }

    /// Switch the session to the device at `index`
    ///
    /// Unbinds the current input and binds the new one. Selecting the
    /// device that is already running rebinds it.
    pub fn select_device(&mut self, index: usize) -> Result<(), SessionError> {
        let device = self.set_selection(index)?.clone();
        info!(index, device = %device.name, "Switching camera");

        self.unbind();
        self.bind_and_start(&device)
    }

    // ===== Session lifecycle =====

    /// Configure the session and start the current device
    pub fn prepare(&mut self) -> Result<(), SessionError> {
        let device = self
            .current_device
            .clone()
            .ok_or(InvariantViolation::NoCurrentDevice)?;

        self.session.set_preset(self.preset);
        self.bind_and_start(&device)
    }

    /// Bind `device` to the session and start streaming
    ///
    /// Rebinding the attached device reuses its input. Binding a different
    /// device while one is attached is a contract breach; callers unbind
    /// first.
    pub fn bind_and_start(&mut self, device: &CameraDevice) -> Result<(), SessionError> {
        let reuse = match self.state.device() {
            Some(attached) if attached.id == device.id => true,
            Some(attached) => {
                return Err(InvariantViolation::DuplicateInput {
                    attached: attached.name.clone(),
                    requested: device.name.clone(),
                }
                .into());
            }
            None => false,
        };

        self.stop();

        if reuse {
            debug!(device = %device.name, "Input already attached, reusing it");
        } else {
            let input = match self.session.create_input(device) {
                Ok(input) => input,
                Err(e) => return Err(self.fail(device, e)),
            };

            if !self.session.can_add_input(&input) {
                let err = BackendError::InputRejected("session refused the input".to_string());
                return Err(self.fail(device, err));
            }

            if let Err(e) = self.session.add_input(input) {
                return Err(self.fail(device, e));
            }
            self.state = SessionState::Bound(device.clone());
        }

        if let Err(e) = self.session.start_running() {
            return Err(self.fail(device, e));
        }

        self.state = SessionState::Running(device.clone());
        info!(device = %device.name, "Capture session running");
        Ok(())
    }

    /// Stop streaming, keeping the input attached
    pub fn stop(&mut self) {
        if let SessionState::Running(device) = &self.state {
            let device = device.clone();
            self.session.stop_running();
            info!(device = %device.name, "Capture session stopped");
            self.state = SessionState::Bound(device);
        }
    }

    /// Detach the current input
    pub fn unbind(&mut self) {
        if self.state == SessionState::Idle {
            return;
        }

        self.session.stop_running();
        self.session.remove_input();
        debug!(state = self.state.label(), "Input unbound");
        self.state = SessionState::Idle;
    }

    /// Handle errors the session raised while streaming
    pub fn check_health(&mut self) -> Result<(), SessionError> {
        let Some(err) = self.session.take_error() else {
            return Ok(());
        };

        match self.state.device().cloned() {
            Some(device) => Err(self.fail(&device, err)),
            None => {
                debug!(error = %err, "Ignoring session error while idle");
                Ok(())
            }
        }
    }

    /// Fall back to idle after a device failure and describe it
    fn fail(&mut self, device: &CameraDevice, err: BackendError) -> SessionError {
        warn!(device = %device.name, error = %err, "Camera unavailable");

        self.session.stop_running();
        self.session.remove_input();
        self.state = SessionState::Idle;

        DeviceUnavailableError {
            device: device.name.clone(),
            reason: err.to_string(),
        }
        .into()
    }
}

impl<S: CaptureSession> std::fmt::Debug for CaptureSessionController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSessionController")
            .field("devices", &self.devices.len())
            .field("selection", &self.selection.index())
            .field("state", &self.state)
            .finish()
    }
}
