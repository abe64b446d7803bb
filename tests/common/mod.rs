// SPDX-License-Identifier: MPL-2.0

//! In-memory collaborators for driving the session core without hardware

#![allow(dead_code)]

use camera_mirror::app::{CaptureSessionController, PermissionGate, SessionSnapshot};
use camera_mirror::backends::camera::{
    BackendError, BackendResult, CameraDevice, CaptureSession, DeviceEnumerator,
};
use camera_mirror::backends::permission::{AccessRequest, PermissionService, PermissionStatus};
use camera_mirror::constants::SessionPreset;
use camera_mirror::errors::AuthorizationError;
use futures::FutureExt;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

pub fn camera(id: &str) -> CameraDevice {
    CameraDevice::new(id, format!("Camera {}", id), format!("/dev/video-{}", id))
}

/// Enumerator whose device list can be changed between calls
#[derive(Clone, Default)]
pub struct FakeEnumerator {
    devices: Arc<Mutex<Vec<CameraDevice>>>,
    fail: Arc<Mutex<bool>>,
}

impl FakeEnumerator {
    pub fn with(ids: &[&str]) -> Self {
        let enumerator = Self::default();
        enumerator.set(ids);
        enumerator
    }

    pub fn set(&self, ids: &[&str]) {
        *self.devices.lock().unwrap() = ids.iter().map(|id| camera(id)).collect();
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

impl DeviceEnumerator for FakeEnumerator {
    fn enumerate(&self) -> BackendResult<Vec<CameraDevice>> {
        if *self.fail.lock().unwrap() {
            return Err(BackendError::NotAvailable("no video subsystem".into()));
        }
        Ok(self.devices.lock().unwrap().clone())
    }
}

/// What the recording session saw and what it will do next
#[derive(Debug, Default)]
pub struct SessionProbe {
    pub log: Vec<String>,
    pub attached: Option<String>,
    pub running: bool,
    pub preset: Option<SessionPreset>,
    pub fail_create: HashSet<String>,
    pub fail_start: HashSet<String>,
    pub refuse_add: bool,
    pub pending_error: Option<BackendError>,
}

impl SessionProbe {
    pub fn count(&self, prefix: &str) -> usize {
        self.log.iter().filter(|entry| entry.starts_with(prefix)).count()
    }
}

/// Capture session that records every call
#[derive(Clone, Default)]
pub struct RecordingSession {
    probe: Arc<Mutex<SessionProbe>>,
}

impl RecordingSession {
    pub fn new() -> (Self, Arc<Mutex<SessionProbe>>) {
        let session = Self::default();
        let probe = Arc::clone(&session.probe);
        (session, probe)
    }
}

impl CaptureSession for RecordingSession {
    type Input = CameraDevice;

    fn create_input(&mut self, device: &CameraDevice) -> BackendResult<CameraDevice> {
        let mut probe = self.probe.lock().unwrap();
        probe.log.push(format!("create:{}", device.id));
        if probe.fail_create.contains(&device.id) {
            return Err(BackendError::DeviceBusy(device.path.clone()));
        }
        Ok(device.clone())
    }

    fn can_add_input(&self, _input: &CameraDevice) -> bool {
        let probe = self.probe.lock().unwrap();
        !probe.refuse_add && probe.attached.is_none()
    }

    fn add_input(&mut self, input: CameraDevice) -> BackendResult<()> {
        let mut probe = self.probe.lock().unwrap();
        probe.log.push(format!("add:{}", input.id));
        probe.attached = Some(input.id);
        Ok(())
    }

    fn remove_input(&mut self) -> bool {
        let mut probe = self.probe.lock().unwrap();
        match probe.attached.take() {
            Some(id) => {
                probe.log.push(format!("remove:{}", id));
                probe.running = false;
                true
            }
            None => false,
        }
    }

    fn set_preset(&mut self, preset: SessionPreset) {
        self.probe.lock().unwrap().preset = Some(preset);
    }

    fn start_running(&mut self) -> BackendResult<()> {
        let mut probe = self.probe.lock().unwrap();
        let Some(id) = probe.attached.clone() else {
            return Err(BackendError::StreamError("no input attached".into()));
        };
        if probe.fail_start.contains(&id) {
            return Err(BackendError::StreamError(format!("{} failed to start", id)));
        }
        if !probe.running {
            probe.log.push(format!("start:{}", id));
            probe.running = true;
        }
        Ok(())
    }

    fn stop_running(&mut self) {
        let mut probe = self.probe.lock().unwrap();
        if probe.running {
            probe.log.push("stop".to_string());
            probe.running = false;
        }
    }

    fn is_running(&self) -> bool {
        self.probe.lock().unwrap().running
    }

    fn take_error(&mut self) -> Option<BackendError> {
        self.probe.lock().unwrap().pending_error.take()
    }
}

/// Permission service answering from a script
#[derive(Clone)]
pub struct ScriptedPermissions {
    status: Result<PermissionStatus, AuthorizationError>,
    answer: Result<bool, AuthorizationError>,
    requests: Arc<AtomicUsize>,
}

impl ScriptedPermissions {
    pub fn new(status: PermissionStatus) -> Self {
        Self {
            status: Ok(status),
            answer: Ok(status == PermissionStatus::Granted),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Undetermined status whose request resolves to `answer`
    pub fn prompting(answer: Result<bool, AuthorizationError>) -> Self {
        Self {
            answer,
            ..Self::new(PermissionStatus::Undetermined)
        }
    }

    pub fn unrecognized(state: &str) -> Self {
        Self {
            status: Err(AuthorizationError::UnrecognizedState(state.to_string())),
            ..Self::new(PermissionStatus::Undetermined)
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl PermissionService for ScriptedPermissions {
    fn status(&self) -> Result<PermissionStatus, AuthorizationError> {
        self.status.clone()
    }

    fn request_access(&self) -> AccessRequest {
        self.requests.fetch_add(1, Ordering::SeqCst);
        futures::future::ready(self.answer.clone()).boxed()
    }
}

pub fn controller(
    ids: &[&str],
) -> (
    CaptureSessionController<RecordingSession>,
    FakeEnumerator,
    Arc<Mutex<SessionProbe>>,
) {
    let enumerator = FakeEnumerator::with(ids);
    let (session, probe) = RecordingSession::new();
    let controller = CaptureSessionController::new(
        session,
        Box::new(enumerator.clone()),
        SessionPreset::default(),
    );
    (controller, enumerator, probe)
}

pub fn gate(permissions: &ScriptedPermissions) -> PermissionGate {
    PermissionGate::new(Box::new(permissions.clone()))
}

/// Wait until a committed snapshot satisfies `predicate`
pub async fn wait_for(
    snapshots: &mut watch::Receiver<SessionSnapshot>,
    predicate: impl FnMut(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    tokio::time::timeout(Duration::from_secs(5), snapshots.wait_for(predicate))
        .await
        .expect("timed out waiting for session snapshot")
        .expect("session actor dropped its snapshot channel")
        .clone()
}
