// SPDX-License-Identifier: GPL-3.0-only

//! Application core: permission gate, session controller and the actor
//! that owns both.

pub mod actor;
pub mod controller;
pub mod events;
pub mod permission;
pub mod state;

pub use actor::{Command, SessionActor, SessionHandle};
pub use controller::CaptureSessionController;
pub use events::{EventBus, SessionEvent};
pub use permission::{Authorization, PermissionGate};
pub use state::{SelectionState, SessionSnapshot, SessionState};

use crate::backends::camera::{self, pipeline::PipelineCaptureSession};
use crate::backends::permission;
use crate::config::Config;
use crate::errors::AppResult;

/// Build the session actor with the system collaborators
///
/// V4L2 enumeration, a GStreamer session rendering into a preview window,
/// and the permission service matching the environment.
pub fn build_session(
    config: &Config,
) -> AppResult<(SessionActor<PipelineCaptureSession>, SessionHandle)> {
    let session = PipelineCaptureSession::new(&config.preview_options())?;
    let controller = CaptureSessionController::new(
        session,
        camera::get_enumerator(),
        config.session_preset,
    );
    let gate = PermissionGate::new(permission::get_permission_service());

    Ok(SessionActor::new(controller, gate))
}
