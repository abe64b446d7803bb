// SPDX-License-Identifier: GPL-3.0-only

//! Camera permission gate

use crate::backends::permission::{AccessRequest, PermissionService, PermissionStatus};
use crate::errors::AuthorizationError;
use tracing::{info, warn};

/// Result of [`PermissionGate::check_authorization`]
pub enum Authorization {
    Granted,
    Denied,
    /// The user is being asked. The request resolves once; its result goes
    /// back to [`PermissionGate::resolve`] on the owning task.
    Pending(AccessRequest),
}

impl std::fmt::Debug for Authorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authorization::Granted => write!(f, "Granted"),
            Authorization::Denied => write!(f, "Denied"),
            Authorization::Pending(_) => write!(f, "Pending"),
        }
    }
}

/// Tracks whether the process may use a camera
pub struct PermissionGate {
    service: Box<dyn PermissionService>,
    granted: bool,
    prompt_prepared: bool,
}

impl PermissionGate {
    pub fn new(service: Box<dyn PermissionService>) -> Self {
        Self {
            service,
            granted: false,
            prompt_prepared: false,
        }
    }

    pub fn is_granted(&self) -> bool {
        self.granted
    }

    /// Check the current authorization, starting a request when undetermined
    ///
    /// Denied and restricted states are final: no prompt, no retry.
    pub fn check_authorization(&mut self) -> Result<Authorization, AuthorizationError> {
        match self.service.status()? {
            PermissionStatus::Granted => {
                info!("Camera access granted");
                self.granted = true;
                Ok(Authorization::Granted)
            }
            PermissionStatus::Undetermined => {
                info!("Camera access undetermined, requesting");
                Ok(Authorization::Pending(self.service.request_access()))
            }
            status @ (PermissionStatus::Denied | PermissionStatus::Restricted) => {
                warn!(?status, "Camera access not available");
                self.granted = false;
                Ok(Authorization::Denied)
            }
        }
    }

    /// Apply the outcome of a pending request
    ///
    /// Returns `true` when the caller should now prepare the session. That
    /// happens at most once per gate, however often a grant is delivered.
    /// An unreachable permission service counts as a refusal; an
    /// unrecognized answer is returned as a fatal error.
    pub fn resolve(
        &mut self,
        result: Result<bool, AuthorizationError>,
    ) -> Result<bool, AuthorizationError> {
        let granted = match result {
            Ok(granted) => granted,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(error = %e, "Camera access request failed");
                false
            }
        };

        info!(granted, "Camera access request resolved");
        self.granted = granted;

        if granted && !self.prompt_prepared {
            self.prompt_prepared = true;
            return Ok(true);
        }
        Ok(false)
    }
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate")
            .field("granted", &self.granted)
            .finish()
    }
}
