// SPDX-License-Identifier: MPL-2.0

//! Camera permission services
//!
//! - [`device_node`]: host processes, checks access to `/dev/video*`
//! - [`portal`]: Flatpak sandbox, asks `org.freedesktop.portal.Camera`

pub mod device_node;
pub mod portal;

use crate::errors::AuthorizationError;
use futures::future::BoxFuture;
use std::path::Path;

/// Authorization state as reported by the permission service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Blocked by policy, the user cannot change it
    Restricted,
    /// The user has not been asked yet
    Undetermined,
}

/// Outcome of an access request, resolved exactly once
pub type AccessRequest = BoxFuture<'static, Result<bool, AuthorizationError>>;

/// Source of camera authorization
pub trait PermissionService: Send + Sync {
    /// Current authorization state
    ///
    /// Fails with [`AuthorizationError::UnrecognizedState`] when the
    /// underlying system reports a state outside [`PermissionStatus`].
    fn status(&self) -> Result<PermissionStatus, AuthorizationError>;

    /// Ask for access; resolves to whether access was granted
    fn request_access(&self) -> AccessRequest;
}

/// Whether the process runs inside a Flatpak sandbox
pub fn is_sandboxed() -> bool {
    Path::new("/.flatpak-info").exists()
}

/// Get the permission service for this environment
pub fn get_permission_service() -> Box<dyn PermissionService> {
    if is_sandboxed() {
        Box::new(portal::PortalPermissions::new())
    } else {
        Box::new(device_node::DeviceNodePermissions::new())
    }
}
