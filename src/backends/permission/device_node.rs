// SPDX-License-Identifier: GPL-3.0-only

//! Device node permissions
//!
//! Outside a sandbox camera access is plain file access: the process needs
//! read/write on a `/dev/video*` node (usually via the `video` group).
//! There is nobody to prompt, so the state is never undetermined.

use super::{AccessRequest, PermissionService, PermissionStatus};
use crate::errors::AuthorizationError;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Permission service backed by `access(2)` on video device nodes
#[derive(Debug, Clone)]
pub struct DeviceNodePermissions {
    dev_dir: PathBuf,
}

impl Default for DeviceNodePermissions {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceNodePermissions {
    pub fn new() -> Self {
        Self::with_dev_dir("/dev")
    }

    /// Inspect `video*` nodes below `dev_dir` instead of `/dev`
    pub fn with_dev_dir(dev_dir: impl Into<PathBuf>) -> Self {
        Self {
            dev_dir: dev_dir.into(),
        }
    }

    fn video_nodes(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.dev_dir) else {
            return Vec::new();
        };
        let mut nodes: Vec<PathBuf> = entries
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with("video"))
            .map(|e| e.path())
            .collect();
        nodes.sort();
        nodes
    }
}

/// `access(R_OK | W_OK)` on `path`, returning the errno on failure
fn check_access(path: &Path) -> Result<(), i32> {
    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| libc::EINVAL)?;
    let result = unsafe { libc::access(c_path.as_ptr(), libc::R_OK | libc::W_OK) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error()
            .raw_os_error()
            .unwrap_or(libc::EIO))
    }
}

/// Fold per-node access results into one status
///
/// Any accessible node grants access. Nodes that vanished in between are
/// ignored. An errno outside the known set cannot be interpreted.
pub(crate) fn status_from_access(
    results: impl IntoIterator<Item = Result<(), i32>>,
) -> Result<PermissionStatus, AuthorizationError> {
    let mut seen_any = false;
    let mut status = PermissionStatus::Denied;

    for result in results {
        match result {
            Ok(()) => return Ok(PermissionStatus::Granted),
            Err(libc::ENOENT | libc::ENODEV | libc::ENXIO) => continue,
            Err(libc::EACCES) => seen_any = true,
            Err(libc::EPERM) => {
                seen_any = true;
                status = PermissionStatus::Restricted;
            }
            Err(errno) => {
                return Err(AuthorizationError::UnrecognizedState(format!(
                    "access() failed with errno {}",
                    errno
                )));
            }
        }
    }

    if seen_any {
        Ok(status)
    } else {
        // No camera nodes: nothing to guard
        Ok(PermissionStatus::Granted)
    }
}

impl PermissionService for DeviceNodePermissions {
    fn status(&self) -> Result<PermissionStatus, AuthorizationError> {
        let nodes = self.video_nodes();
        let status = status_from_access(nodes.iter().map(|p| check_access(p)))?;
        debug!(nodes = nodes.len(), ?status, "Device node permission status");
        Ok(status)
    }

    fn request_access(&self) -> AccessRequest {
        let granted = self.status().map(|s| s == PermissionStatus::Granted);
        Box::pin(futures::future::ready(granted))
    }
}
