// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera enumeration
//!
//! Walks the video4linux nodes known to the kernel, keeps the ones that
//! capture video and collapses nodes belonging to the same physical camera.

use super::types::{BackendError, BackendResult, CameraDevice};
use super::v4l2_utils::{V4l2Caps, build_device_info, query_caps};
use super::DeviceEnumerator;
use tracing::{debug, info};

/// Enumerates cameras from `/dev/video*`
#[derive(Debug, Default)]
pub struct V4l2Enumerator;

impl V4l2Enumerator {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceEnumerator for V4l2Enumerator {
    fn enumerate(&self) -> BackendResult<Vec<CameraDevice>> {
        debug!("Enumerating cameras via V4L2");

        let mut nodes = v4l::context::enum_devices();
        nodes.sort_by_key(|node| node.index());

        let probed = nodes.iter().map(|node| {
            let path = node.path().to_string_lossy().to_string();
            let caps = query_caps(&path);
            (path, node.name(), caps)
        });

        let cameras = collect_cameras(probed);
        info!(count = cameras.len(), "Found V4L2 cameras");
        Ok(cameras)
    }
}

/// Stable identifier for a probed node
///
/// Prefers the bus location so the same camera keeps its id when the
/// kernel renumbers nodes.
fn camera_id(path: &str, caps: &V4l2Caps) -> String {
    if caps.bus_info.is_empty() {
        format!("v4l2:{}", path)
    } else {
        format!("v4l2:{}", caps.bus_info)
    }
}

/// Turn probed nodes into the camera list
///
/// Nodes that cannot be queried or do not capture video are skipped; the
/// first capture node per physical camera wins.
pub(crate) fn collect_cameras(
    nodes: impl IntoIterator<Item = (String, Option<String>, Option<V4l2Caps>)>,
) -> Vec<CameraDevice> {
    let mut cameras: Vec<CameraDevice> = Vec::new();

    for (path, sysfs_name, caps) in nodes {
        let Some(caps) = caps else {
            debug!(path = %path, "Skipping node without capabilities");
            continue;
        };
        if !caps.is_video_capture() {
            debug!(path = %path, "Skipping non-capture node");
            continue;
        }

        let id = camera_id(&path, &caps);
        if cameras.iter().any(|c| c.id == id) {
            debug!(path = %path, id = %id, "Skipping secondary node of known camera");
            continue;
        }

        let name = if caps.card.is_empty() {
            sysfs_name.unwrap_or_else(|| path.clone())
        } else {
            caps.card.clone()
        };

        cameras.push(CameraDevice {
            id,
            name,
            device_info: Some(build_device_info(&path, &caps)),
            path,
        });
    }

    cameras
}

/// Check that a device node can be opened for capture
///
/// Used before handing a device to GStreamer so that busy, missing or
/// forbidden devices surface as typed errors.
pub fn probe_device(path: &str) -> BackendResult<()> {
    match v4l::Device::with_path(path) {
        Ok(_) => Ok(()),
        Err(e) => {
            debug!(path, error = %e, "Device probe failed");
            Err(BackendError::from(e))
        }
    }
}
