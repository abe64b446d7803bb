// SPDX-License-Identifier: GPL-3.0-only

//! Shared V4L2 utility functions
//!
//! Raw `VIDIOC_QUERYCAP` access, used by enumeration to read `device_caps`
//! (the per-node capabilities, which the `v4l` crate does not expose
//! separately from the physical device capabilities).

use super::types::DeviceInfo;
use std::os::unix::io::{AsRawFd, RawFd};
use tracing::debug;

/// VIDIOC_QUERYCAP ioctl number
const VIDIOC_QUERYCAP: libc::c_ulong = 0x80685600;

/// V4L2 capability flag for single-planar video capture
pub const V4L2_CAP_VIDEO_CAPTURE: u32 = 0x0000_0001;
/// V4L2 capability flag for multi-planar video capture
pub const V4L2_CAP_VIDEO_CAPTURE_MPLANE: u32 = 0x0000_1000;
/// Set when `device_caps` is filled in
const V4L2_CAP_DEVICE_CAPS: u32 = 0x8000_0000;

/// V4L2 capability structure for VIDIOC_QUERYCAP ioctl
#[repr(C)]
struct V4l2Capability {
    driver: [u8; 16],
    card: [u8; 32],
    bus_info: [u8; 32],
    version: u32,
    capabilities: u32,
    device_caps: u32,
    reserved: [u32; 3],
}

/// Decoded VIDIOC_QUERYCAP result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V4l2Caps {
    pub driver: String,
    pub card: String,
    pub bus_info: String,
    /// Capabilities of this node (falls back to the device-wide set)
    pub node_caps: u32,
}

impl V4l2Caps {
    /// Whether this node delivers video frames (as opposed to metadata)
    pub fn is_video_capture(&self) -> bool {
        self.node_caps & (V4L2_CAP_VIDEO_CAPTURE | V4L2_CAP_VIDEO_CAPTURE_MPLANE) != 0
    }
}

/// Query V4L2 capabilities for an open file descriptor.
///
/// Issues the `VIDIOC_QUERYCAP` ioctl and returns the capability struct,
/// or `None` if the ioctl fails.
fn query_v4l2_cap(fd: RawFd) -> Option<V4l2Capability> {
    let mut cap: V4l2Capability = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(fd, VIDIOC_QUERYCAP as _, &mut cap as *mut V4l2Capability) };
    if result < 0 { None } else { Some(cap) }
}

/// Convert a NUL-padded ioctl string field
fn c_field(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).trim().to_string()
}

/// Query and decode the capabilities of a device node
pub fn query_caps(device_path: &str) -> Option<V4l2Caps> {
    let file = std::fs::File::open(device_path).ok()?;
    let cap = query_v4l2_cap(file.as_raw_fd())?;

    let node_caps = if cap.capabilities & V4L2_CAP_DEVICE_CAPS != 0 {
        cap.device_caps
    } else {
        cap.capabilities
    };

    let caps = V4l2Caps {
        driver: c_field(&cap.driver),
        card: c_field(&cap.card),
        bus_info: c_field(&cap.bus_info),
        node_caps,
    };
    debug!(
        device_path,
        driver = %caps.driver,
        node_caps = format!("{:#x}", node_caps),
        "Queried V4L2 caps"
    );
    Some(caps)
}

/// Build DeviceInfo from a V4L2 device path and its capabilities
///
/// Resolves symlinks to get the real device path.
pub fn build_device_info(v4l2_path: &str, caps: &V4l2Caps) -> DeviceInfo {
    let real_path = std::fs::canonicalize(v4l2_path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| v4l2_path.to_string());

    DeviceInfo {
        card: caps.card.clone(),
        driver: caps.driver.clone(),
        bus_info: caps.bus_info.clone(),
        path: v4l2_path.to_string(),
        real_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_field_stops_at_nul() {
        let mut raw = [0u8; 16];
        raw[..6].copy_from_slice(b"uvcvid");
        assert_eq!(c_field(&raw), "uvcvid");
        assert_eq!(c_field(b"full"), "full");
    }

    #[test]
    fn test_metadata_node_is_not_capture() {
        let caps = V4l2Caps {
            driver: "uvcvideo".into(),
            card: "Integrated Camera".into(),
            bus_info: "usb-0000:00:14.0-5".into(),
            node_caps: 0x0480_0000, // META_CAPTURE | STREAMING
        };
        assert!(!caps.is_video_capture());

        let caps = V4l2Caps {
            node_caps: 0x0420_0001,
            ..caps
        };
        assert!(caps.is_video_capture());
    }
}
