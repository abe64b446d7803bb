// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};

/// Device information from V4L2 capability
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Name of the device (V4L2 card)
    pub card: String,
    /// Driver name (V4L2 driver)
    pub driver: String,
    /// Bus location (V4L2 bus_info), stable across re-enumeration
    pub bus_info: String,
    /// Device path (e.g., /dev/video0)
    pub path: String,
    /// Real device path (resolved symlinks)
    pub real_path: String,
}

/// Represents a camera device
///
/// Immutable once discovered. `id` identifies the device across
/// re-enumerations, `name` is what the menu shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub id: String,
    pub name: String,
    pub path: String,                    // Capture device node
    pub device_info: Option<DeviceInfo>, // V4L2 device information
}

impl CameraDevice {
    pub fn new(id: impl Into<String>, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            device_info: None,
        }
    }
}

impl std::fmt::Display for CameraDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.path)
    }
}

/// Ordered, read-only list of discovered cameras
///
/// Order is discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceList {
    devices: Vec<CameraDevice>,
}

impl DeviceList {
    pub fn new(devices: Vec<CameraDevice>) -> Self {
        Self { devices }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CameraDevice> {
        self.devices.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CameraDevice> {
        self.devices.iter()
    }

    /// Index of the device with the given id
    pub fn position(&self, id: &str) -> Option<usize> {
        self.devices.iter().position(|d| d.id == id)
    }

    /// Device names in list order, for menus
    pub fn names(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.name.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a DeviceList {
    type Item = &'a CameraDevice;
    type IntoIter = std::slice::Iter<'a, CameraDevice>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}

/// How the preview scales video into its window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewGravity {
    /// Stretch to the window, ignoring aspect ratio
    Stretch,
    /// Letterbox, keeping aspect ratio
    Fit,
    /// Crop to fill the window, keeping aspect ratio
    #[default]
    Fill,
}

impl std::str::FromStr for PreviewGravity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stretch" => Ok(PreviewGravity::Stretch),
            "fit" => Ok(PreviewGravity::Fit),
            "fill" => Ok(PreviewGravity::Fill),
            other => Err(format!("unknown gravity '{}'", other)),
        }
    }
}

/// Display settings handed to the preview surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewOptions {
    /// Flip horizontally
    pub mirror: bool,
    pub gravity: PreviewGravity,
    /// Target aspect ratio for [`PreviewGravity::Fill`]
    pub fill_aspect: (i32, i32),
    /// GStreamer sink element name
    pub video_sink: String,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Failed to initialize backend
    InitializationFailed(String),
    /// Camera device not found or disconnected
    DeviceNotFound(String),
    /// Camera is opened by another process
    DeviceBusy(String),
    /// Access to the device node was refused
    PermissionDenied(String),
    /// The session refused the input
    InputRejected(String),
    /// The pipeline failed while running
    StreamError(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::DeviceBusy(msg) => write!(f, "Device busy: {}", msg),
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::InputRejected(msg) => write!(f, "Input rejected: {}", msg),
            BackendError::StreamError(msg) => write!(f, "Stream error: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::EBUSY) => BackendError::DeviceBusy(err.to_string()),
            Some(libc::EACCES) | Some(libc::EPERM) => {
                BackendError::PermissionDenied(err.to_string())
            }
            Some(libc::ENOENT) | Some(libc::ENODEV) | Some(libc::ENXIO) => {
                BackendError::DeviceNotFound(err.to_string())
            }
            _ => BackendError::IoError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_list_position() {
        let list = DeviceList::new(vec![
            CameraDevice::new("usb-1", "Front", "/dev/video0"),
            CameraDevice::new("usb-2", "Desk", "/dev/video2"),
        ]);
        assert_eq!(list.position("usb-2"), Some(1));
        assert_eq!(list.position("usb-3"), None);
        assert_eq!(list.names(), vec!["Front".to_string(), "Desk".to_string()]);
    }

    #[test]
    fn test_io_error_mapping() {
        let busy = std::io::Error::from_raw_os_error(libc::EBUSY);
        assert!(matches!(BackendError::from(busy), BackendError::DeviceBusy(_)));
        let gone = std::io::Error::from_raw_os_error(libc::ENODEV);
        assert!(matches!(BackendError::from(gone), BackendError::DeviceNotFound(_)));
    }
}
