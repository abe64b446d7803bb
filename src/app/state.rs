// SPDX-License-Identifier: GPL-3.0-only

//! Session and selection state

use crate::backends::camera::CameraDevice;
use crate::errors::SessionError;

/// Capture session lifecycle
///
/// ```text
/// Idle ──bind_and_start──▶ Running ──stop──▶ Bound
///  ▲                                           │
///  └──────────────unbind / failure─────────────┘
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No input attached
    #[default]
    Idle,
    /// Input attached, not streaming
    Bound(CameraDevice),
    /// Input attached and streaming
    Running(CameraDevice),
}

impl SessionState {
    /// Check if currently streaming
    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running(_))
    }

    /// Device of the attached input, if any
    pub fn device(&self) -> Option<&CameraDevice> {
        match self {
            SessionState::Idle => None,
            SessionState::Bound(device) | SessionState::Running(device) => Some(device),
        }
    }

    /// Short label for status lines
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Bound(_) => "Stopped",
            SessionState::Running(_) => "Running",
        }
    }
}

/// Index of the selected camera
///
/// Always `Some(i)` with `i < len` for a non-empty list, `None` otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionState {
    index: Option<usize>,
}

impl SelectionState {
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Select `index`, rejecting it when outside `0..len`
    pub fn select(&mut self, index: usize, len: usize) -> Result<(), SessionError> {
        if index >= len {
            return Err(SessionError::InvalidSelection { index, len });
        }
        self.index = Some(index);
        Ok(())
    }

    /// Pull the index back into range after the list changed to `len` entries
    pub fn clamp(&mut self, len: usize) {
        self.index = match (self.index, len) {
            (_, 0) => None,
            (None, _) => Some(0),
            (Some(i), len) => Some(i.min(len - 1)),
        };
    }
}

/// Committed controller state as observers see it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub selected_index: Option<usize>,
    pub current_device: Option<CameraDevice>,
    pub device_names: Vec<String>,
    pub permission_granted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection_for(len: usize) -> SelectionState {
        let mut selection = SelectionState::default();
        selection.clamp(len);
        selection
    }

    #[test]
    fn test_selection_defaults() {
        assert_eq!(selection_for(0).index(), None);
        assert_eq!(selection_for(3).index(), Some(0));
    }

    #[test]
    fn test_select_rejects_out_of_range() {
        let mut selection = selection_for(2);
        assert!(selection.select(1, 2).is_ok());
        assert_eq!(
            selection.select(2, 2),
            Err(SessionError::InvalidSelection { index: 2, len: 2 })
        );
        assert_eq!(selection.index(), Some(1));
    }

    #[test]
    fn test_clamp_follows_list_length() {
        let mut selection = selection_for(3);
        selection.select(2, 3).unwrap();

        selection.clamp(2);
        assert_eq!(selection.index(), Some(1));

        selection.clamp(0);
        assert_eq!(selection.index(), None);

        selection.clamp(4);
        assert_eq!(selection.index(), Some(0));
    }

    #[test]
    fn test_state_device() {
        let device = CameraDevice::new("a", "A", "/dev/video0");
        assert_eq!(SessionState::Idle.device(), None);
        assert_eq!(SessionState::Bound(device.clone()).device(), Some(&device));
        assert!(SessionState::Running(device).is_running());
    }
}
