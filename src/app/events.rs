// SPDX-License-Identifier: GPL-3.0-only

//! Session observers
//!
//! Two channels leave the session actor:
//! - a `watch` channel holding the latest committed [`SessionSnapshot`]
//! - a `broadcast` channel of discrete [`SessionEvent`]s
//!
//! Both are only written after an operation has finished, so subscribers
//! never see a half-switched session.

use super::state::{SessionSnapshot, SessionState};
use crate::backends::camera::CameraDevice;
use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::errors::DeviceUnavailableError;
use tokio::sync::{broadcast, watch};
use tracing::debug;

/// Something observers may want to react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The selected camera changed
    DeviceChanged {
        index: Option<usize>,
        device: Option<CameraDevice>,
    },
    /// The session moved to a new lifecycle state
    StateChanged(SessionState),
    /// The device list was (re-)enumerated
    DevicesEnumerated(Vec<String>),
    /// Camera permission was decided
    PermissionChanged { granted: bool },
    /// Binding or streaming a camera failed; the session is idle
    DeviceUnavailable(DeviceUnavailableError),
}

/// Publishing side of the observer channels
#[derive(Debug)]
pub struct EventBus {
    snapshot: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(SessionSnapshot::default());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { snapshot, events }
    }

    /// Register for discrete events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Register for committed snapshots
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    /// Latest committed snapshot
    pub fn current(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        debug!(?event, "Session event");
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Commit a new snapshot, emitting events for what changed
    pub(crate) fn commit(&self, next: SessionSnapshot) {
        let previous = self.current();

        if previous.device_names != next.device_names {
            self.emit(SessionEvent::DevicesEnumerated(next.device_names.clone()));
        }
        if previous.selected_index != next.selected_index
            || previous.current_device != next.current_device
        {
            self.emit(SessionEvent::DeviceChanged {
                index: next.selected_index,
                device: next.current_device.clone(),
            });
        }
        if previous.state != next.state {
            self.emit(SessionEvent::StateChanged(next.state.clone()));
        }
        if previous.permission_granted != next.permission_granted {
            self.emit(SessionEvent::PermissionChanged {
                granted: next.permission_granted,
            });
        }

        self.snapshot.send_replace(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_emits_only_changes() {
        let bus = EventBus::new();
        let mut events = bus.subscribe();
        let device = CameraDevice::new("a", "A", "/dev/video0");

        bus.commit(SessionSnapshot {
            state: SessionState::Running(device.clone()),
            selected_index: Some(0),
            current_device: Some(device.clone()),
            device_names: vec!["A".into()],
            permission_granted: true,
        });

        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::DevicesEnumerated(vec!["A".into()])
        );
        assert!(matches!(
            events.try_recv().unwrap(),
            SessionEvent::DeviceChanged { index: Some(0), .. }
        ));
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::StateChanged(SessionState::Running(device))
        );
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::PermissionChanged { granted: true }
        );

        // Same snapshot again: nothing new
        bus.commit(bus.current());
        assert!(events.try_recv().is_err());
    }
}
