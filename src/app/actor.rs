// SPDX-License-Identifier: GPL-3.0-only

//! Session actor
//!
//! The only owner of the permission gate and the session controller.
//! Control surfaces talk to it through a [`SessionHandle`]; the permission
//! request continuation comes back through the same command channel, so
//! every state change happens on this one task.

use super::controller::CaptureSessionController;
use super::events::{EventBus, SessionEvent};
use super::permission::{Authorization, PermissionGate};
use super::state::SessionSnapshot;
use crate::backends::camera::CaptureSession;
use crate::constants::timing;
use crate::errors::{AppError, AppResult, AuthorizationError, SessionError};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

/// Requests accepted by the session actor
#[derive(Debug)]
pub enum Command {
    /// Switch to the camera at this index
    Select(usize),
    /// (Re)start the selected camera
    Prepare,
    /// Stop streaming, keep the camera bound
    Stop,
    /// Re-enumerate cameras
    Refresh,
    /// Outcome of a camera access request
    PermissionResolved(Result<bool, AuthorizationError>),
    /// Release the camera and end the actor
    Shutdown,
}

/// Cloneable access to a running session actor
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    bus: Arc<EventBus>,
}

impl SessionHandle {
    fn send(&self, command: Command) -> AppResult<()> {
        self.commands
            .send(command)
            .map_err(|_| AppError::Other("session actor has stopped".to_string()))
    }

    pub fn select(&self, index: usize) -> AppResult<()> {
        self.send(Command::Select(index))
    }

    pub fn prepare(&self) -> AppResult<()> {
        self.send(Command::Prepare)
    }

    pub fn stop(&self) -> AppResult<()> {
        self.send(Command::Stop)
    }

    pub fn refresh(&self) -> AppResult<()> {
        self.send(Command::Refresh)
    }

    pub fn shutdown(&self) -> AppResult<()> {
        self.send(Command::Shutdown)
    }

    /// Register for discrete session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.bus.subscribe()
    }

    /// Register for committed snapshots
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.bus.watch()
    }

    /// Latest committed snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.bus.current()
    }
}

pub struct SessionActor<S: CaptureSession> {
    controller: CaptureSessionController<S>,
    gate: PermissionGate,
    bus: Arc<EventBus>,
    commands: mpsc::UnboundedReceiver<Command>,
    continuation: mpsc::UnboundedSender<Command>,
}

impl<S: CaptureSession> SessionActor<S> {
    pub fn new(
        controller: CaptureSessionController<S>,
        gate: PermissionGate,
    ) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let bus = Arc::new(EventBus::new());

        let handle = SessionHandle {
            commands: tx.clone(),
            bus: Arc::clone(&bus),
        };
        let actor = Self {
            controller,
            gate,
            bus,
            commands: rx,
            continuation: tx,
        };
        (actor, handle)
    }

    pub fn controller(&self) -> &CaptureSessionController<S> {
        &self.controller
    }

    /// Choose the camera the actor starts with
    ///
    /// Enumerates right away so the index can be checked. The selection
    /// then follows that camera through the startup enumeration.
    pub fn select_initial(&mut self, index: usize) -> AppResult<()> {
        self.controller.enumerate_devices()?;
        self.controller.set_selection(index)?;
        Ok(())
    }

    /// Run until shutdown or a fatal error
    ///
    /// Fatal means an unrecognized authorization state or a controller
    /// invariant violation. Device failures are published and the loop goes
    /// on.
    pub async fn run(mut self) -> AppResult<()> {
        self.startup()?;

        let mut health = tokio::time::interval(timing::HEALTH_CHECK_INTERVAL);
        health.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        None | Some(Command::Shutdown) => break,
                        Some(command) => self.handle(command)?,
                    }
                }
                _ = health.tick() => {
                    let result = self.controller.check_health();
                    self.finish(result)?;
                }
            }
        }

        info!("Session actor shutting down");
        self.controller.unbind();
        self.publish();
        Ok(())
    }

    fn startup(&mut self) -> AppResult<()> {
        if let Err(e) = self.controller.enumerate_devices() {
            warn!(error = %e, "Camera enumeration failed");
        }

        match self.gate.check_authorization()? {
            Authorization::Granted => {
                let result = self.prepare_selected();
                self.finish(result)?;
            }
            Authorization::Pending(request) => {
                let continuation = self.continuation.clone();
                tokio::spawn(async move {
                    let result = request.await;
                    // The actor may be gone already
                    let _ = continuation.send(Command::PermissionResolved(result));
                });
                self.publish();
            }
            Authorization::Denied => self.publish(),
        }
        Ok(())
    }

    /// Process one command and publish the committed result
    pub fn handle(&mut self, command: Command) -> AppResult<()> {
        debug!(?command, "Handling command");

        let result = match command {
            Command::Select(index) if self.gate.is_granted() => {
                self.controller.select_device(index)
            }
            Command::Select(index) => {
                info!(index, "Camera access not granted, only moving the selection");
                self.controller.set_selection(index).map(|_| ())
            }
            Command::Prepare if self.gate.is_granted() => self.prepare_selected(),
            Command::Prepare => {
                warn!("Ignoring prepare request without camera access");
                Ok(())
            }
            Command::Stop => {
                self.controller.stop();
                Ok(())
            }
            Command::Refresh => self.controller.refresh(),
            Command::PermissionResolved(result) => {
                if self.gate.resolve(result)? {
                    self.prepare_selected()
                } else {
                    Ok(())
                }
            }
            Command::Shutdown => Ok(()),
        };

        self.finish(result)
    }

    fn prepare_selected(&mut self) -> Result<(), SessionError> {
        if self.controller.current_device().is_none() {
            warn!("No camera to prepare");
            return Ok(());
        }
        self.controller.prepare()
    }

    /// Publish the committed state, then report the outcome
    fn finish(&self, result: Result<(), SessionError>) -> AppResult<()> {
        self.publish();

        match result {
            Ok(()) => Ok(()),
            Err(SessionError::DeviceUnavailable(e)) => {
                self.bus.emit(SessionEvent::DeviceUnavailable(e));
                Ok(())
            }
            Err(e @ SessionError::InvalidSelection { .. }) => {
                warn!(error = %e, "Rejected camera selection");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Session invariant violated");
                Err(e.into())
            }
        }
    }

    fn publish(&self) {
        self.bus.commit(SessionSnapshot {
            state: self.controller.state().clone(),
            selected_index: self.controller.selected_index(),
            current_device: self.controller.current_device().cloned(),
            device_names: self.controller.devices().names(),
            permission_granted: self.gate.is_granted(),
        });
    }
}
