// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Showing a single camera preview without the terminal menu

use camera_mirror::Config;
use camera_mirror::app::{self, SessionEvent};
use camera_mirror::backends::{camera, permission};
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let status = permission::get_permission_service().status()?;
    println!("Camera permission: {:?}", status);
    println!();

    let cameras = camera::get_enumerator().enumerate()?;
    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Device: {}", camera.path);
        if let Some(info) = &camera.device_info {
            println!("      Driver: {} ({})", info.driver, info.bus_info);
        }
        println!();
    }

    Ok(())
}

/// Run the preview of one camera until Ctrl+C
pub fn run_preview(config: &Config, camera_index: usize) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(preview(config, camera_index))
}

async fn preview(config: &Config, camera_index: usize) -> Result<(), Box<dyn std::error::Error>> {
    let (mut actor, handle) = app::build_session(config)?;

    if let Err(e) = actor.select_initial(camera_index) {
        if actor.controller().devices().is_empty() {
            return Err("No cameras found".into());
        }
        return Err(e.into());
    }

    // Set up Ctrl+C handler
    let ctrlc_handle = handle.clone();
    ctrlc::set_handler(move || {
        // Fails only once the actor is gone
        let _ = ctrlc_handle.shutdown();
    })?;

    println!("Previewing... (press Ctrl+C to stop)");
    let mut events = handle.subscribe();
    let mut actor_task = tokio::spawn(actor.run());

    loop {
        tokio::select! {
            result = &mut actor_task => {
                result??;
                info!("Preview finished");
                return Ok(());
            }
            event = events.recv() => match event {
                Ok(SessionEvent::StateChanged(state)) => match state.device() {
                    Some(device) => println!("{}: {}", state.label(), device.name),
                    None => println!("{}", state.label()),
                },
                Ok(SessionEvent::PermissionChanged { granted }) => {
                    info!(granted, "Camera permission changed");
                }
                Ok(SessionEvent::DeviceUnavailable(e)) => eprintln!("{}", e),
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => {
                    actor_task.await??;
                    return Ok(());
                }
            },
        }
    }
}
