// SPDX-License-Identifier: GPL-3.0-only

//! XDG desktop portal camera access
//!
//! Inside a Flatpak sandbox device nodes are only reachable after the
//! `org.freedesktop.portal.Camera` portal granted access. The portal keeps
//! the user's decision, so every launch asks again and a remembered answer
//! comes back without a dialog.

use super::{AccessRequest, PermissionService, PermissionStatus};
use crate::errors::AuthorizationError;
use futures::StreamExt;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

const PORTAL_DESTINATION: &str = "org.freedesktop.portal.Desktop";
const PORTAL_PATH: &str = "/org/freedesktop/portal/desktop";
const CAMERA_INTERFACE: &str = "org.freedesktop.portal.Camera";
const REQUEST_INTERFACE: &str = "org.freedesktop.portal.Request";

/// Permission service backed by the camera portal
#[derive(Debug, Clone, Default)]
pub struct PortalPermissions;

impl PortalPermissions {
    pub fn new() -> Self {
        Self
    }
}

/// Interpret a `org.freedesktop.portal.Request::Response` code
///
/// 0 = success, 1 = cancelled by the user, 2 = ended another way.
pub fn response_granted(code: u32) -> Result<bool, AuthorizationError> {
    match code {
        0 => Ok(true),
        1 | 2 => Ok(false),
        other => Err(AuthorizationError::UnrecognizedState(format!(
            "portal response code {}",
            other
        ))),
    }
}

/// Object path the portal will use for a request made with `token`
pub fn request_path(unique_name: &str, token: &str) -> String {
    let sender = unique_name.trim_start_matches(':').replace('.', "_");
    format!("{}/request/{}/{}", PORTAL_PATH, sender, token)
}

fn unavailable(e: impl std::fmt::Display) -> AuthorizationError {
    AuthorizationError::ServiceUnavailable(e.to_string())
}

/// Wait for the `Response` signal of a request
async fn await_response(
    mut responses: zbus::proxy::SignalStream<'_>,
) -> Result<bool, AuthorizationError> {
    let msg = responses
        .next()
        .await
        .ok_or_else(|| unavailable("portal request closed without a response"))?;
    let body = msg.body();
    let (code, _results): (u32, HashMap<String, OwnedValue>) =
        body.deserialize().map_err(unavailable)?;
    debug!(code, "Camera portal response");
    response_granted(code)
}

async fn access_camera() -> Result<bool, AuthorizationError> {
    let connection = zbus::Connection::session().await.map_err(unavailable)?;

    let token = format!("camera_mirror_{}", uuid::Uuid::new_v4().simple());
    let unique_name = connection
        .unique_name()
        .ok_or_else(|| unavailable("session bus connection has no unique name"))?
        .to_string();
    let expected_path = request_path(&unique_name, &token);

    // Subscribe before calling so the response cannot be missed
    let request = zbus::Proxy::new(
        &connection,
        PORTAL_DESTINATION,
        expected_path.as_str(),
        REQUEST_INTERFACE,
    )
    .await
    .map_err(unavailable)?;
    let responses = request.receive_signal("Response").await.map_err(unavailable)?;

    let camera = zbus::Proxy::new(&connection, PORTAL_DESTINATION, PORTAL_PATH, CAMERA_INTERFACE)
        .await
        .map_err(unavailable)?;

    let mut options: HashMap<&str, Value> = HashMap::new();
    options.insert("handle_token", Value::from(token.as_str()));

    info!("Requesting camera access through the portal");
    let handle: OwnedObjectPath = camera
        .call("AccessCamera", &(options,))
        .await
        .map_err(unavailable)?;

    if handle.as_str() == expected_path {
        return await_response(responses).await;
    }

    // Portals older than 0.9 pick their own request path
    warn!(handle = %handle.as_str(), "Portal returned an unexpected request handle");
    let request = zbus::Proxy::new(
        &connection,
        PORTAL_DESTINATION,
        handle.as_str(),
        REQUEST_INTERFACE,
    )
    .await
    .map_err(unavailable)?;
    let responses = request.receive_signal("Response").await.map_err(unavailable)?;
    await_response(responses).await
}

impl PermissionService for PortalPermissions {
    fn status(&self) -> Result<PermissionStatus, AuthorizationError> {
        Ok(PermissionStatus::Undetermined)
    }

    fn request_access(&self) -> AccessRequest {
        Box::pin(access_camera())
    }
}
