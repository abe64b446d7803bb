// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera mirror application
//!
//! Failures fall into three groups:
//! - [`AuthorizationError`]: the permission service reported something the
//!   application cannot interpret. Fatal.
//! - [`DeviceUnavailableError`]: a camera could not be bound or started.
//!   Recovered locally, the session falls back to idle.
//! - [`InvariantViolation`]: a caller broke the controller contract. Never
//!   masked, it terminates the session actor.

use crate::backends::camera::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Permission service errors
    Authorization(AuthorizationError),
    /// Capture session errors
    Session(SessionError),
    /// Camera backend errors outside a session operation
    Backend(BackendError),
    /// Configuration errors
    Config(String),
    /// Terminal or other I/O errors
    Io(String),
    /// Generic error with message
    Other(String),
}

/// Permission service errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// The service reported an authorization state we do not know
    UnrecognizedState(String),
    /// The permission service could not be reached
    ServiceUnavailable(String),
}

impl AuthorizationError {
    /// Whether the process must terminate instead of continuing without access
    pub fn is_fatal(&self) -> bool {
        matches!(self, AuthorizationError::UnrecognizedState(_))
    }
}

/// A camera could not be bound to the capture session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUnavailableError {
    /// Human-readable device name
    pub device: String,
    /// Backend-provided reason
    pub reason: String,
}

/// Caller-contract breaches on the capture session controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// `prepare()` was called before a device was selected
    NoCurrentDevice,
    /// A second device input was added while one is still attached
    DuplicateInput {
        attached: String,
        requested: String,
    },
}

/// Errors returned by capture session controller operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Environmental failure, the session is idle again
    DeviceUnavailable(DeviceUnavailableError),
    /// Programmer error
    Invariant(InvariantViolation),
    /// A selection index outside the device list; nothing changed
    InvalidSelection { index: usize, len: usize },
}

impl SessionError {
    /// Whether the error means the caller broke the controller contract
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, SessionError::Invariant(_))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Authorization(e) => write!(f, "Authorization error: {}", e),
            AppError::Session(e) => write!(f, "Session error: {}", e),
            AppError::Backend(e) => write!(f, "Camera backend error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorizationError::UnrecognizedState(state) => {
                write!(f, "Unrecognized camera authorization state: {}", state)
            }
            AuthorizationError::ServiceUnavailable(msg) => {
                write!(f, "Permission service unavailable: {}", msg)
            }
        }
    }
}

impl fmt::Display for DeviceUnavailableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Camera '{}' is unavailable: {}", self.device, self.reason)
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::NoCurrentDevice => {
                write!(f, "prepare() called without a current device")
            }
            InvariantViolation::DuplicateInput {
                attached,
                requested,
            } => write!(
                f,
                "Cannot add input for '{}' while '{}' is still attached",
                requested, attached
            ),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::DeviceUnavailable(e) => write!(f, "{}", e),
            SessionError::Invariant(e) => write!(f, "Invariant violation: {}", e),
            SessionError::InvalidSelection { index, len } => {
                write!(f, "Camera index {} out of range ({} cameras)", index, len)
            }
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for AuthorizationError {}
impl std::error::Error for DeviceUnavailableError {}
impl std::error::Error for InvariantViolation {}
impl std::error::Error for SessionError {}

// Conversions from sub-errors
impl From<AuthorizationError> for AppError {
    fn from(err: AuthorizationError) -> Self {
        AppError::Authorization(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Backend(err)
    }
}

impl From<DeviceUnavailableError> for SessionError {
    fn from(err: DeviceUnavailableError) -> Self {
        SessionError::DeviceUnavailable(err)
    }
}

impl From<InvariantViolation> for SessionError {
    fn from(err: InvariantViolation) -> Self {
        SessionError::Invariant(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unrecognized_state_is_fatal() {
        assert!(AuthorizationError::UnrecognizedState("7".into()).is_fatal());
        assert!(!AuthorizationError::ServiceUnavailable("no bus".into()).is_fatal());
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::DeviceUnavailable(DeviceUnavailableError {
            device: "Integrated Camera".into(),
            reason: "busy".into(),
        });
        assert_eq!(err.to_string(), "Camera 'Integrated Camera' is unavailable: busy");
        assert!(!err.is_invariant_violation());

        let err: SessionError = InvariantViolation::NoCurrentDevice.into();
        assert!(err.is_invariant_violation());
    }
}
