//! Error type shared by the platform bridges.
//!
//! The adapters themselves never propagate these to the application: they log
//! and keep their previous state. Errors only travel across the trait seams
//! (`IdleService`, `SessionManager`, `Shell`) and out of the constructors that
//! open a platform connection.

use thiserror::Error;

/// Errors raised by the external services the adapters talk to.
#[derive(Debug, Error)]
pub enum Error {
    /// A D-Bus call or connection failed.
    #[cfg(all(target_os = "linux", feature = "mutter"))]
    #[error("D-Bus error: {0}")]
    DBus(#[from] zbus::Error),

    /// A standard D-Bus interface (e.g. `org.freedesktop.DBus.Properties`) failed.
    #[cfg(all(target_os = "linux", feature = "mutter"))]
    #[error("D-Bus interface error: {0}")]
    Fdo(#[from] zbus::fdo::Error),

    /// A Win32 call failed.
    #[cfg(windows)]
    #[error("Win32 error: {0}")]
    Win32(#[from] windows::core::Error),

    /// A service reported a failure that has no richer representation.
    #[error("{operation} failed: {message}")]
    Service {
        /// Name of the operation that failed, e.g. `AddIdleWatch`.
        operation: &'static str,
        /// Human readable reason.
        message: String,
    },
}

impl Error {
    /// Builds a [`Error::Service`] for `operation`.
    pub fn service(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            operation,
            message: message.into(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
