//! Idle monitoring.
//!
//! This module contains the activity monitor that turns the desktop's idle
//! watches into a once-per-second activity callback, the traits it needs from
//! the desktop, and the GNOME Mutter bridge implementing them over D-Bus.

pub mod monitor;
pub mod service;

#[cfg(all(target_os = "linux", feature = "mutter"))]
pub mod mutter;

pub use monitor::{ActivityCallback, IdleMonitor, IdleMonitorConfig, MonitorHandle};
pub use service::{IdleService, SessionManager, WatchId, inhibit};

#[cfg(all(target_os = "linux", feature = "mutter"))]
pub use mutter::{GnomeSession, MutterIdleService, MutterInputMonitor, connect_session_monitor};
