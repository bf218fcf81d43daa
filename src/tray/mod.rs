//! Notification-area icon.
//!
//! This module contains the status icon controller, its state and events, and
//! the Win32 bridge that connects it to the Windows shell.

pub mod event;
pub mod shell;
pub mod state;
pub mod status_icon;

#[cfg(windows)]
pub mod win32;

pub use event::{TRAY_CALLBACK_MESSAGE, TrayEvent, TrayMessage};
pub use shell::{NotifyAction, Shell};
pub use state::{Balloon, IconHandle, NotifyFlags, NotifyIconData, TrayConfig, truncate_utf16};
pub use status_icon::StatusIcon;

#[cfg(windows)]
pub use win32::Win32Shell;

/// Status icon wired to the Windows shell.
#[cfg(windows)]
pub type Win32StatusIcon = StatusIcon<Win32Shell>;
