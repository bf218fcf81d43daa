//! Events flowing in and out of the status icon.
//!
//! [`TrayMessage`]s are the native notifications the icon receives from the
//! shell; [`TrayEvent`]s are what the icon raises towards the application core.

/// Signals raised by the status icon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrayEvent {
    /// The icon was left-clicked.
    Activate,
    /// The balloon with the given id was clicked.
    BalloonActivate(String),
}

/// Native callbacks received by the icon's message window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrayMessage {
    /// Left mouse button pressed on the icon.
    LeftButtonDown,
    /// Right mouse button pressed on the icon.
    RightButtonDown,
    /// The user clicked the balloon notification.
    BalloonClicked,
    /// Explorer restarted; icons have to be added again.
    TaskbarCreated,
}

/// Window message the shell uses for icon callbacks (`WM_USER + 0x100`).
pub const TRAY_CALLBACK_MESSAGE: u32 = 0x0400 + 0x100;

const WM_LBUTTONDOWN: u32 = 0x0201;
const WM_RBUTTONDOWN: u32 = 0x0204;
const NIN_BALLOONUSERCLICK: u32 = 0x0400 + 5;

impl TrayMessage {
    /// Decodes a window message received by the icon's window.
    ///
    /// `taskbar_created` is the registered `TaskbarCreated` message, or 0 if
    /// registration failed.
    pub fn decode(message: u32, lparam: isize, taskbar_created: u32) -> Option<Self> {
        if taskbar_created != 0 && message == taskbar_created {
            return Some(Self::TaskbarCreated);
        }
        if message != TRAY_CALLBACK_MESSAGE {
            return None;
        }

        match u32::try_from(lparam).ok()? {
            WM_RBUTTONDOWN => Some(Self::RightButtonDown),
            WM_LBUTTONDOWN => Some(Self::LeftButtonDown),
            NIN_BALLOONUSERCLICK => Some(Self::BalloonClicked),
            _ => None,
        }
    }
}
