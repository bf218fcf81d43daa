//! Seam between the status icon and the native shell.

use crate::error::Result;
use crate::menu::NativeMenu;
use crate::tray::event::TrayMessage;
use crate::tray::state::{IconHandle, NotifyIconData};

/// Operation requested from the shell for an icon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyAction {
    /// Show the icon.
    Add,
    /// Update an icon already shown.
    Modify,
    /// Remove the icon.
    Delete,
}

/// The native notification-area API.
///
/// Implementations own the hidden message window the icon reports to. All
/// methods are called from the thread running the host's message loop.
pub trait Shell {
    /// Whether the message window exists. The icon skips every native call
    /// while detached.
    fn is_attached(&self) -> bool;

    /// Adds, modifies or deletes the icon described by `data`.
    fn notify_icon(&mut self, action: NotifyAction, data: &NotifyIconData) -> Result<()>;

    /// Loads the icon resource named `resource` from the executable.
    fn load_icon(&mut self, resource: &str) -> Result<IconHandle>;

    /// Releases an icon returned by [`Shell::load_icon`].
    fn destroy_icon(&mut self, icon: IconHandle) -> Result<()>;

    /// Shows `menu` as a popup at the cursor and waits for the user.
    ///
    /// Returns the chosen command, or 0 when the menu was dismissed.
    fn track_popup_menu(&mut self, menu: &NativeMenu) -> Result<u32>;

    /// Callbacks received by the message window since the last call.
    fn pending_messages(&mut self) -> Vec<TrayMessage>;
}
