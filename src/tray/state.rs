//! Status icon state.
//!
//! This module holds the adapter-side copy of the native icon descriptor and
//! the configuration the icon is created with.

use crate::mode::OperationMode;
use crate::tray::event::TRAY_CALLBACK_MESSAGE;
use std::time::Duration;

/// Capacity, in UTF-16 units including the terminator, of the tooltip buffer.
pub const TOOLTIP_CAPACITY: usize = 128;
/// Capacity of the balloon text buffer.
pub const BALLOON_TEXT_CAPACITY: usize = 256;
/// Capacity of the balloon title buffer.
pub const BALLOON_TITLE_CAPACITY: usize = 64;

/// Which members of [`NotifyIconData`] the shell should look at.
///
/// Values match the `NIF_*` constants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NotifyFlags(u32);

impl NotifyFlags {
    /// `callback_message` is valid.
    pub const MESSAGE: Self = Self(0x01);
    /// `icon` is valid.
    pub const ICON: Self = Self(0x02);
    /// `tooltip` is valid.
    pub const TIP: Self = Self(0x04);
    /// `balloon` is valid and should be shown.
    pub const INFO: Self = Self(0x10);

    /// Raw bit value.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether all bits of `other` are set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets the bits of `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clears the bits of `other`.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

/// Handle of a loaded native icon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IconHandle(pub isize);

/// Balloon notification attached to the icon.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Balloon {
    /// Title line.
    pub title: String,
    /// Message body.
    pub text: String,
    /// How long the shell should show the balloon.
    pub timeout: Duration,
}

/// Adapter-side copy of the native icon descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotifyIconData {
    /// Identifier of the icon within its window.
    pub id: u32,
    /// Valid members.
    pub flags: NotifyFlags,
    /// Window message used for callbacks.
    pub callback_message: u32,
    /// The icon image.
    pub icon: Option<IconHandle>,
    /// Hover text.
    pub tooltip: String,
    /// Balloon to show when [`NotifyFlags::INFO`] is set.
    pub balloon: Balloon,
}

impl Default for NotifyIconData {
    fn default() -> Self {
        Self {
            id: 1,
            flags: NotifyFlags::MESSAGE,
            callback_message: TRAY_CALLBACK_MESSAGE,
            icon: None,
            tooltip: String::new(),
            balloon: Balloon::default(),
        }
    }
}

/// Configuration of the status icon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrayConfig {
    /// Application title, used as initial tooltip and balloon title.
    pub title: String,
    /// Icon resource shown in [`OperationMode::Normal`].
    pub icon_normal: String,
    /// Icon resource shown in [`OperationMode::Quiet`].
    pub icon_quiet: String,
    /// Icon resource shown in [`OperationMode::Suspended`].
    pub icon_suspended: String,
    /// How long balloons stay up.
    pub balloon_timeout: Duration,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            title: "Restwatch".to_string(),
            icon_normal: "restwatch".to_string(),
            icon_quiet: "restwatchquiet".to_string(),
            icon_suspended: "restwatchsusp".to_string(),
            balloon_timeout: Duration::from_secs(20),
        }
    }
}

impl TrayConfig {
    /// The icon resource for `mode`.
    pub fn icon_resource(&self, mode: OperationMode) -> &str {
        match mode {
            OperationMode::Normal => &self.icon_normal,
            OperationMode::Quiet => &self.icon_quiet,
            OperationMode::Suspended => &self.icon_suspended,
        }
    }
}

/// Truncates `text` so it fits a native buffer of `capacity` UTF-16 units,
/// terminator included. Surrogate pairs are never split.
pub fn truncate_utf16(text: &str, capacity: usize) -> String {
    let limit = capacity.saturating_sub(1);
    let mut units = 0;
    let mut end = 0;

    for (index, c) in text.char_indices() {
        units += c.len_utf16();
        if units > limit {
            return text[..end].to_string();
        }
        end = index + c.len_utf8();
    }
    text.to_string()
}
