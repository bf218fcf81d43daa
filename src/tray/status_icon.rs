//! Status icon controller.
//!
//! This module contains [`StatusIcon`], which owns the notification-area icon,
//! keeps its descriptor in sync with the application's state, shows the
//! context menu and turns clicks into [`TrayEvent`]s.

use crate::menu::{self, MenuModel};
use crate::mode::OperationMode;
use crate::tray::event::{TrayEvent, TrayMessage};
use crate::tray::shell::{NotifyAction, Shell};
use crate::tray::state::{
    BALLOON_TEXT_CAPACITY, BALLOON_TITLE_CAPACITY, IconHandle, NotifyFlags, NotifyIconData,
    TOOLTIP_CAPACITY, TrayConfig, truncate_utf16,
};
use std::rc::Rc;
use std::sync::mpsc::{Receiver, Sender, channel};

/// A notification-area icon with a context menu.
///
/// Single-threaded: create it and feed it messages from the thread running
/// the host's message loop.
///
/// # Example
///
/// ```rust,ignore
/// let mut icon = StatusIcon::new(Win32Shell::new(), menu_model, core.operation_mode(), TrayConfig::default());
/// let events = icon.events();
/// icon.set_visible(true);
///
/// // in the message loop
/// icon.process_messages();
/// while let Ok(event) = events.try_recv() {
///     match event {
///         TrayEvent::Activate => main_window.present(),
///         TrayEvent::BalloonActivate(id) => core.balloon_clicked(&id),
///     }
/// }
/// ```
pub struct StatusIcon<S: Shell> {
    shell: S,
    menu: Rc<dyn MenuModel>,
    config: TrayConfig,
    data: NotifyIconData,
    mode: Option<OperationMode>,
    visible: bool,
    current_balloon: String,
    event_sender: Option<Sender<TrayEvent>>,
}

impl<S: Shell> StatusIcon<S> {
    /// Creates a hidden icon showing the image for `mode`.
    ///
    /// `shell` has already set up the message window; if that failed the icon
    /// still tracks its state but never reaches the native API.
    pub fn new(shell: S, menu: Rc<dyn MenuModel>, mode: OperationMode, config: TrayConfig) -> Self {
        if !shell.is_attached() {
            tracing::warn!("status icon has no message window, native calls are disabled");
        }

        let mut icon = Self {
            shell,
            menu,
            config,
            data: NotifyIconData::default(),
            mode: None,
            visible: false,
            current_balloon: String::new(),
            event_sender: None,
        };

        let title = icon.config.title.clone();
        icon.set_tooltip(&title);
        icon.set_operation_mode(mode);
        icon
    }

    /// Subscribes to the icon's events.
    ///
    /// Only the most recent receiver gets events.
    pub fn events(&mut self) -> Receiver<TrayEvent> {
        let (tx, rx) = channel();
        self.event_sender = Some(tx);
        rx
    }

    /// Shows or hides the icon. Does nothing if it is already in that state.
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }

        self.visible = visible;
        if self.shell.is_attached() {
            self.notify(if visible {
                NotifyAction::Add
            } else {
                NotifyAction::Delete
            });
        }
    }

    /// Whether the icon is shown.
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Whether the icon is embedded in a notification area.
    pub fn is_embedded(&self) -> bool {
        true
    }

    /// Sets the hover text.
    pub fn set_tooltip(&mut self, text: &str) {
        self.data.tooltip = truncate_utf16(text, TOOLTIP_CAPACITY);
        self.data.flags.insert(NotifyFlags::TIP);
        self.modify();
    }

    /// Shows a balloon notification; clicking it raises
    /// [`TrayEvent::BalloonActivate`] with `id`.
    pub fn show_balloon(&mut self, id: &str, text: &str) {
        self.current_balloon = id.to_string();

        self.data.balloon.title = truncate_utf16(&self.config.title, BALLOON_TITLE_CAPACITY);
        self.data.balloon.text = truncate_utf16(text, BALLOON_TEXT_CAPACITY);
        self.data.balloon.timeout = self.config.balloon_timeout;
        self.data.flags.insert(NotifyFlags::INFO);

        self.modify();

        // later updates must not show the balloon again
        self.data.flags.remove(NotifyFlags::INFO);
    }

    /// Switches the icon image to the one configured for `mode`.
    ///
    /// If the image cannot be loaded the current one stays.
    pub fn set_operation_mode(&mut self, mode: OperationMode) {
        let resource = self.config.icon_resource(mode).to_string();
        let icon = match self.shell.load_icon(&resource) {
            Ok(icon) => icon,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    resource = %resource,
                    ?mode,
                    "failed to load status icon"
                );
                return;
            }
        };

        let previous = self.data.icon.replace(icon);
        self.data.flags.insert(NotifyFlags::ICON);
        self.mode = Some(mode);
        self.modify();

        if let Some(previous) = previous {
            self.destroy_icon(previous);
        }
    }

    /// The mode whose image is shown, if any image could be loaded.
    pub fn operation_mode(&self) -> Option<OperationMode> {
        self.mode
    }

    /// The current icon descriptor.
    pub fn icon_data(&self) -> &NotifyIconData {
        &self.data
    }

    /// The shell the icon talks to.
    pub fn shell(&self) -> &S {
        &self.shell
    }

    /// Handles every callback the shell received since the last call.
    pub fn process_messages(&mut self) {
        for message in self.shell.pending_messages() {
            self.handle_message(message);
        }
    }

    /// Handles one callback from the shell.
    pub fn handle_message(&mut self, message: TrayMessage) {
        tracing::trace!(?message, "status icon message");
        match message {
            TrayMessage::RightButtonDown => self.show_menu(),
            TrayMessage::LeftButtonDown => self.emit(TrayEvent::Activate),
            TrayMessage::BalloonClicked => {
                let id = self.current_balloon.clone();
                self.emit(TrayEvent::BalloonActivate(id));
            }
            TrayMessage::TaskbarCreated => {
                if self.visible && self.shell.is_attached() {
                    self.notify(NotifyAction::Add);
                }
            }
        }
    }

    /// Shows the context menu at the cursor and activates the chosen node.
    pub fn show_menu(&mut self) {
        let root = self.menu.root();
        let rendered = menu::render(&root);

        let command = match self.shell.track_popup_menu(&rendered.menu) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(error = %e, "failed to show status icon menu");
                return;
            }
        };

        let Some(id) = rendered.commands.node_id(command) else {
            return;
        };
        match root.find(id) {
            Some(node) => {
                tracing::debug!(id, "menu entry chosen");
                node.activate();
            }
            None => tracing::debug!(id, command, "chosen menu entry no longer exists"),
        }
    }

    fn emit(&self, event: TrayEvent) {
        if let Some(ref tx) = self.event_sender {
            let _ = tx.send(event);
        }
    }

    fn modify(&mut self) {
        if self.shell.is_attached() && self.visible {
            self.notify(NotifyAction::Modify);
        }
    }

    fn notify(&mut self, action: NotifyAction) {
        if let Err(e) = self.shell.notify_icon(action, &self.data) {
            tracing::warn!(error = %e, ?action, "status icon update failed");
        }
    }

    fn destroy_icon(&mut self, icon: IconHandle) {
        if let Err(e) = self.shell.destroy_icon(icon) {
            tracing::warn!(error = %e, "failed to destroy status icon image");
        }
    }
}

impl<S: Shell> Drop for StatusIcon<S> {
    fn drop(&mut self) {
        if self.shell.is_attached() && self.visible {
            self.notify(NotifyAction::Delete);
        }
        if let Some(icon) = self.data.icon.take() {
            self.destroy_icon(icon);
        }
    }
}
