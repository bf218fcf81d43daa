//! # restwatch-platform
//!
//! Platform adapters for a desktop break reminder: an activity monitor for the
//! GNOME desktop built on Mutter's idle watches over D-Bus, and a Windows
//! notification-area icon with a context menu.
//!
//! ## Overview
//!
//! Both adapters are thin. Each one translates a single desktop API into a
//! small in-process signal and is split into a core, which can be tested on any
//! host, and a platform bridge, compiled only where the API exists:
//!
//! - [`idle::IdleMonitor`] tracks user activity from the idle service's watches
//!   and calls back roughly once per second while the user is active. The
//!   `mutter` feature (enabled by default, Linux only) adds
//!   [`idle::connect_session_monitor`], which wires it to
//!   `org.gnome.Mutter.IdleMonitor` and `org.gnome.SessionManager`.
//! - [`tray::StatusIcon`] owns a notification-area icon, renders the
//!   application's [`menu::MenuNode`] tree into a popup menu on right-click and
//!   reports clicks as [`tray::TrayEvent`]s. On Windows, `tray::Win32Shell`
//!   connects it to `Shell_NotifyIconW`.
//!
//! Failures of the desktop services never reach the application: the adapters
//! log them through `tracing` and keep their previous state.
//!
//! ## Usage
//!
//! ### Idle monitoring on GNOME
//!
//! ```rust,ignore
//! use restwatch_platform::idle::{IdleMonitorConfig, connect_session_monitor};
//!
//! let mut monitor = connect_session_monitor(IdleMonitorConfig::default(), move || {
//!     activity.notify();
//! })?;
//!
//! if !monitor.init() {
//!     // Mutter is not available, use another monitor
//! }
//!
//! // on shutdown
//! monitor.terminate();
//! ```
//!
//! ### Status icon on Windows
//!
//! ```rust,ignore
//! use restwatch_platform::menu::MenuNode;
//! use restwatch_platform::tray::{StatusIcon, TrayConfig, TrayEvent, Win32Shell};
//! use restwatch_platform::OperationMode;
//! use std::rc::Rc;
//!
//! let menu = Rc::new(MenuNode::submenu(
//!     "root",
//!     "",
//!     vec![
//!         MenuNode::action("open", "_Open", open_main_window),
//!         MenuNode::separator("sep"),
//!         MenuNode::action("quit", "_Quit", quit),
//!     ],
//! ));
//!
//! let mut icon = StatusIcon::new(Win32Shell::new(), menu, OperationMode::Normal, TrayConfig::default());
//! let events = icon.events();
//! icon.set_visible(true);
//!
//! // after each pass of the message loop
//! icon.process_messages();
//! while let Ok(event) = events.try_recv() {
//!     if let TrayEvent::BalloonActivate(id) = event {
//!         core.balloon_clicked(&id);
//!     }
//! }
//! ```

// Module declarations
pub mod error;
pub mod idle;
pub mod menu;
pub mod mode;
pub mod tray;

// Public re-exports
pub use error::{Error, Result};
pub use idle::{IdleMonitor, IdleMonitorConfig, MonitorHandle};
pub use menu::{MenuModel, MenuNode};
pub use mode::OperationMode;
pub use tray::{StatusIcon, TrayConfig, TrayEvent};
