//! Win32 bridge for the status icon.
//!
//! This module provides [`Win32Shell`], which owns the hidden message window
//! the notification icon reports to, and implements [`Shell`] on top of
//! `Shell_NotifyIconW` and the popup menu API.

use crate::error::{Error, Result};
use crate::menu::{NativeEntry, NativeMenu};
use crate::tray::event::TrayMessage;
use crate::tray::shell::{NotifyAction, Shell};
use crate::tray::state::{IconHandle, NotifyFlags, NotifyIconData};
use std::cell::RefCell;
use std::ffi::c_void;
use std::sync::atomic::{AtomicU32, Ordering};
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, POINT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Shell::{
    NIIF_INFO, NIM_ADD, NIM_DELETE, NIM_MODIFY, NOTIFY_ICON_DATA_FLAGS, NOTIFYICONDATAW,
    NOTIFYICONDATAW_0, Shell_NotifyIconW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreatePopupMenu, CreateWindowExW, DefWindowProcW, DestroyIcon, DestroyMenu, DestroyWindow,
    GetCursorPos, HICON, HMENU, InsertMenuW, LoadIconW, MF_BYPOSITION, MF_CHECKED, MF_POPUP,
    MF_SEPARATOR, MF_STRING, RegisterClassW, RegisterWindowMessageW, SetForegroundWindow,
    TPM_RETURNCMD, TPM_RIGHTBUTTON, TrackPopupMenu, UnregisterClassW, WINDOW_EX_STYLE, WNDCLASSW,
    WS_POPUP,
};
use windows::core::{HSTRING, PCWSTR, w};

const WINDOW_CLASS: PCWSTR = w!("RestwatchTrayObserver");

/// Registered `TaskbarCreated` message, 0 until the first shell is created.
static TASKBAR_CREATED: AtomicU32 = AtomicU32::new(0);

thread_local! {
    /// Callbacks decoded by the window procedure, drained by `pending_messages`.
    static PENDING: RefCell<Vec<TrayMessage>> = const { RefCell::new(Vec::new()) };
}

/// [`Shell`] backed by the Windows notification area.
pub struct Win32Shell {
    instance: HINSTANCE,
    hwnd: Option<HWND>,
}

impl Win32Shell {
    /// Registers the window class and creates the hidden message window.
    ///
    /// Failures are logged and leave the shell detached.
    pub fn new() -> Self {
        let instance: HINSTANCE = match unsafe { GetModuleHandleW(None) } {
            Ok(module) => module.into(),
            Err(e) => {
                tracing::error!(error = %e, "failed to get module handle");
                return Self {
                    instance: HINSTANCE::default(),
                    hwnd: None,
                };
            }
        };

        let class = WNDCLASSW {
            lpfnWndProc: Some(window_proc),
            hInstance: instance,
            lpszClassName: WINDOW_CLASS,
            ..Default::default()
        };
        if unsafe { RegisterClassW(&class) } == 0 {
            let e = windows::core::Error::from_win32();
            tracing::error!(error = %e, "failed to register tray window class");
            return Self { instance, hwnd: None };
        }

        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                WINDOW_CLASS,
                PCWSTR::null(),
                WS_POPUP,
                0,
                0,
                1,
                1,
                HWND::default(),
                HMENU::default(),
                instance,
                None,
            )
        };

        match hwnd {
            Ok(hwnd) => {
                let taskbar_created = unsafe { RegisterWindowMessageW(w!("TaskbarCreated")) };
                TASKBAR_CREATED.store(taskbar_created, Ordering::SeqCst);
                Self {
                    instance,
                    hwnd: Some(hwnd),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to create tray window");
                if let Err(e) = unsafe { UnregisterClassW(WINDOW_CLASS, instance) } {
                    tracing::debug!(error = %e, "failed to unregister tray window class");
                }
                Self { instance, hwnd: None }
            }
        }
    }
}

impl Default for Win32Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Win32Shell {
    fn drop(&mut self) {
        if let Some(hwnd) = self.hwnd.take() {
            unsafe {
                if let Err(e) = DestroyWindow(hwnd) {
                    tracing::debug!(error = %e, "failed to destroy tray window");
                }
                if let Err(e) = UnregisterClassW(WINDOW_CLASS, self.instance) {
                    tracing::debug!(error = %e, "failed to unregister tray window class");
                }
            }
        }
    }
}

impl Shell for Win32Shell {
    fn is_attached(&self) -> bool {
        self.hwnd.is_some()
    }

    fn notify_icon(&mut self, action: NotifyAction, data: &NotifyIconData) -> Result<()> {
        let Some(hwnd) = self.hwnd else {
            return Ok(());
        };

        let nid = native_icon_data(hwnd, data);
        let message = match action {
            NotifyAction::Add => NIM_ADD,
            NotifyAction::Modify => NIM_MODIFY,
            NotifyAction::Delete => NIM_DELETE,
        };

        if unsafe { Shell_NotifyIconW(message, &nid) }.as_bool() {
            Ok(())
        } else {
            Err(Error::service("Shell_NotifyIconW", format!("{action:?} rejected")))
        }
    }

    fn load_icon(&mut self, resource: &str) -> Result<IconHandle> {
        let name = HSTRING::from(resource);
        let icon = unsafe { LoadIconW(self.instance, &name) }?;
        Ok(IconHandle(icon.0 as isize))
    }

    fn destroy_icon(&mut self, icon: IconHandle) -> Result<()> {
        unsafe { DestroyIcon(HICON(icon.0 as *mut c_void)) }?;
        Ok(())
    }

    fn track_popup_menu(&mut self, menu: &NativeMenu) -> Result<u32> {
        let Some(hwnd) = self.hwnd else {
            return Ok(0);
        };

        let mut cursor = POINT::default();
        unsafe { GetCursorPos(&mut cursor) }?;

        let popup = unsafe { CreatePopupMenu() }?;
        if let Err(e) = populate(popup, menu) {
            // destroys nested popups already attached
            let _ = unsafe { DestroyMenu(popup) };
            return Err(e);
        }

        let command = unsafe {
            let _ = SetForegroundWindow(hwnd);
            TrackPopupMenu(
                popup,
                TPM_RETURNCMD | TPM_RIGHTBUTTON,
                cursor.x,
                cursor.y,
                0,
                hwnd,
                None,
            )
        };
        unsafe { DestroyMenu(popup) }?;

        Ok(u32::try_from(command.0).unwrap_or(0))
    }

    fn pending_messages(&mut self) -> Vec<TrayMessage> {
        PENDING.with(|pending| std::mem::take(&mut *pending.borrow_mut()))
    }
}

fn populate(hmenu: HMENU, menu: &NativeMenu) -> Result<()> {
    for entry in &menu.entries {
        match entry {
            NativeEntry::Popup { text, menu } => {
                let popup = unsafe { CreatePopupMenu() }?;
                let label = HSTRING::from(text.as_str());
                let inserted = unsafe {
                    InsertMenuW(
                        hmenu,
                        u32::MAX,
                        MF_POPUP | MF_STRING | MF_BYPOSITION,
                        popup.0 as usize,
                        &label,
                    )
                };
                if let Err(e) = inserted {
                    let _ = unsafe { DestroyMenu(popup) };
                    return Err(e.into());
                }
                populate(popup, menu)?;
            }
            NativeEntry::Item {
                command,
                text,
                checked,
            } => {
                let mut flags = MF_STRING | MF_BYPOSITION;
                if *checked {
                    flags = flags | MF_CHECKED;
                }
                let label = HSTRING::from(text.as_str());
                unsafe { InsertMenuW(hmenu, u32::MAX, flags, *command as usize, &label) }?;
            }
            NativeEntry::Separator { command } => {
                unsafe {
                    InsertMenuW(
                        hmenu,
                        u32::MAX,
                        MF_SEPARATOR | MF_BYPOSITION,
                        *command as usize,
                        PCWSTR::null(),
                    )
                }?;
            }
        }
    }
    Ok(())
}

fn native_icon_data(hwnd: HWND, data: &NotifyIconData) -> NOTIFYICONDATAW {
    let mut nid = NOTIFYICONDATAW {
        cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
        hWnd: hwnd,
        uID: data.id,
        uFlags: NOTIFY_ICON_DATA_FLAGS(data.flags.bits()),
        uCallbackMessage: data.callback_message,
        ..Default::default()
    };

    if let Some(icon) = data.icon {
        nid.hIcon = HICON(icon.0 as *mut c_void);
    }
    copy_wide(&mut nid.szTip, &data.tooltip);

    if data.flags.contains(NotifyFlags::INFO) {
        copy_wide(&mut nid.szInfo, &data.balloon.text);
        copy_wide(&mut nid.szInfoTitle, &data.balloon.title);
        nid.Anonymous = NOTIFYICONDATAW_0 {
            uTimeout: u32::try_from(data.balloon.timeout.as_millis()).unwrap_or(u32::MAX),
        };
        nid.dwInfoFlags = NIIF_INFO;
    }

    nid
}

/// Copies `text` into a fixed, NUL-terminated UTF-16 buffer.
fn copy_wide(buffer: &mut [u16], text: &str) {
    let Some(limit) = buffer.len().checked_sub(1) else {
        return;
    };
    let mut len = 0;
    for (slot, unit) in buffer.iter_mut().zip(text.encode_utf16().take(limit)) {
        *slot = unit;
        len += 1;
    }
    if let Some(terminator) = buffer.get_mut(len) {
        *terminator = 0;
    }
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let taskbar_created = TASKBAR_CREATED.load(Ordering::SeqCst);
    if let Some(decoded) = TrayMessage::decode(message, lparam.0, taskbar_created) {
        PENDING.with(|pending| pending.borrow_mut().push(decoded));
    }
    unsafe { DefWindowProcW(hwnd, message, wparam, lparam) }
}
