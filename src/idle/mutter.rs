//! GNOME Mutter bridge for the idle monitor.
//!
//! Talks to `org.gnome.Mutter.IdleMonitor` for watches and idle time, and to
//! `org.gnome.SessionManager` for the inhibitor flags. Signals are received on
//! dedicated listener threads and forwarded to the monitor through its
//! [`MonitorHandle`](crate::idle::MonitorHandle). Dropping the monitor closes
//! its bus connection, which ends the listeners, and joins them.

use crate::error::Result;
use crate::idle::monitor::{IdleMonitor, IdleMonitorConfig};
use crate::idle::service::{IdleService, SessionManager, WatchId};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use zbus::blocking::Connection;
use zbus::blocking::fdo::PropertiesProxy;
use zbus::proxy;
use zbus::zvariant::Value;

const SESSION_MANAGER_SERVICE: &str = "org.gnome.SessionManager";
const SESSION_MANAGER_PATH: &str = "/org/gnome/SessionManager";
const INHIBITED_ACTIONS: &str = "InhibitedActions";

#[proxy(
    interface = "org.gnome.Mutter.IdleMonitor",
    default_service = "org.gnome.Mutter.IdleMonitor",
    default_path = "/org/gnome/Mutter/IdleMonitor/Core",
    gen_async = false,
    blocking_name = "MutterIdleMonitorProxy"
)]
trait MutterIdleMonitor {
    /// Milliseconds since the last user input.
    fn get_idletime(&self) -> zbus::Result<u64>;

    fn add_idle_watch(&self, interval: u64) -> zbus::Result<u32>;

    fn add_user_active_watch(&self) -> zbus::Result<u32>;

    fn remove_watch(&self, id: u32) -> zbus::Result<()>;

    #[zbus(signal)]
    fn watch_fired(&self, id: u32) -> zbus::Result<()>;
}

#[proxy(
    interface = "org.gnome.SessionManager",
    default_service = "org.gnome.SessionManager",
    default_path = "/org/gnome/SessionManager",
    gen_async = false,
    blocking_name = "GnomeSessionManagerProxy"
)]
trait GnomeSessionManager {
    #[zbus(property)]
    fn inhibited_actions(&self) -> zbus::Result<u32>;
}

/// Signal listener threads, joined when their owner goes away.
#[derive(Default)]
struct ListenerSet {
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl ListenerSet {
    fn push(&self, listener: JoinHandle<()>) {
        self.threads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Joins every listener except the calling thread, which may be a
    /// listener releasing the last reference to the monitor.
    fn join_all(&self) {
        let threads = std::mem::take(
            &mut *self.threads.lock().unwrap_or_else(PoisonError::into_inner),
        );
        let current = thread::current().id();
        for listener in threads {
            if listener.thread().id() == current {
                continue;
            }
            let name = listener.thread().name().unwrap_or_default().to_string();
            if listener.join().is_err() {
                tracing::error!(listener = %name, "signal listener panicked");
            }
        }
    }
}

/// [`IdleService`] backed by Mutter's idle monitor on the session bus.
///
/// Owns the signal listeners started by [`connect_session_monitor`]; dropping
/// it closes the connection and joins them.
pub struct MutterIdleService {
    proxy: MutterIdleMonitorProxy<'static>,
    conn: Connection,
    listeners: ListenerSet,
}

impl MutterIdleService {
    /// Creates the proxy on an existing connection.
    pub fn new(conn: &Connection) -> Result<Self> {
        Ok(Self {
            proxy: MutterIdleMonitorProxy::new(conn)?,
            conn: conn.clone(),
            listeners: ListenerSet::default(),
        })
    }
}

impl Drop for MutterIdleService {
    fn drop(&mut self) {
        // ends the signal iterators the listeners block on
        if let Err(e) = self.conn.clone().close() {
            tracing::debug!(error = %e, "failed to close session bus connection");
        }
        self.listeners.join_all();
    }
}

impl IdleService for MutterIdleService {
    fn add_user_active_watch(&self) -> Result<WatchId> {
        Ok(WatchId(self.proxy.add_user_active_watch()?))
    }

    fn add_idle_watch(&self, interval: Duration) -> Result<WatchId> {
        let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        Ok(WatchId(self.proxy.add_idle_watch(interval_ms)?))
    }

    fn remove_watch(&self, id: WatchId) -> Result<()> {
        Ok(self.proxy.remove_watch(id.get())?)
    }

    fn idle_time(&self) -> Result<Duration> {
        Ok(Duration::from_millis(self.proxy.get_idletime()?))
    }
}

/// [`SessionManager`] backed by `org.gnome.SessionManager`.
pub struct GnomeSession {
    proxy: GnomeSessionManagerProxy<'static>,
}

impl GnomeSession {
    /// Creates the proxy on an existing connection.
    pub fn new(conn: &Connection) -> Result<Self> {
        Ok(Self {
            proxy: GnomeSessionManagerProxy::new(conn)?,
        })
    }
}

impl SessionManager for GnomeSession {
    fn inhibited_actions(&self) -> Result<u32> {
        Ok(self.proxy.inhibited_actions()?)
    }
}

/// Idle monitor wired to Mutter.
pub type MutterInputMonitor = IdleMonitor<MutterIdleService>;

/// Connects to the session bus and builds a Mutter-backed idle monitor.
///
/// Signal subscriptions are in place before this returns, so no watch event
/// is lost between [`IdleMonitor::init`] and the first delivery. A missing
/// session manager is tolerated: inhibition is then never reported.
///
/// # Example
///
/// ```rust,ignore
/// let mut monitor = connect_session_monitor(IdleMonitorConfig::default(), move || {
///     activity.notify();
/// })?;
/// if !monitor.init() {
///     tracing::warn!("Mutter idle monitor unavailable");
/// }
/// ```
pub fn connect_session_monitor(
    config: IdleMonitorConfig,
    on_activity: impl Fn() + Send + Sync + 'static,
) -> Result<MutterInputMonitor> {
    let conn = zbus::blocking::connection::Builder::session()?
        .method_timeout(config.call_timeout)
        .build()?;

    let service = MutterIdleService::new(&conn)?;
    let watch_fired = service
        .proxy
        .receive_watch_fired()?
        .filter_map(|signal| match signal.args() {
            Ok(args) => Some(WatchId(*args.id())),
            Err(e) => {
                tracing::warn!(error = %e, "malformed WatchFired signal");
                None
            }
        });

    let (session, inhibitor_changes) = match session_manager(&conn) {
        Ok((session, changes)) => (
            Some(Box::new(session) as Box<dyn SessionManager>),
            Some(changes),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "session manager unavailable, ignoring inhibitors");
            (None, None)
        }
    };

    let monitor = IdleMonitor::new(service, session, config, on_activity);

    let listeners = &monitor.service().listeners;
    let handle = monitor.handle();
    if let Some(listener) =
        spawn_listener("mutter-watch", watch_fired, move |id| handle.watch_fired(id))
    {
        listeners.push(listener);
    }
    if let Some(changes) = inhibitor_changes {
        let handle = monitor.handle();
        if let Some(listener) = spawn_listener("session-inhibitors", changes, move |flags| {
            handle.inhibited_actions_changed(flags)
        }) {
            listeners.push(listener);
        }
    }

    Ok(monitor)
}

/// Reads the session manager and subscribes to its `InhibitedActions` changes.
fn session_manager(
    conn: &Connection,
) -> Result<(GnomeSession, impl Iterator<Item = u32> + Send + 'static)> {
    let session = GnomeSession::new(conn)?;
    let properties = PropertiesProxy::builder(conn)
        .destination(SESSION_MANAGER_SERVICE)?
        .path(SESSION_MANAGER_PATH)?
        .build()?;

    let changes = properties
        .receive_properties_changed()?
        .filter_map(|signal| {
            let args = match signal.args() {
                Ok(args) => args,
                Err(e) => {
                    tracing::warn!(error = %e, "malformed PropertiesChanged signal");
                    return None;
                }
            };
            inhibited_actions_from(args.interface_name().as_str(), args.changed_properties())
        });

    Ok((session, changes))
}

/// Extracts `InhibitedActions` from a `PropertiesChanged` payload.
fn inhibited_actions_from(interface: &str, changed: &HashMap<&str, Value<'_>>) -> Option<u32> {
    if interface != SESSION_MANAGER_SERVICE {
        return None;
    }
    let value = changed.get(INHIBITED_ACTIONS)?;
    match u32::try_from(value) {
        Ok(flags) => Some(flags),
        Err(e) => {
            tracing::warn!(error = %e, "unexpected InhibitedActions type");
            None
        }
    }
}

/// Forwards every item of `events` until the stream ends or `forward`
/// reports that the monitor is gone.
fn spawn_listener<T>(
    name: &str,
    events: impl Iterator<Item = T> + Send + 'static,
    mut forward: impl FnMut(T) -> bool + Send + 'static,
) -> Option<JoinHandle<()>> {
    let thread_name = name.to_string();
    let spawned = thread::Builder::new().name(thread_name.clone()).spawn(move || {
        for event in events {
            if !forward(event) {
                break;
            }
        }
        tracing::debug!(listener = %thread_name, "signal listener stopped");
    });

    match spawned {
        Ok(listener) => Some(listener),
        Err(e) => {
            tracing::error!(error = %e, listener = name, "failed to start signal listener");
            None
        }
    }
}
