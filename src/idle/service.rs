//! Seams between the idle monitor and the session services it polls.
//!
//! The monitor only needs a handful of calls from the desktop. Keeping them
//! behind traits lets the D-Bus bridge live in its own cfg-gated module and
//! lets the polling logic run against in-memory fakes.

use crate::error::Result;
use std::fmt;
use std::time::Duration;

/// Opaque identifier of a watch registered with the idle service.
///
/// The service never hands out `0`; the monitor uses it to mean "no watch".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatchId(pub u32);

impl WatchId {
    /// Returns the raw identifier.
    pub fn get(self) -> u32 {
        self.0
    }

    pub(crate) fn from_raw(raw: u32) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bits of the session manager's `InhibitedActions` property.
pub mod inhibit {
    /// Logging out is inhibited.
    pub const LOGOUT: u32 = 1 << 0;
    /// Switching users is inhibited.
    pub const SWITCH_USER: u32 = 1 << 1;
    /// Suspending is inhibited.
    pub const SUSPEND: u32 = 1 << 2;
    /// The session must not be marked idle, e.g. during video playback.
    pub const IDLE: u32 = 1 << 3;
    /// Automounting is inhibited.
    pub const AUTOMOUNT: u32 = 1 << 4;

    /// Returns `true` when `flags` inhibit idleness.
    pub fn is_idle_inhibited(flags: u32) -> bool {
        flags & IDLE != 0
    }
}

/// The desktop's idle-time service.
///
/// User-active watches are one-shot and must be re-registered after they
/// fire; idle watches fire every time the idle threshold is crossed. Firing is
/// delivered out of band through [`MonitorHandle::watch_fired`].
///
/// [`MonitorHandle::watch_fired`]: crate::idle::MonitorHandle::watch_fired
pub trait IdleService: Send + Sync + 'static {
    /// Registers a watch that fires as soon as the user becomes active.
    fn add_user_active_watch(&self) -> Result<WatchId>;

    /// Registers a watch that fires once the user has been idle for `interval`.
    fn add_idle_watch(&self, interval: Duration) -> Result<WatchId>;

    /// Removes a previously registered watch.
    fn remove_watch(&self, id: WatchId) -> Result<()>;

    /// Time elapsed since the last user input.
    fn idle_time(&self) -> Result<Duration>;
}

/// The session manager, read once during initialisation.
pub trait SessionManager: Send {
    /// Current value of the `InhibitedActions` bitmask, see [`inhibit`].
    fn inhibited_actions(&self) -> Result<u32>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_watch() {
        assert_eq!(WatchId::from_raw(0), None);
        assert_eq!(WatchId::from_raw(7), Some(WatchId(7)));
    }

    #[test]
    fn only_the_idle_bit_inhibits() {
        assert!(inhibit::is_idle_inhibited(inhibit::IDLE));
        assert!(inhibit::is_idle_inhibited(inhibit::IDLE | inhibit::LOGOUT));
        assert!(!inhibit::is_idle_inhibited(
            inhibit::LOGOUT | inhibit::SWITCH_USER | inhibit::SUSPEND | inhibit::AUTOMOUNT
        ));
    }
}
