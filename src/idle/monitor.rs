//! Idle monitor core.
//!
//! Tracks whether the user is active from the idle service's watch events and
//! reports activity to the application once per poll interval. While the
//! session inhibits idleness (video playback, presentations) the watches stop
//! being reliable, so the loop falls back to sampling the idle time directly.

use crate::idle::service::{IdleService, SessionManager, WatchId, inhibit};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Callback invoked from the polling thread whenever the user is considered active.
pub type ActivityCallback = Arc<dyn Fn() + Send + Sync>;

/// Timing parameters of the idle monitor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdleMonitorConfig {
    /// Idle time after which the idle watch fires.
    pub idle_watch: Duration,
    /// While inhibited, idle times below this count as activity.
    pub active_threshold: Duration,
    /// Upper bound on the time between two loop iterations.
    pub poll_interval: Duration,
    /// Timeout applied to every synchronous service call.
    pub call_timeout: Duration,
}

impl Default for IdleMonitorConfig {
    fn default() -> Self {
        Self {
            idle_watch: Duration::from_millis(500),
            active_threshold: Duration::from_secs(1),
            poll_interval: Duration::from_secs(1),
            call_timeout: Duration::from_secs(10),
        }
    }
}

/// Watch events that could not be matched while a user-active watch was
/// being registered.
#[derive(Default)]
struct EarlyFires {
    registering: bool,
    ids: Vec<u32>,
}

/// State shared between the owner, the polling thread and event deliverers.
struct Core<S> {
    service: S,
    config: IdleMonitorConfig,
    on_activity: ActivityCallback,
    active: AtomicBool,
    inhibited: AtomicBool,
    /// Raw watch ids, `0` when not registered.
    watch_active: AtomicU32,
    watch_idle: AtomicU32,
    early: Mutex<EarlyFires>,
    abort: Mutex<bool>,
    wake: Condvar,
}

impl<S: IdleService> Core<S> {
    fn lock_abort(&self) -> MutexGuard<'_, bool> {
        self.abort.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_early(&self) -> MutexGuard<'_, EarlyFires> {
        self.early.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a user-active watch. The watch may fire before its id is
    /// known here; such events are held in `early` and replayed once stored.
    fn register_active_watch(self: &Arc<Self>) -> bool {
        {
            let mut early = self.lock_early();
            early.registering = true;
            early.ids.clear();
        }

        let registered = match self.service.add_user_active_watch() {
            Ok(id) => {
                tracing::debug!(watch = %id, "registered user-active watch");
                self.watch_active.store(id.get(), Ordering::SeqCst);
                Some(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to register user-active watch");
                None
            }
        };

        let fired = {
            let mut early = self.lock_early();
            early.registering = false;
            std::mem::take(&mut early.ids)
        };

        match registered {
            Some(id) => {
                if fired.contains(&id.get()) {
                    tracing::debug!(watch = %id, "user-active watch fired during registration");
                    self.user_active();
                }
                true
            }
            None => false,
        }
    }

    fn register_idle_watch(&self) -> bool {
        match self.service.add_idle_watch(self.config.idle_watch) {
            Ok(id) => {
                tracing::debug!(watch = %id, "registered idle watch");
                self.watch_idle.store(id.get(), Ordering::SeqCst);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to register idle watch");
                false
            }
        }
    }

    /// Removes the watch held in `slot`, if any. The slot is cleared only if
    /// it still refers to the removed watch.
    fn unregister_watch(&self, slot: &AtomicU32, kind: &'static str) -> bool {
        let Some(id) = WatchId::from_raw(slot.load(Ordering::SeqCst)) else {
            return true;
        };

        match self.service.remove_watch(id) {
            Ok(()) => {
                tracing::debug!(watch = %id, kind, "removed watch");
                let _ = slot.compare_exchange(id.get(), 0, Ordering::SeqCst, Ordering::SeqCst);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, watch = %id, kind, "failed to remove watch");
                false
            }
        }
    }

    fn is_aborted(&self) -> bool {
        *self.lock_abort()
    }

    fn set_inhibited_actions(&self, flags: u32) {
        let inhibited = inhibit::is_idle_inhibited(flags);
        tracing::debug!(flags, inhibited, "session inhibitors changed");
        self.inhibited.store(inhibited, Ordering::SeqCst);
    }

    fn watch_fired(self: &Arc<Self>, id: WatchId) {
        let raw = id.get();
        if raw == 0 {
            return;
        }

        // held while matching so a registration cannot store its id unseen
        let mut early = self.lock_early();
        if raw == self.watch_active.load(Ordering::SeqCst) {
            self.user_active();
        } else if raw == self.watch_idle.load(Ordering::SeqCst) {
            self.user_idle();
        } else if early.registering {
            tracing::trace!(watch = %id, "holding watch event until registration completes");
            early.ids.push(raw);
        } else {
            tracing::trace!(watch = %id, "ignoring unknown watch");
        }
    }

    fn user_active(self: &Arc<Self>) {
        self.active.store(true, Ordering::SeqCst);
        self.spawn_call("idle-unwatch", |core| {
            core.unregister_watch(&core.watch_active, "active");
        });
    }

    /// The flag is cleared before the re-arm starts, so activity replayed by
    /// the registration is not overwritten.
    fn user_idle(self: &Arc<Self>) {
        self.active.store(false, Ordering::SeqCst);
        self.spawn_call("idle-rewatch", |core| {
            core.register_active_watch();
            // terminate() may have run while the call was in flight
            if core.is_aborted() {
                core.unregister_watch(&core.watch_active, "active");
            }
        });
    }

    /// Runs a service call on a helper thread so the event deliverer never
    /// waits on the bus.
    fn spawn_call(
        self: &Arc<Self>,
        name: &str,
        call: impl FnOnce(&Arc<Self>) + Send + 'static,
    ) {
        let core = Arc::clone(self);
        if let Err(e) = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || call(&core))
        {
            tracing::warn!(error = %e, "failed to start {name} thread");
        }
    }

    fn poll_once(&self) {
        let mut active = self.active.load(Ordering::SeqCst);

        if self.inhibited.load(Ordering::SeqCst) {
            match self.service.idle_time() {
                Ok(idle) => active = idle < self.config.active_threshold,
                Err(e) => tracing::warn!(error = %e, "failed to query idle time"),
            }
        }

        if active {
            (self.on_activity)();
        }
    }

    fn run(&self) {
        tracing::debug!("idle monitor loop started");
        loop {
            if self.is_aborted() {
                break;
            }

            self.poll_once();

            let abort = self.lock_abort();
            if *abort {
                break;
            }
            let _ = self
                .wake
                .wait_timeout(abort, self.config.poll_interval)
                .unwrap_or_else(PoisonError::into_inner);
        }
        tracing::debug!("idle monitor loop stopped");
    }
}

/// Activity monitor backed by a desktop idle service.
///
/// # Example
///
/// ```rust,ignore
/// let mut monitor = IdleMonitor::new(service, Some(session), IdleMonitorConfig::default(), || {
///     core.notify_activity();
/// });
/// if !monitor.init() {
///     // fall back to another input monitor
/// }
/// // ...
/// monitor.terminate();
/// ```
pub struct IdleMonitor<S: IdleService> {
    core: Arc<Core<S>>,
    session: Option<Box<dyn SessionManager>>,
    worker: Option<JoinHandle<()>>,
}

impl<S: IdleService> IdleMonitor<S> {
    /// Creates a monitor that is not yet watching anything.
    ///
    /// Without a `session` manager the monitor never considers idleness
    /// inhibited unless told so through [`MonitorHandle::inhibited_actions_changed`].
    pub fn new(
        service: S,
        session: Option<Box<dyn SessionManager>>,
        config: IdleMonitorConfig,
        on_activity: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            core: Arc::new(Core {
                service,
                config,
                on_activity: Arc::new(on_activity),
                active: AtomicBool::new(false),
                inhibited: AtomicBool::new(false),
                watch_active: AtomicU32::new(0),
                watch_idle: AtomicU32::new(0),
                early: Mutex::new(EarlyFires::default()),
                abort: Mutex::new(false),
                wake: Condvar::new(),
            }),
            session,
            worker: None,
        }
    }

    /// Registers the active and idle watches and starts the polling thread.
    ///
    /// Returns `false`, without starting the thread, when either watch cannot
    /// be registered. Inhibitor state is read afterwards on a best-effort basis.
    pub fn init(&mut self) -> bool {
        if self.worker.is_some() {
            tracing::warn!("idle monitor already running");
            return false;
        }

        *self.core.lock_abort() = false;

        let registered = self.core.register_active_watch() && self.core.register_idle_watch();
        if !registered {
            self.core.unregister_watch(&self.core.watch_active, "active");
            return false;
        }

        let core = Arc::clone(&self.core);
        match thread::Builder::new()
            .name("idle-monitor".to_string())
            .spawn(move || core.run())
        {
            Ok(worker) => self.worker = Some(worker),
            Err(e) => {
                tracing::error!(error = %e, "failed to start idle monitor thread");
                self.core.unregister_watch(&self.core.watch_idle, "idle");
                self.core.unregister_watch(&self.core.watch_active, "active");
                return false;
            }
        }

        self.init_inhibitors();
        true
    }

    fn init_inhibitors(&self) {
        let Some(session) = &self.session else {
            tracing::debug!("no session manager, idle inhibition is not tracked");
            return;
        };

        match session.inhibited_actions() {
            Ok(flags) => self.core.set_inhibited_actions(flags),
            Err(e) => tracing::warn!(error = %e, "failed to read session inhibitors"),
        }
    }

    /// Removes both watches, stops the polling thread and waits for it.
    ///
    /// A user-active watch re-registered concurrently is removed by the
    /// registering thread once it sees the abort flag.
    pub fn terminate(&mut self) {
        *self.core.lock_abort() = true;

        self.core.unregister_watch(&self.core.watch_idle, "idle");
        self.core.unregister_watch(&self.core.watch_active, "active");
        self.core.wake.notify_all();

        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::error!("idle monitor thread panicked");
        }
    }

    /// Returns a handle for delivering service events to this monitor.
    pub fn handle(&self) -> MonitorHandle<S> {
        MonitorHandle {
            core: Arc::downgrade(&self.core),
        }
    }

    /// Whether the polling thread is running.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Whether the last watch event reported the user as active.
    pub fn is_active(&self) -> bool {
        self.core.active.load(Ordering::SeqCst)
    }

    /// Whether the session currently inhibits idleness.
    pub fn is_inhibited(&self) -> bool {
        self.core.inhibited.load(Ordering::SeqCst)
    }

    /// The registered user-active watch, if any.
    pub fn active_watch(&self) -> Option<WatchId> {
        WatchId::from_raw(self.core.watch_active.load(Ordering::SeqCst))
    }

    /// The registered idle watch, if any.
    pub fn idle_watch(&self) -> Option<WatchId> {
        WatchId::from_raw(self.core.watch_idle.load(Ordering::SeqCst))
    }

    /// The idle service the monitor talks to.
    pub fn service(&self) -> &S {
        &self.core.service
    }

    /// The configuration the monitor was built with.
    pub fn config(&self) -> &IdleMonitorConfig {
        &self.core.config
    }
}

impl<S: IdleService> Drop for IdleMonitor<S> {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.terminate();
        }
    }
}

/// Weak reference used by platform bridges to feed events into a monitor.
pub struct MonitorHandle<S: IdleService> {
    core: Weak<Core<S>>,
}

impl<S: IdleService> Clone for MonitorHandle<S> {
    fn clone(&self) -> Self {
        Self {
            core: Weak::clone(&self.core),
        }
    }
}

impl<S: IdleService> MonitorHandle<S> {
    /// Delivers a `WatchFired` event.
    ///
    /// Returns `false` once the monitor is gone.
    pub fn watch_fired(&self, id: WatchId) -> bool {
        match self.core.upgrade() {
            Some(core) => {
                core.watch_fired(id);
                true
            }
            None => false,
        }
    }

    /// Delivers a new value of the session's `InhibitedActions` bitmask.
    ///
    /// Returns `false` once the monitor is gone.
    pub fn inhibited_actions_changed(&self, flags: u32) -> bool {
        match self.core.upgrade() {
            Some(core) => {
                core.set_inhibited_actions(flags);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Instant;

    type ReplyHook = Arc<dyn Fn(WatchId) + Send + Sync>;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Kind {
        Active,
        Idle,
    }

    #[derive(Default)]
    struct FakeState {
        next_id: u32,
        watches: Vec<(WatchId, Kind)>,
        idle_intervals: Vec<Duration>,
        idle_time: Duration,
        idle_queries: usize,
        fail_active: bool,
        fail_idle: bool,
        fail_idle_time: bool,
        /// Runs after a user-active watch exists but before its id is returned.
        before_active_reply: Option<ReplyHook>,
    }

    #[derive(Clone, Default)]
    struct FakeService(Arc<Mutex<FakeState>>);

    impl FakeService {
        fn state(&self) -> MutexGuard<'_, FakeState> {
            self.0.lock().unwrap()
        }

        fn watches(&self, kind: Kind) -> Vec<WatchId> {
            self.state()
                .watches
                .iter()
                .filter(|(_, k)| *k == kind)
                .map(|(id, _)| *id)
                .collect()
        }

        fn add(&self, kind: Kind) -> WatchId {
            let mut state = self.state();
            state.next_id += 1;
            let id = WatchId(state.next_id);
            state.watches.push((id, kind));
            id
        }
    }

    impl IdleService for FakeService {
        fn add_user_active_watch(&self) -> Result<WatchId> {
            if self.state().fail_active {
                return Err(Error::service("AddUserActiveWatch", "refused"));
            }
            let id = self.add(Kind::Active);
            let hook = self.state().before_active_reply.clone();
            if let Some(hook) = hook {
                hook(id);
            }
            Ok(id)
        }

        fn add_idle_watch(&self, interval: Duration) -> Result<WatchId> {
            if self.state().fail_idle {
                return Err(Error::service("AddIdleWatch", "refused"));
            }
            self.state().idle_intervals.push(interval);
            Ok(self.add(Kind::Idle))
        }

        fn remove_watch(&self, id: WatchId) -> Result<()> {
            let mut state = self.state();
            let before = state.watches.len();
            state.watches.retain(|(w, _)| *w != id);
            if state.watches.len() == before {
                return Err(Error::service("RemoveWatch", "unknown watch"));
            }
            Ok(())
        }

        fn idle_time(&self) -> Result<Duration> {
            let mut state = self.state();
            state.idle_queries += 1;
            if state.fail_idle_time {
                return Err(Error::service("GetIdletime", "unavailable"));
            }
            Ok(state.idle_time)
        }
    }

    struct FakeSession(Result<u32>);

    impl SessionManager for FakeSession {
        fn inhibited_actions(&self) -> Result<u32> {
            match &self.0 {
                Ok(flags) => Ok(*flags),
                Err(_) => Err(Error::service("InhibitedActions", "no session manager")),
            }
        }
    }

    fn fast_config() -> IdleMonitorConfig {
        IdleMonitorConfig {
            poll_interval: Duration::from_millis(5),
            ..IdleMonitorConfig::default()
        }
    }

    fn monitor_with(
        service: &FakeService,
        session: Option<Box<dyn SessionManager>>,
    ) -> (IdleMonitor<FakeService>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let monitor = IdleMonitor::new(service.clone(), session, fast_config(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (monitor, count)
    }

    fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn active_watch_failure_fails_init_without_thread() {
        let service = FakeService::default();
        service.state().fail_active = true;
        let (mut monitor, count) = monitor_with(&service, None);

        assert!(!monitor.init());
        assert!(!monitor.is_running());
        assert!(service.state().watches.is_empty());

        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn idle_watch_failure_fails_init_and_drops_active_watch() {
        let service = FakeService::default();
        service.state().fail_idle = true;
        let (mut monitor, _count) = monitor_with(&service, None);

        assert!(!monitor.init());
        assert!(!monitor.is_running());
        assert!(service.state().watches.is_empty());
        assert_eq!(monitor.active_watch(), None);
    }

    #[test]
    fn init_registers_watches_and_terminate_removes_them() {
        let service = FakeService::default();
        let count = Arc::new(AtomicUsize::new(0));
        let mut monitor = IdleMonitor::new(service.clone(), None, IdleMonitorConfig::default(), {
            let count = Arc::clone(&count);
            move || {
                count.fetch_add(1, Ordering::SeqCst);
            }
        });

        assert!(monitor.init());
        assert!(monitor.is_running());
        assert_eq!(service.watches(Kind::Active).len(), 1);
        assert_eq!(service.watches(Kind::Idle).len(), 1);
        assert_eq!(
            service.state().idle_intervals,
            vec![Duration::from_millis(500)]
        );
        assert_eq!(monitor.active_watch(), service.watches(Kind::Active).first().copied());

        // the loop waits a full second between iterations; terminate must wake it
        let started = Instant::now();
        monitor.terminate();
        assert!(started.elapsed() < Duration::from_millis(900));

        assert!(!monitor.is_running());
        assert!(service.state().watches.is_empty());
        assert_eq!(monitor.active_watch(), None);
        assert_eq!(monitor.idle_watch(), None);

        // second terminate is harmless
        monitor.terminate();
    }

    #[test]
    fn init_twice_is_refused() {
        let service = FakeService::default();
        let (mut monitor, _count) = monitor_with(&service, None);

        assert!(monitor.init());
        assert!(!monitor.init());
        assert_eq!(service.watches(Kind::Active).len(), 1);
    }

    #[test]
    fn watch_events_flip_activity_and_rearm_active_watch() {
        let service = FakeService::default();
        let (mut monitor, count) = monitor_with(&service, None);
        let handle = monitor.handle();

        assert!(monitor.init());
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), 0, "inactive until a watch fires");

        let active = monitor.active_watch().unwrap();
        assert!(handle.watch_fired(active));
        assert!(monitor.is_active());
        wait_until("activity callbacks", || count.load(Ordering::SeqCst) >= 2);
        wait_until("active watch removal", || {
            service.watches(Kind::Active).is_empty()
        });
        assert_eq!(monitor.active_watch(), None);

        let idle = monitor.idle_watch().unwrap();
        assert!(handle.watch_fired(idle));
        assert!(!monitor.is_active());
        wait_until("active watch re-registration", || {
            service.watches(Kind::Active).len() == 1
        });
        assert_eq!(monitor.active_watch(), service.watches(Kind::Active).first().copied());

        // an iteration already in flight may still report activity once
        let before = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(40));
        assert!(count.load(Ordering::SeqCst) - before <= 1);
    }

    /// Delivers the new watch's `WatchFired` from another thread before the
    /// registration call returns, as a bus listener may.
    fn fire_before_reply(handle: &MonitorHandle<FakeService>) -> ReplyHook {
        let handle = handle.clone();
        Arc::new(move |id| {
            let handle = handle.clone();
            let delivered = thread::spawn(move || handle.watch_fired(id))
                .join()
                .unwrap();
            assert!(delivered);
        })
    }

    #[test]
    fn rearmed_watch_firing_before_its_reply_marks_user_active() {
        let service = FakeService::default();
        let (mut monitor, count) = monitor_with(&service, None);
        let handle = monitor.handle();

        assert!(monitor.init());
        service.state().before_active_reply = Some(fire_before_reply(&handle));

        let idle = monitor.idle_watch().unwrap();
        assert!(handle.watch_fired(idle));

        wait_until("activity from the re-armed watch", || monitor.is_active());
        wait_until("activity callbacks", || count.load(Ordering::SeqCst) >= 1);
        wait_until("re-armed watch removal", || {
            service.watches(Kind::Active).is_empty()
        });
        assert_eq!(monitor.active_watch(), None);
    }

    #[test]
    fn initial_watch_firing_before_its_reply_marks_user_active() {
        let service = FakeService::default();
        let (mut monitor, _count) = monitor_with(&service, None);
        service.state().before_active_reply = Some(fire_before_reply(&monitor.handle()));

        assert!(monitor.init());
        assert!(monitor.is_active());
        wait_until("active watch removal", || {
            service.watches(Kind::Active).is_empty()
        });
        assert_eq!(service.watches(Kind::Idle).len(), 1);
    }

    #[test]
    fn rearm_completing_after_terminate_is_removed() {
        let service = FakeService::default();
        let (mut monitor, _count) = monitor_with(&service, None);
        let handle = monitor.handle();

        assert!(monitor.init());
        assert!(handle.watch_fired(monitor.active_watch().unwrap()));
        wait_until("active watch removal", || {
            service.watches(Kind::Active).is_empty()
        });

        let (release, gate) = mpsc::channel::<()>();
        let gate = Mutex::new(gate);
        service.state().before_active_reply = Some(Arc::new(move |_| {
            let _ = gate.lock().unwrap().recv();
        }));

        assert!(handle.watch_fired(monitor.idle_watch().unwrap()));
        wait_until("re-registration in flight", || {
            service.watches(Kind::Active).len() == 1
        });

        monitor.terminate();
        release.send(()).unwrap();

        wait_until("late active watch removal", || {
            service.state().watches.is_empty()
        });
        assert_eq!(monitor.active_watch(), None);
    }

    #[test]
    fn unknown_watches_are_ignored() {
        let service = FakeService::default();
        let (mut monitor, _count) = monitor_with(&service, None);
        let handle = monitor.handle();

        assert!(monitor.init());
        assert!(handle.watch_fired(WatchId(0)));
        assert!(handle.watch_fired(WatchId(4242)));
        assert!(!monitor.is_active());
        assert_eq!(service.state().watches.len(), 2);
    }

    #[test]
    fn inhibition_toggles_idle_time_polling() {
        let service = FakeService::default();
        let (mut monitor, count) = monitor_with(&service, None);
        let handle = monitor.handle();

        assert!(monitor.init());
        thread::sleep(Duration::from_millis(30));
        assert_eq!(service.state().idle_queries, 0);

        assert!(handle.inhibited_actions_changed(inhibit::IDLE | inhibit::SUSPEND));
        assert!(monitor.is_inhibited());
        wait_until("idle time queries", || service.state().idle_queries >= 2);
        // idle time is zero, so the user counts as active
        wait_until("activity callbacks", || count.load(Ordering::SeqCst) >= 1);

        assert!(handle.inhibited_actions_changed(inhibit::SUSPEND));
        assert!(!monitor.is_inhibited());
        thread::sleep(Duration::from_millis(20));
        let queries = service.state().idle_queries;
        thread::sleep(Duration::from_millis(40));
        assert_eq!(service.state().idle_queries, queries);
    }

    #[test]
    fn inhibited_user_idle_beyond_threshold_is_not_active() {
        let service = FakeService::default();
        service.state().idle_time = Duration::from_secs(5);
        let (mut monitor, count) =
            monitor_with(&service, Some(Box::new(FakeSession(Ok(inhibit::IDLE)))));

        assert!(monitor.init());
        assert!(monitor.is_inhibited());
        wait_until("idle time queries", || service.state().idle_queries >= 3);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        service.state().idle_time = Duration::from_millis(200);
        wait_until("activity callbacks", || count.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn failed_idle_time_query_keeps_watch_state() {
        let service = FakeService::default();
        service.state().fail_idle_time = true;
        let (mut monitor, count) =
            monitor_with(&service, Some(Box::new(FakeSession(Ok(inhibit::IDLE)))));
        let handle = monitor.handle();

        assert!(monitor.init());
        wait_until("idle time queries", || service.state().idle_queries >= 3);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        assert!(handle.watch_fired(monitor.active_watch().unwrap()));
        wait_until("activity callbacks", || count.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn session_manager_failure_leaves_inhibition_unset() {
        let service = FakeService::default();
        let session = FakeSession(Err(Error::service("InhibitedActions", "gone")));
        let (mut monitor, _count) = monitor_with(&service, Some(Box::new(session)));

        assert!(monitor.init());
        assert!(!monitor.is_inhibited());
    }

    #[test]
    fn handle_outliving_monitor_reports_it_gone() {
        let service = FakeService::default();
        let (mut monitor, _count) = monitor_with(&service, None);
        let handle = monitor.handle();
        assert!(monitor.init());

        drop(monitor);

        assert!(service.state().watches.is_empty());
        assert!(!handle.watch_fired(WatchId(1)));
        assert!(!handle.inhibited_actions_changed(inhibit::IDLE));
    }
}
