//! DriverSession: one client's registry wired to a driver channel.
//!
//! A session owns a [`MonitorRegistry`] (the local document the caller edits)
//! and a [`SyncChannel`] (the driver).  Nothing reaches the driver until the
//! caller says so:
//!
//! ```text
//!   with_registry(edit) ──► registry ──notify()──► driver (live state)
//!                               ▲                     │
//!        refresh_state()/reload │                     │ persist()
//!                               │                     ▼
//!            driver_state watch ◄── change events   durable state
//! ```
//!
//! # Single-writer guard (for beginners)
//!
//! Change events are delivered on a task owned by the transport, so they can
//! arrive while the caller is halfway through an edit.  Every access to the
//! registry therefore goes through one [`parking_lot::Mutex`]:
//!
//! - [`DriverSession::with_registry`] holds the lock for the whole closure,
//!   so a multi-step edit is never interleaved with an incoming replacement.
//! - The follow-driver callback takes the same lock before replacing the
//!   registry.
//! - The lock is never held across an `.await`.  `notify` copies the records
//!   out under the lock, releases it, and only then talks to the driver.
//!
//! # Staleness
//!
//! The registry is a snapshot.  Another process can change the driver at any
//! time and the session will not notice unless it follows the driver or the
//! caller calls [`DriverSession::refresh_state`] / [`DriverSession::reload`].
//! Pushing a stale registry is allowed; the driver resolves id conflicts by
//! dropping duplicates.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, trace};
use vdd_core::{Monitor, MonitorRecord, MonitorRegistry};

use crate::application::sync_channel::{StateHandler, SubscriptionHandle, SyncChannel, SyncError};

/// Session behaviour switches, usually read from the `[session]` table of the
/// client config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Replace the registry with every driver change event as it arrives.
    #[serde(default)]
    pub follow_driver: bool,
}

/// A client session against one driver.
pub struct DriverSession {
    channel: Arc<dyn SyncChannel>,
    registry: Arc<Mutex<MonitorRegistry>>,
    driver_state: watch::Receiver<Vec<MonitorRecord>>,
    /// Feeds `driver_state`; shared with duplicates and cancelled when the
    /// last of them is dropped.
    state_subscription: Arc<SubscriptionHandle>,
    follow_subscription: Option<SubscriptionHandle>,
}

impl DriverSession {
    /// Connects to the driver behind `channel`.
    ///
    /// Pulls the current driver state into a fresh registry and subscribes to
    /// change events so [`DriverSession::refresh_state`] can work without a
    /// round trip.
    ///
    /// # Errors
    ///
    /// Propagates the first [`SyncError`] from the initial pull or from
    /// subscribing.
    pub async fn connect(
        channel: Arc<dyn SyncChannel>,
        config: &SessionConfig,
    ) -> Result<Self, SyncError> {
        let initial = channel.pull().await?;
        info!(monitors = initial.len(), "connected to driver");

        let (state_tx, driver_state) = watch::channel(initial.clone());
        let state_subscription = channel.subscribe(Box::new(move |state| {
            trace!(monitors = state.len(), "driver state changed");
            state_tx.send_replace(state);
        }))?;

        let mut session = Self {
            channel,
            registry: Arc::new(Mutex::new(MonitorRegistry::from_records(initial))),
            driver_state,
            state_subscription: Arc::new(state_subscription),
            follow_subscription: None,
        };

        if config.follow_driver {
            session.follow_driver()?;
        }

        Ok(session)
    }

    // ── Driver primitives ─────────────────────────────────────────────────────

    /// Sends the whole registry to the driver as its new live state.
    ///
    /// No validation or deduplication happens here; check
    /// [`MonitorRegistry::valid`] first if that matters.
    pub async fn notify(&self) -> Result<(), SyncError> {
        let records = self.registry.lock().to_records();
        info!(monitors = records.len(), "pushing registry to driver");
        self.channel.push(records).await
    }

    /// Asks the driver to persist its last-pushed state.
    ///
    /// Local edits that were not pushed with [`DriverSession::notify`] are not
    /// included.
    pub async fn persist(&self) -> Result<(), SyncError> {
        info!("committing driver state");
        self.channel.commit().await
    }

    /// Fetches the driver's live state without touching the registry.
    pub async fn pull(&self) -> Result<Vec<MonitorRecord>, SyncError> {
        self.channel.pull().await
    }

    /// Replaces the registry with a fresh pull from the driver.
    pub async fn reload(&self) -> Result<(), SyncError> {
        let state = self.channel.pull().await?;
        debug!(monitors = state.len(), "reloading registry from driver");
        replace_registry(&self.registry, state);
        Ok(())
    }

    /// Passes `handler` straight to the channel.
    pub fn subscribe(&self, handler: StateHandler) -> Result<SubscriptionHandle, SyncError> {
        self.channel.subscribe(handler)
    }

    // ── Cached driver state ───────────────────────────────────────────────────

    /// Latest driver state seen through change events (or the initial pull).
    pub fn driver_state(&self) -> Vec<MonitorRecord> {
        self.driver_state.borrow().clone()
    }

    /// A receiver that is notified on every driver state change.
    pub fn watch_driver_state(&self) -> watch::Receiver<Vec<MonitorRecord>> {
        self.driver_state.clone()
    }

    /// Replaces the registry with the latest driver state seen through change
    /// events. No round trip to the driver.
    pub fn refresh_state(&self) {
        let state = self.driver_state();
        debug!(monitors = state.len(), "refreshing registry from cached driver state");
        replace_registry(&self.registry, state);
    }

    // ── Registry access ───────────────────────────────────────────────────────

    /// Runs `f` with exclusive access to the registry.
    ///
    /// Driver events that replace the registry wait until `f` returns.
    ///
    /// The guard is not reentrant: calling [`Self::snapshot`], [`Self::valid`],
    /// [`Self::refresh_state`] or `with_registry` itself from inside `f`
    /// deadlocks.  Work on the `&mut MonitorRegistry` that `f` receives.
    pub fn with_registry<R>(&self, f: impl FnOnce(&mut MonitorRegistry) -> R) -> R {
        let mut registry = self.registry.lock();
        let result = f(&mut registry);
        debug!(monitors = registry.len(), "registry edited");
        result
    }

    /// A copy of the registry as it is right now.
    pub fn snapshot(&self) -> MonitorRegistry {
        self.registry.lock().clone()
    }

    /// Advisory validity of the current registry.
    pub fn valid(&self) -> bool {
        self.registry.lock().valid()
    }

    // ── Following the driver ──────────────────────────────────────────────────

    /// Replaces the registry with the full driver state on every change event.
    ///
    /// Calling it again while already following is a no-op.
    pub fn follow_driver(&mut self) -> Result<(), SyncError> {
        if self.follow_subscription.is_some() {
            return Ok(());
        }

        let registry = Arc::clone(&self.registry);
        let handle = self.channel.subscribe(Box::new(move |state| {
            replace_registry(&registry, state);
        }))?;

        debug!(subscription = %handle.id(), "following driver state");
        self.follow_subscription = Some(handle);
        Ok(())
    }

    /// Stops replacing the registry on driver events.
    pub fn unfollow_driver(&mut self) {
        if let Some(handle) = self.follow_subscription.take() {
            handle.cancel();
        }
    }

    /// `true` while [`DriverSession::follow_driver`] is in effect.
    pub fn is_following(&self) -> bool {
        self.follow_subscription.is_some()
    }

    /// An independent session on the same channel.
    ///
    /// The copy starts with a clone of this registry and shares the cached
    /// driver state, but edits to either registry do not affect the other.
    /// The copy does not follow the driver even if this session does.
    pub fn duplicate(&self) -> Self {
        Self {
            channel: Arc::clone(&self.channel),
            registry: Arc::new(Mutex::new(self.snapshot())),
            driver_state: self.driver_state.clone(),
            state_subscription: Arc::clone(&self.state_subscription),
            follow_subscription: None,
        }
    }
}

impl std::fmt::Debug for DriverSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverSession")
            .field("registry", &*self.registry.lock())
            .field("following", &self.is_following())
            .finish_non_exhaustive()
    }
}

fn replace_registry(registry: &Mutex<MonitorRegistry>, state: Vec<MonitorRecord>) {
    let monitors: Vec<Monitor> = state.into_iter().map(Monitor::from).collect();
    let count = monitors.len();
    registry.lock().replace_all(monitors);
    trace!(monitors = count, "registry replaced with driver state");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sync_channel::MockSyncChannel;
    use vdd_core::{Mode, ModeRecord};

    fn record(id: u32) -> MonitorRecord {
        MonitorRecord {
            id,
            name: None,
            enabled: true,
            modes: vec![ModeRecord {
                width: 1920,
                height: 1080,
                refresh_rates: vec![60],
            }],
        }
    }

    /// A mock that answers `pull` with `state` and hands out inert handles.
    fn mock_with_state(state: Vec<MonitorRecord>) -> MockSyncChannel {
        let mut mock = MockSyncChannel::new();
        mock.expect_pull().returning(move || Ok(state.clone()));
        mock.expect_subscribe()
            .returning(|_| Ok(SubscriptionHandle::inert()));
        mock
    }

    type CapturedHandlers = Arc<Mutex<Vec<StateHandler>>>;

    /// A mock that keeps every subscribed handler so tests can fire events.
    fn mock_capturing_handlers(state: Vec<MonitorRecord>) -> (MockSyncChannel, CapturedHandlers) {
        let handlers: CapturedHandlers = Arc::default();
        let captured = Arc::clone(&handlers);

        let mut mock = MockSyncChannel::new();
        mock.expect_pull().returning(move || Ok(state.clone()));
        mock.expect_subscribe().returning(move |handler| {
            captured.lock().push(handler);
            Ok(SubscriptionHandle::inert())
        });
        (mock, handlers)
    }

    fn fire(handlers: &CapturedHandlers, state: Vec<MonitorRecord>) {
        for handler in handlers.lock().iter_mut() {
            handler(state.clone());
        }
    }

    // ── connect ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_connect_loads_initial_driver_state() {
        // Arrange
        let mock = mock_with_state(vec![record(0), record(2)]);

        // Act
        let session = DriverSession::connect(Arc::new(mock), &SessionConfig::default())
            .await
            .expect("connect");

        // Assert
        let ids: Vec<_> = session.snapshot().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(session.driver_state().len(), 2);
        assert!(!session.is_following());
    }

    #[tokio::test]
    async fn test_connect_propagates_pull_failure() {
        let mut mock = MockSyncChannel::new();
        mock.expect_pull()
            .returning(|| Err(SyncError::Unreachable("pipe not found".into())));

        let result = DriverSession::connect(Arc::new(mock), &SessionConfig::default()).await;

        assert_eq!(
            result.err(),
            Some(SyncError::Unreachable("pipe not found".into()))
        );
    }

    #[tokio::test]
    async fn test_connect_propagates_subscribe_failure() {
        let mut mock = MockSyncChannel::new();
        mock.expect_pull().returning(|| Ok(vec![]));
        mock.expect_subscribe().returning(|_| Err(SyncError::NoRuntime));

        let result = DriverSession::connect(Arc::new(mock), &SessionConfig::default()).await;

        assert_eq!(result.err(), Some(SyncError::NoRuntime));
    }

    // ── notify / persist ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_notify_pushes_registry_without_deduplicating() {
        // Arrange
        let mut mock = mock_with_state(vec![]);
        mock.expect_push()
            .withf(|records: &Vec<MonitorRecord>| {
                records.iter().map(|r| r.id).collect::<Vec<_>>() == vec![0, 0]
            })
            .times(1)
            .returning(|_| Ok(()));
        let session = DriverSession::connect(Arc::new(mock), &SessionConfig::default())
            .await
            .expect("connect");

        // Act
        session.with_registry(|r| {
            r.push(Monitor::new(0));
            r.push(Monitor::new(0));
        });
        let result = session.notify().await;

        // Assert
        assert!(result.is_ok());
        assert!(!session.valid());
    }

    #[tokio::test]
    async fn test_notify_surfaces_transport_error() {
        let mut mock = mock_with_state(vec![record(0)]);
        mock.expect_push()
            .returning(|_| Err(SyncError::Timeout(std::time::Duration::from_millis(500))));
        let session = DriverSession::connect(Arc::new(mock), &SessionConfig::default())
            .await
            .expect("connect");

        assert_eq!(
            session.notify().await,
            Err(SyncError::Timeout(std::time::Duration::from_millis(500)))
        );
    }

    #[tokio::test]
    async fn test_persist_calls_commit_once() {
        let mut mock = mock_with_state(vec![]);
        mock.expect_commit().times(1).returning(|| Ok(()));
        let session = DriverSession::connect(Arc::new(mock), &SessionConfig::default())
            .await
            .expect("connect");

        assert!(session.persist().await.is_ok());
    }

    // ── with_registry ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_with_registry_holds_guard_only_for_the_closure() {
        // Arrange
        let mock = mock_with_state(vec![record(0)]);
        let session = DriverSession::connect(Arc::new(mock), &SessionConfig::default())
            .await
            .expect("connect");

        // Act: check validity through the closure's own reference
        let (locked_inside, valid_inside) =
            session.with_registry(|r| (session.registry.is_locked(), r.valid()));

        // Assert
        assert!(locked_inside);
        assert!(valid_inside);
        assert!(!session.registry.is_locked());
        assert!(session.valid());
    }

    // ── pull / reload / refresh_state ─────────────────────────────────────────

    #[tokio::test]
    async fn test_pull_does_not_touch_registry() {
        let mock = mock_with_state(vec![record(4)]);
        let session = DriverSession::connect(Arc::new(mock), &SessionConfig::default())
            .await
            .expect("connect");
        session.with_registry(|r| r.remove_all());

        let pulled = session.pull().await.expect("pull");

        assert_eq!(pulled, vec![record(4)]);
        assert!(session.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_reload_replaces_registry_with_driver_state() {
        let mock = mock_with_state(vec![record(1)]);
        let session = DriverSession::connect(Arc::new(mock), &SessionConfig::default())
            .await
            .expect("connect");
        session.with_registry(|r| r.push(Monitor::new(7)));

        session.reload().await.expect("reload");

        let ids: Vec<_> = session.snapshot().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_refresh_state_uses_last_event_without_round_trip() {
        // Arrange
        let (mock, handlers) = mock_capturing_handlers(vec![record(0)]);
        let session = DriverSession::connect(Arc::new(mock), &SessionConfig::default())
            .await
            .expect("connect");

        // Act: the driver reports a change, then the caller refreshes
        fire(&handlers, vec![record(5), record(6)]);
        let before_refresh = session.snapshot().len();
        session.refresh_state();

        // Assert
        assert_eq!(before_refresh, 1);
        let ids: Vec<_> = session.snapshot().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![5, 6]);
    }

    // ── follow_driver ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_follow_driver_replaces_registry_on_event() {
        // Arrange
        let (mock, handlers) = mock_capturing_handlers(vec![]);
        let config = SessionConfig {
            follow_driver: true,
        };
        let session = DriverSession::connect(Arc::new(mock), &config)
            .await
            .expect("connect");
        session.with_registry(|r| r.push(Monitor::new(9)));

        // Act
        fire(&handlers, vec![record(3)]);

        // Assert
        assert!(session.is_following());
        let ids: Vec<_> = session.snapshot().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[tokio::test]
    async fn test_follow_driver_twice_subscribes_once() {
        let mut mock = MockSyncChannel::new();
        mock.expect_pull().returning(|| Ok(vec![]));
        // One subscription for the state cache, one for following.
        mock.expect_subscribe()
            .times(2)
            .returning(|_| Ok(SubscriptionHandle::inert()));
        let mut session = DriverSession::connect(Arc::new(mock), &SessionConfig::default())
            .await
            .expect("connect");

        session.follow_driver().expect("first follow");
        session.follow_driver().expect("second follow");
        session.unfollow_driver();

        assert!(!session.is_following());
    }

    // ── duplicate ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_duplicate_has_independent_registry() {
        // Arrange
        let (mock, handlers) = mock_capturing_handlers(vec![record(0)]);
        let session = DriverSession::connect(Arc::new(mock), &SessionConfig::default())
            .await
            .expect("connect");

        // Act
        let copy = session.duplicate();
        copy.with_registry(|r| {
            r.find_monitor_mut(0)
                .expect("monitor 0")
                .push_mode(Mode::new(800, 600, [60]));
        });
        fire(&handlers, vec![record(8)]);

        // Assert
        assert_eq!(session.snapshot().find_monitor(0).map(Monitor::mode_count), Some(1));
        assert_eq!(copy.snapshot().find_monitor(0).map(Monitor::mode_count), Some(2));
        assert_eq!(copy.driver_state(), vec![record(8)]);
    }
}
