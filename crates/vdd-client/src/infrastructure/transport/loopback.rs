//! LoopbackDriver: an in-process driver speaking the driver command vocabulary.
//!
//! It keeps a live monitor list, a committed copy, and a broadcast channel of
//! change events, and answers [`ServerCommand`]s the way the real driver does:
//!
//! | Command               | Effect                                              |
//! |-----------------------|-----------------------------------------------------|
//! | `Notify(monitors)`    | Live state := monitors, keeping the first per id    |
//! | `Remove(ids)`         | Drops the listed ids; unknown ids are ignored       |
//! | `RemoveAll`           | Clears the live state                               |
//! | `State` (request)     | Replies with the live state                         |
//!
//! Every command that actually changes the live state broadcasts
//! `EventCommand::Changed` with the full new list.  Commands that leave it as
//! it was broadcast nothing.
//!
//! # Committed state
//!
//! [`SyncChannel::commit`] copies the live state to the store: a
//! [`StateFile`] when one is configured, otherwise memory.
//! [`LoopbackDriver::restart`] then plays the part of a reboot by reloading
//! the live state from that store.
//!
//! # Failure injection
//!
//! [`LoopbackDriver::disconnect`] makes every primitive fail with
//! [`SyncError::Unreachable`] until [`LoopbackDriver::reconnect`] is called.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, trace, warn};
use vdd_core::{
    ClientCommand, DriverCommand, EventCommand, Id, MonitorRecord, ReplyCommand, RequestCommand,
    ServerCommand,
};

use crate::application::sync_channel::{StateHandler, SubscriptionHandle, SyncChannel, SyncError};
use crate::infrastructure::storage::config::DriverConfig;
use crate::infrastructure::storage::state_file::{StateFile, StorageError};

/// Where committed state goes.
#[derive(Debug)]
enum Store {
    Memory(Mutex<Vec<MonitorRecord>>),
    File(StateFile),
}

impl Store {
    fn load(&self) -> Result<Vec<MonitorRecord>, StorageError> {
        match self {
            Store::Memory(committed) => Ok(committed.lock().clone()),
            Store::File(file) => file.load(),
        }
    }

    fn save(&self, monitors: &[MonitorRecord]) -> Result<(), StorageError> {
        match self {
            Store::Memory(committed) => {
                *committed.lock() = monitors.to_vec();
                Ok(())
            }
            Store::File(file) => file.save(monitors),
        }
    }
}

#[derive(Debug)]
struct Inner {
    live: Mutex<Vec<MonitorRecord>>,
    connected: Mutex<bool>,
    store: Store,
    events: broadcast::Sender<EventCommand>,
}

/// In-process driver.  Clones share the same state.
#[derive(Debug, Clone)]
pub struct LoopbackDriver {
    inner: Arc<Inner>,
}

impl Default for LoopbackDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackDriver {
    /// A driver with no monitors, committing to memory.
    pub fn new() -> Self {
        Self::with_store(Store::Memory(Mutex::default()), Vec::new(), default_capacity())
    }

    /// A driver whose live state starts as `monitors`.
    ///
    /// The list is applied like a `Notify`, so duplicate ids are dropped.
    pub fn with_state(monitors: Vec<MonitorRecord>) -> Self {
        Self::with_store(
            Store::Memory(Mutex::default()),
            dedup_by_id(monitors),
            default_capacity(),
        )
    }

    /// Builds a driver from the `[driver]` config table.
    ///
    /// With a `state_file`, the live state starts as whatever was last
    /// committed there, as after a reboot.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the state file exists but cannot be read.
    pub fn from_config(config: &DriverConfig) -> Result<Self, StorageError> {
        let capacity = config.event_capacity.max(1);
        match &config.state_file {
            Some(path) => {
                let file = StateFile::new(path);
                let initial = dedup_by_id(file.load()?);
                info!(
                    path = %file.path().display(),
                    monitors = initial.len(),
                    "loopback driver loaded committed state"
                );
                Ok(Self::with_store(Store::File(file), initial, capacity))
            }
            None => Ok(Self::with_store(
                Store::Memory(Mutex::default()),
                Vec::new(),
                capacity,
            )),
        }
    }

    fn with_store(store: Store, live: Vec<MonitorRecord>, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(Inner {
                live: Mutex::new(live),
                connected: Mutex::new(true),
                store,
                events,
            }),
        }
    }

    // ── Command handling ──────────────────────────────────────────────────────

    /// Applies one command and returns the reply, if the command has one.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Unreachable`] while disconnected.
    pub fn handle(&self, command: ServerCommand) -> Result<Option<ClientCommand>, SyncError> {
        self.ensure_connected()?;
        debug!(?command, "loopback driver handling command");

        match command {
            ServerCommand::Driver(DriverCommand::Notify(monitors)) => {
                self.apply(|_| dedup_by_id(monitors));
                Ok(None)
            }
            ServerCommand::Driver(DriverCommand::Remove(ids)) => {
                self.apply(|live| remove_ids(live, &ids));
                Ok(None)
            }
            ServerCommand::Driver(DriverCommand::RemoveAll) => {
                self.apply(|_| Vec::new());
                Ok(None)
            }
            ServerCommand::Request(RequestCommand::State) => {
                let state = self.inner.live.lock().clone();
                Ok(Some(ReplyCommand::State(state).into()))
            }
        }
    }

    /// Reloads the live state from the committed store, as a reboot would.
    pub fn restart(&self) -> Result<(), SyncError> {
        self.ensure_connected()?;
        let committed = self
            .inner
            .store
            .load()
            .map_err(|e| SyncError::Persist(e.to_string()))?;
        info!(monitors = committed.len(), "loopback driver restarted");
        self.apply(|_| dedup_by_id(committed));
        Ok(())
    }

    // ── Inspection and failure injection ──────────────────────────────────────

    /// The live state, bypassing the connection check.
    pub fn state(&self) -> Vec<MonitorRecord> {
        self.inner.live.lock().clone()
    }

    /// The committed state, bypassing the connection check.
    pub fn committed_state(&self) -> Result<Vec<MonitorRecord>, StorageError> {
        self.inner.store.load()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.events.receiver_count()
    }

    /// Makes every primitive fail until [`LoopbackDriver::reconnect`].
    pub fn disconnect(&self) {
        *self.inner.connected.lock() = false;
        info!("loopback driver disconnected");
    }

    pub fn reconnect(&self) {
        *self.inner.connected.lock() = true;
        info!("loopback driver reconnected");
    }

    pub fn is_connected(&self) -> bool {
        *self.inner.connected.lock()
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn ensure_connected(&self) -> Result<(), SyncError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(SyncError::Unreachable("loopback driver is disconnected".to_string()))
        }
    }

    /// Computes the next live state from the current one and broadcasts it if
    /// it differs.
    ///
    /// The broadcast happens under the `live` lock, so events leave in the
    /// same order as the state changes they describe.
    fn apply(&self, next: impl FnOnce(&[MonitorRecord]) -> Vec<MonitorRecord>) {
        let mut live = self.inner.live.lock();
        let updated = next(live.as_slice());
        if updated == *live {
            trace!("command left driver state unchanged");
            return;
        }

        *live = updated;
        trace!(
            monitors = live.len(),
            subscribers = self.subscriber_count(),
            "broadcasting change"
        );
        // No subscribers is not an error.
        let _ = self.inner.events.send(EventCommand::Changed(live.clone()));
    }
}

fn default_capacity() -> usize {
    DriverConfig::default().event_capacity
}

/// Keeps the first monitor for each id, dropping later ones.
fn dedup_by_id(monitors: Vec<MonitorRecord>) -> Vec<MonitorRecord> {
    let mut seen = std::collections::HashSet::with_capacity(monitors.len());
    monitors
        .into_iter()
        .filter(|m| {
            let first = seen.insert(m.id);
            if !first {
                warn!(id = m.id, "dropping monitor with duplicate id");
            }
            first
        })
        .collect()
}

fn remove_ids(live: &[MonitorRecord], ids: &[Id]) -> Vec<MonitorRecord> {
    live.iter()
        .filter(|m| !ids.contains(&m.id))
        .cloned()
        .collect()
}

// ── SyncChannel ───────────────────────────────────────────────────────────────

#[async_trait]
impl SyncChannel for LoopbackDriver {
    async fn push(&self, monitors: Vec<MonitorRecord>) -> Result<(), SyncError> {
        self.handle(DriverCommand::Notify(monitors).into()).map(|_| ())
    }

    async fn pull(&self) -> Result<Vec<MonitorRecord>, SyncError> {
        match self.handle(RequestCommand::State.into())? {
            Some(ClientCommand::Reply(ReplyCommand::State(monitors))) => Ok(monitors),
            other => Err(SyncError::MalformedResponse(format!(
                "expected a state reply, got {other:?}"
            ))),
        }
    }

    async fn commit(&self) -> Result<(), SyncError> {
        self.ensure_connected()?;
        let state = self.state();
        self.inner
            .store
            .save(&state)
            .map_err(|e| SyncError::Persist(e.to_string()))?;
        info!(monitors = state.len(), "loopback driver committed state");
        Ok(())
    }

    fn subscribe(&self, mut handler: StateHandler) -> Result<SubscriptionHandle, SyncError> {
        self.ensure_connected()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SyncError::NoRuntime)?;

        let mut events = self.inner.events.subscribe();
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let handle = SubscriptionHandle::new(cancel_tx);
        let id = handle.id();

        runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => break,
                    event = events.recv() => match event {
                        Ok(EventCommand::Changed(state)) => {
                            trace!(subscription = %id, monitors = state.len(), "delivering change");
                            handler(state);
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            warn!(subscription = %id, missed, "subscriber lagged; skipped change events");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            debug!(subscription = %id, "subscription ended");
        });

        debug!(subscription = %id, "subscribed to loopback driver");
        Ok(handle)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
