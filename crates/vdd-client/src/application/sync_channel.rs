//! SyncChannel: the four primitives a client uses to talk to the driver.
//!
//! | Primitive   | Meaning                                                    |
//! |-------------|------------------------------------------------------------|
//! | `push`      | Make this monitor list the driver's live state (apply now) |
//! | `pull`      | Fetch the driver's live state                              |
//! | `commit`    | Make the last-pushed state survive a reboot                |
//! | `subscribe` | Get called with the full state on every driver change      |
//!
//! # What the channel does NOT do
//!
//! A channel passes monitor lists through untouched.  It never validates,
//! deduplicates or merges; the driver is the final arbiter and drops
//! duplicate ids on its side.  It never retries either.  A transport that
//! imposes its own timeout reports it as [`SyncError::Timeout`], and callers
//! see that error as-is.
//!
//! Infrastructure implements this trait (see
//! [`crate::infrastructure::transport`]); the application layer only depends
//! on the trait, so tests can swap in `MockSyncChannel`.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;
use vdd_core::MonitorRecord;

/// Callback invoked with the full driver state on every change.
///
/// Runs on a delivery context owned by the transport, concurrently with the
/// caller's own work.
pub type StateHandler = Box<dyn FnMut(Vec<MonitorRecord>) + Send + 'static>;

/// Transport failures raised by the [`SyncChannel`] primitives.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// The driver could not be reached.
    #[error("driver unreachable: {0}")]
    Unreachable(String),

    /// The driver answered with something that is not a valid reply.
    #[error("malformed driver response: {0}")]
    MalformedResponse(String),

    /// The transport gave up waiting.
    #[error("driver did not respond within {0:?}")]
    Timeout(Duration),

    /// The driver could not make its state durable.
    #[error("driver failed to persist state: {0}")]
    Persist(String),

    /// `subscribe` needs an async runtime to deliver events on.
    #[error("no async runtime available to deliver driver events")]
    NoRuntime,
}

/// The driver boundary.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SyncChannel: Send + Sync {
    /// Sends the complete monitor list as the driver's new live state.
    async fn push(&self, monitors: Vec<MonitorRecord>) -> Result<(), SyncError>;

    /// Fetches the driver's live state.
    async fn pull(&self) -> Result<Vec<MonitorRecord>, SyncError>;

    /// Persists the driver's last-pushed state across reboots.
    async fn commit(&self) -> Result<(), SyncError>;

    /// Registers `handler` for every subsequent state change.
    ///
    /// Delivery stops when the returned handle is cancelled or dropped.
    fn subscribe(&self, handler: StateHandler) -> Result<SubscriptionHandle, SyncError>;
}

// ── SubscriptionHandle ────────────────────────────────────────────────────────

/// Keeps a subscription alive.
///
/// Dropping the handle ends delivery, the same as [`SubscriptionHandle::cancel`].
/// Hold on to it for as long as events are wanted.
#[derive(Debug)]
#[must_use = "dropping a SubscriptionHandle cancels the subscription"]
pub struct SubscriptionHandle {
    id: Uuid,
    cancel: Option<oneshot::Sender<()>>,
}

impl SubscriptionHandle {
    /// Wraps the sending half of a cancellation signal.
    ///
    /// The transport's delivery task owns the receiving half and stops when it
    /// fires or when the sender is dropped.
    pub fn new(cancel: oneshot::Sender<()>) -> Self {
        Self {
            id: Uuid::new_v4(),
            cancel: Some(cancel),
        }
    }

    /// A handle with nothing behind it, for channels that never emit events.
    pub fn inert() -> Self {
        Self {
            id: Uuid::new_v4(),
            cancel: None,
        }
    }

    /// Identifier used in log output.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// `true` while the delivery side is still listening.
    pub fn is_active(&self) -> bool {
        self.cancel.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Stops delivery.
    pub fn cancel(mut self) {
        self.signal();
    }

    fn signal(&mut self) {
        if let Some(tx) = self.cancel.take() {
            // The delivery task may already be gone; nothing to do then.
            let _ = tx.send(());
            tracing::debug!(subscription = %self.id, "subscription cancelled");
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.signal();
    }
}
