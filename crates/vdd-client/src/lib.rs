//! vdd-client library entry point.
//!
//! Wires the [`vdd_core`] monitor registry to a driver:
//!
//! - **`application`** – The [`SyncChannel`](application::sync_channel::SyncChannel)
//!   boundary and the [`DriverSession`](application::session::DriverSession)
//!   that edits a registry and synchronizes it on request.
//! - **`infrastructure`** – Concrete channels and file storage: the in-process
//!   loopback driver, the TOML client config, and the JSON state file.
//! - **`logging`** – One-call `tracing` subscriber setup for hosts.
//!
//! Integration tests in `tests/` use the same module tree.

pub mod application;
pub mod infrastructure;
pub mod logging;

pub use application::session::{DriverSession, SessionConfig};
pub use application::sync_channel::{StateHandler, SubscriptionHandle, SyncChannel, SyncError};
