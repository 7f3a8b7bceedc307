//! Application layer for the driver client.
//!
//! # What lives here? (for beginners)
//!
//! This layer sits between the pure state model in `vdd_core` and the
//! infrastructure that actually reaches a driver.  It:
//!
//! - **Defines the driver boundary** as a trait ([`sync_channel::SyncChannel`])
//!   so the session never cares whether the driver is a named pipe, a socket,
//!   or the in-process loopback used by tests.
//! - **Orchestrates** registry edits and synchronization for one client
//!   ([`session::DriverSession`]).
//! - **Contains no file system or IPC code** of its own.
//!
//! # Sub-modules
//!
//! - **`sync_channel`** – The push/pull/commit/subscribe primitives, their
//!   error type, and the handle that keeps a subscription alive.
//!
//! - **`session`** – The registry behind a single-writer guard, wired to a
//!   channel.

pub mod session;
pub mod sync_channel;
