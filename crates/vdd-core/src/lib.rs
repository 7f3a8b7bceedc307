//! # vdd-core
//!
//! Shared library for the Virtual Display Driver client containing the
//! monitor state model, its advisory validity checks, and the record schema
//! exchanged with the driver.
//!
//! It has zero dependencies on OS APIs, async runtimes, or IPC transports.
//!
//! # Architecture overview
//!
//! The driver exposes any number of virtual monitors.  Each monitor offers a
//! list of display modes (resolutions), and each mode a set of refresh rates:
//!
//! ```text
//! MonitorRegistry ──► Monitor ──► Mode ──► RefreshRateSet
//! ```
//!
//! This crate defines:
//!
//! - **`domain`** – The in-memory tree and everything that can be asked of
//!   it: lookups, id allocation, bulk edits, and validity.  Mutations never
//!   check invariants; [`domain::validity`] recomputes them on demand.
//!
//! - **`protocol`** – The record form a monitor takes on the wire
//!   ([`MonitorRecord`]) and the command vocabulary understood by the driver.

pub mod domain;
pub mod protocol;

pub use domain::mode::{Mode, ParseModeError};
pub use domain::monitor::Monitor;
pub use domain::refresh_rate::RefreshRateSet;
pub use domain::registry::MonitorRegistry;
pub use domain::validity::ValidityIssue;
pub use protocol::messages::{
    ClientCommand, DriverCommand, EventCommand, ReplyCommand, RequestCommand, ServerCommand,
};
pub use protocol::record::{ModeRecord, MonitorRecord, RecordError};

/// Monitor identifier, unique across a registry when it is valid.
pub type Id = u32;

/// A width or height in pixels.
pub type Dimen = u32;

/// A refresh rate in hertz.
pub type RefreshRate = u32;
