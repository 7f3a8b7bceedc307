//! Command vocabulary exchanged with the driver.
//!
//! Commands serialize with serde's default external tagging, so a
//! [`DriverCommand::Remove`] with ids `[1, 2]` is `{"Remove":[1,2]}` in JSON and
//! a unit command such as [`RequestCommand::State`] is the bare string
//! `"State"`.
//!
//! The transport reads whatever arrives into one of the untagged unions
//! ([`ServerCommand`] on the driver side, [`ClientCommand`] on the client side)
//! and dispatches from there.

use serde::{Deserialize, Serialize};

use crate::protocol::record::MonitorRecord;
use crate::Id;

// ── Client → driver ───────────────────────────────────────────────────────────

/// Commands that change driver state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverCommand {
    /// Replace the driver's monitors with this list (adds and updates).
    Notify(Vec<MonitorRecord>),
    /// Remove the monitors with these ids.
    Remove(Vec<Id>),
    /// Remove every monitor.
    RemoveAll,
}

/// Commands that ask the driver for information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestCommand {
    /// Ask for the current monitor state.
    State,
}

// ── Driver → client ───────────────────────────────────────────────────────────

/// Answers to a [`RequestCommand`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyCommand {
    /// The driver's current monitor state.
    State(Vec<MonitorRecord>),
}

/// Unsolicited notifications from the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventCommand {
    /// The monitor state changed; carries the full new state.
    Changed(Vec<MonitorRecord>),
}

// ── Untagged unions ───────────────────────────────────────────────────────────

/// Anything a client may send to the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerCommand {
    Driver(DriverCommand),
    Request(RequestCommand),
}

/// Anything the driver may send to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientCommand {
    Reply(ReplyCommand),
    Event(EventCommand),
}

impl From<DriverCommand> for ServerCommand {
    fn from(command: DriverCommand) -> Self {
        ServerCommand::Driver(command)
    }
}

impl From<RequestCommand> for ServerCommand {
    fn from(command: RequestCommand) -> Self {
        ServerCommand::Request(command)
    }
}

impl From<ReplyCommand> for ClientCommand {
    fn from(command: ReplyCommand) -> Self {
        ClientCommand::Reply(command)
    }
}

impl From<EventCommand> for ClientCommand {
    fn from(command: EventCommand) -> Self {
        ClientCommand::Event(command)
    }
}
