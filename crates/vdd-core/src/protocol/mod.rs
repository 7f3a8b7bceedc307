//! Protocol module containing the wire record schema and the driver command
//! vocabulary.
//!
//! Only the data model lives here.  How commands are framed on a pipe or a
//! socket is up to the transport.

pub mod messages;
pub mod record;

pub use messages::*;
pub use record::{records_from_json_str, records_from_value, ModeRecord, MonitorRecord, RecordError};
