//! Wire/record form of a monitor.
//!
//! A [`MonitorRecord`] is what crosses the boundary to the driver:
//!
//! ```json
//! {
//!   "id": 0,
//!   "name": "desk",
//!   "enabled": true,
//!   "modes": [ { "width": 1920, "height": 1080, "refresh_rates": [60, 120] } ]
//! }
//! ```
//!
//! # Defaulting rules
//!
//! | Field                  | Required | Default  |
//! |------------------------|----------|----------|
//! | `id`                   | yes      |          |
//! | `name`                 | no       | absent   |
//! | `enabled`              | no       | `true`   |
//! | `modes`                | no       | empty    |
//! | `modes[].width/height` | yes      |          |
//! | `modes[].refresh_rates`| no       | empty    |
//!
//! Two ways in:
//!
//! - The typed serde form (`serde_json::from_str::<MonitorRecord>`), used for
//!   trusted input such as driver replies.
//! - [`MonitorRecord::from_value`], for ad hoc maps supplied by callers.  It
//!   applies the same rules but reports the exact path of the first bad field
//!   (for example `modes[1].height`) through [`RecordError`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::mode::Mode;
use crate::domain::monitor::Monitor;
use crate::{Dimen, Id, RefreshRate};

/// Errors produced while building a record from an untyped value.
///
/// Every variant carries the path of the offending field, relative to the
/// value that was passed in.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// The input text is not JSON at all.
    #[error("malformed record JSON: {0}")]
    Json(String),

    /// A monitor or mode is not a JSON object.
    #[error("{path}: expected an object")]
    NotAnObject { path: String },

    /// A required field is missing or null.
    #[error("{path}: missing required field")]
    MissingField { path: String },

    /// A field holds a value of the wrong JSON type.
    #[error("{path}: expected {expected}")]
    WrongType { path: String, expected: &'static str },

    /// A numeric field is negative or does not fit in 32 bits.
    #[error("{path}: {value} is out of range")]
    OutOfRange { path: String, value: String },
}

/// One mode as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeRecord {
    pub width: Dimen,
    pub height: Dimen,
    #[serde(default)]
    pub refresh_rates: Vec<RefreshRate>,
}

/// One monitor as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorRecord {
    pub id: Id,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub modes: Vec<ModeRecord>,
}

fn default_enabled() -> bool {
    true
}

impl MonitorRecord {
    /// Builds a record from an untyped JSON value.
    ///
    /// # Errors
    ///
    /// Returns the first [`RecordError`] found, in field order.
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        monitor_from_value(value, "")
    }

    /// Parses JSON text and builds a record with [`MonitorRecord::from_value`].
    pub fn from_json_str(json: &str) -> Result<Self, RecordError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| RecordError::Json(e.to_string()))?;
        Self::from_value(&value)
    }
}

impl ModeRecord {
    /// Builds a mode record from an untyped JSON value.
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        mode_from_value(value, "")
    }
}

/// Builds a list of records from a JSON array, such as a driver state dump.
///
/// Paths in errors are prefixed with the element index (`[2].modes[0].width`).
pub fn records_from_value(value: &Value) -> Result<Vec<MonitorRecord>, RecordError> {
    let items = value.as_array().ok_or_else(|| RecordError::WrongType {
        path: String::new(),
        expected: "an array of monitors",
    })?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| monitor_from_value(item, &format!("[{i}]")))
        .collect()
}

/// Parses JSON text and builds a list of records with [`records_from_value`].
pub fn records_from_json_str(json: &str) -> Result<Vec<MonitorRecord>, RecordError> {
    let value: Value = serde_json::from_str(json).map_err(|e| RecordError::Json(e.to_string()))?;
    records_from_value(&value)
}

// ── Conversions ───────────────────────────────────────────────────────────────

impl From<ModeRecord> for Mode {
    /// Duplicate refresh rates in the record are coalesced.
    fn from(record: ModeRecord) -> Self {
        Mode::new(record.width, record.height, record.refresh_rates)
    }
}

impl From<&Mode> for ModeRecord {
    fn from(mode: &Mode) -> Self {
        Self {
            width: mode.width,
            height: mode.height,
            refresh_rates: mode.refresh_rates.as_slice().to_vec(),
        }
    }
}

impl From<MonitorRecord> for Monitor {
    fn from(record: MonitorRecord) -> Self {
        let mut monitor = Monitor::new(record.id)
            .with_enabled(record.enabled)
            .with_modes(record.modes.into_iter().map(Mode::from));
        monitor.name = record.name;
        monitor
    }
}

impl From<&Monitor> for MonitorRecord {
    fn from(monitor: &Monitor) -> Self {
        Self {
            id: monitor.id,
            name: monitor.name.clone(),
            enabled: monitor.enabled,
            modes: monitor.modes().iter().map(ModeRecord::from).collect(),
        }
    }
}

impl From<Monitor> for MonitorRecord {
    fn from(monitor: Monitor) -> Self {
        Self::from(&monitor)
    }
}

// ── Loose construction helpers ────────────────────────────────────────────────

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, RecordError> {
    value.as_object().ok_or_else(|| RecordError::NotAnObject {
        path: if path.is_empty() { "<root>".to_owned() } else { path.to_owned() },
    })
}

/// Looks up `key`, treating an explicit `null` the same as a missing field.
fn optional<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|v| !v.is_null())
}

fn to_u32(value: &Value, path: String) -> Result<u32, RecordError> {
    let Value::Number(number) = value else {
        return Err(RecordError::WrongType {
            path,
            expected: "an integer",
        });
    };

    if let Some(n) = number.as_u64() {
        return u32::try_from(n).map_err(|_| RecordError::OutOfRange {
            path,
            value: number.to_string(),
        });
    }
    if number.is_i64() {
        return Err(RecordError::OutOfRange {
            path,
            value: number.to_string(),
        });
    }

    Err(RecordError::WrongType {
        path,
        expected: "an integer",
    })
}

fn required_u32(object: &Map<String, Value>, key: &str, prefix: &str) -> Result<u32, RecordError> {
    let path = join(prefix, key);
    match optional(object, key) {
        Some(value) => to_u32(value, path),
        None => Err(RecordError::MissingField { path }),
    }
}

fn optional_array<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    prefix: &str,
) -> Result<&'a [Value], RecordError> {
    match optional(object, key) {
        None => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(RecordError::WrongType {
            path: join(prefix, key),
            expected: "an array",
        }),
    }
}

fn mode_from_value(value: &Value, path: &str) -> Result<ModeRecord, RecordError> {
    let object = as_object(value, path)?;

    let width = required_u32(object, "width", path)?;
    let height = required_u32(object, "height", path)?;

    let rates_path = join(path, "refresh_rates");
    let refresh_rates = optional_array(object, "refresh_rates", path)?
        .iter()
        .enumerate()
        .map(|(i, rate)| to_u32(rate, format!("{rates_path}[{i}]")))
        .collect::<Result<_, _>>()?;

    Ok(ModeRecord {
        width,
        height,
        refresh_rates,
    })
}

fn monitor_from_value(value: &Value, path: &str) -> Result<MonitorRecord, RecordError> {
    let object = as_object(value, path)?;

    let id = required_u32(object, "id", path)?;

    let name = match optional(object, "name") {
        None => None,
        Some(Value::String(name)) => Some(name.clone()),
        Some(_) => {
            return Err(RecordError::WrongType {
                path: join(path, "name"),
                expected: "a string",
            })
        }
    };

    let enabled = match optional(object, "enabled") {
        None => default_enabled(),
        Some(Value::Bool(enabled)) => *enabled,
        Some(_) => {
            return Err(RecordError::WrongType {
                path: join(path, "enabled"),
                expected: "a boolean",
            })
        }
    };

    let modes_path = join(path, "modes");
    let modes = optional_array(object, "modes", path)?
        .iter()
        .enumerate()
        .map(|(i, mode)| mode_from_value(mode, &format!("{modes_path}[{i}]")))
        .collect::<Result<_, _>>()?;

    Ok(MonitorRecord {
        id,
        name,
        enabled,
        modes,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
