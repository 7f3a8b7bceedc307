//! Storage infrastructure: client configuration and driver state files.
//!
//! - **`config`** – Reads and writes the TOML client configuration from the
//!   platform config directory, falling back to defaults on first run.
//! - **`state_file`** – Keeps a committed monitor list as JSON, the way the
//!   driver keeps its state across reboots.

pub mod config;
pub mod state_file;
