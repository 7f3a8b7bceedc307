//! Structured logging setup.
//!
//! The library itself only emits `tracing` events.  Hosts that want to see
//! them call [`init`] once at startup, usually with the level from the
//! `[logging]` table of the client config.  The `VDD_LOG` environment
//! variable, when set, overrides that level with a full filter directive
//! (for example `VDD_LOG=vdd_client=trace,warn`).

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV_VAR: &str = "VDD_LOG";

/// Error type for logging setup.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter {filter:?}: {reason}")]
    InvalidFilter { filter: String, reason: String },

    /// A global subscriber was installed earlier.
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Installs a global `fmt` subscriber filtered by `VDD_LOG` or, when that is
/// unset or empty, by `level`.
///
/// # Errors
///
/// Returns [`LoggingError::InvalidFilter`] for an unparsable directive and
/// [`LoggingError::AlreadyInstalled`] on a second call.
pub fn init(level: &str) -> Result<(), LoggingError> {
    let filter = build_filter(std::env::var(LOG_ENV_VAR).ok().as_deref(), level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)
}

fn build_filter(env_override: Option<&str>, level: &str) -> Result<EnvFilter, LoggingError> {
    let directive = select_directive(env_override, level);

    EnvFilter::try_new(directive).map_err(|e| LoggingError::InvalidFilter {
        filter: directive.to_string(),
        reason: e.to_string(),
    })
}

/// The override if it is non-empty, else `level`.
fn select_directive<'a>(env_override: Option<&'a str>, level: &'a str) -> &'a str {
    env_override
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(level)
}
