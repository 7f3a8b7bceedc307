//! Display mode: a resolution and the refresh rates offered at it.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::refresh_rate::RefreshRateSet;
use crate::domain::validity;
use crate::{Dimen, RefreshRate};

/// Errors produced when parsing a mode from text such as `"1920x1080@60/120"`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseModeError {
    /// The resolution part has no `x` between width and height.
    #[error("invalid resolution in {0:?}, expected a string like \"1920x1080\"")]
    MissingSeparator(String),

    /// The width is not a non-negative integer.
    #[error("invalid width in {0:?}, expected a number")]
    InvalidWidth(String),

    /// The height is not a non-negative integer.
    #[error("invalid height in {0:?}, expected a number")]
    InvalidHeight(String),

    /// One of the `/`-separated refresh rates is not a non-negative integer.
    #[error("invalid refresh rate {rate:?} in {input:?}, expected a number")]
    InvalidRefreshRate { input: String, rate: String },
}

/// A resolution and its refresh rates.
///
/// Width and height are independent fields: resizing is two assignments and
/// the state between them (say, a zero height) is observable and legal.
/// Whether a resolution is duplicated on the owning monitor is not this
/// type's concern; see [`crate::Monitor::valid`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Mode {
    /// Width in pixels.
    pub width: Dimen,
    /// Height in pixels.
    pub height: Dimen,
    /// Refresh rates offered at this resolution.
    pub refresh_rates: RefreshRateSet,
}

impl Mode {
    /// Creates a mode, coalescing duplicate refresh rates.
    pub fn new(
        width: Dimen,
        height: Dimen,
        refresh_rates: impl IntoIterator<Item = RefreshRate>,
    ) -> Self {
        Self {
            width,
            height,
            refresh_rates: refresh_rates.into_iter().collect(),
        }
    }

    /// The `(width, height)` pair identifying this mode on its monitor.
    pub fn resolution(&self) -> (Dimen, Dimen) {
        (self.width, self.height)
    }

    /// Returns `true` if `other` has the same resolution.
    pub fn same_resolution(&self, other: &Mode) -> bool {
        self.resolution() == other.resolution()
    }

    /// `true` iff width and height are positive and at least one refresh rate
    /// is present.
    pub fn valid(&self) -> bool {
        validity::mode_is_valid(self)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)?;

        let mut rates = self.refresh_rates.iter();
        if let Some(first) = rates.next() {
            write!(f, "@{first}")?;
            for rate in rates {
                write!(f, "/{rate}")?;
            }
        }

        Ok(())
    }
}

impl FromStr for Mode {
    type Err = ParseModeError;

    /// Parses `WIDTHxHEIGHT` optionally followed by `@R1/R2/...`.
    ///
    /// A mode without the `@` part parses with an empty rate set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resolution, rate_list) = match s.split_once('@') {
            Some((resolution, rate_list)) => (resolution, Some(rate_list)),
            None => (s, None),
        };

        let (width, height) = resolution
            .split_once('x')
            .ok_or_else(|| ParseModeError::MissingSeparator(s.to_owned()))?;
        let width = width
            .trim()
            .parse()
            .map_err(|_| ParseModeError::InvalidWidth(s.to_owned()))?;
        let height = height
            .trim()
            .parse()
            .map_err(|_| ParseModeError::InvalidHeight(s.to_owned()))?;

        let mut refresh_rates = RefreshRateSet::new();
        if let Some(rate_list) = rate_list {
            for rate in rate_list.split('/') {
                let parsed = rate
                    .trim()
                    .parse()
                    .map_err(|_| ParseModeError::InvalidRefreshRate {
                        input: s.to_owned(),
                        rate: rate.to_owned(),
                    })?;
                refresh_rates.push(parsed);
            }
        }

        Ok(Self {
            width,
            height,
            refresh_rates,
        })
    }
}
