//! Advisory validity: structural checks computed on demand.
//!
//! Nothing in the domain enforces these rules while the tree is being edited.
//! Each function here recomputes its answer from the current structure and
//! caches nothing.  The `valid()` methods on the entities delegate here.
//!
//! Rules:
//!
//! | Level    | Rule                                                  |
//! |----------|-------------------------------------------------------|
//! | Mode     | width > 0, height > 0, at least one refresh rate      |
//! | Monitor  | every mode valid, no two modes share a resolution     |
//! | Registry | every monitor valid, no two monitors share an id      |
//!
//! Refresh-rate uniqueness is not listed because [`crate::RefreshRateSet`]
//! cannot hold duplicates in the first place.

use std::collections::HashSet;

use thiserror::Error;

use crate::domain::mode::Mode;
use crate::domain::monitor::Monitor;
use crate::{Dimen, Id};

/// One reason a tree is not fit to be pushed to the driver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidityIssue {
    /// Two or more monitors share this id.
    #[error("duplicate monitor with ID {id}")]
    DuplicateMonitorId { id: Id },

    /// The resolution appears more than once on the monitor.
    #[error("duplicate mode {width}x{height} on monitor {monitor}")]
    DuplicateMode {
        monitor: Id,
        width: Dimen,
        height: Dimen,
    },

    /// The mode has a zero width or height.
    #[error("mode {width}x{height} on monitor {monitor} has a zero dimension")]
    ZeroDimension {
        monitor: Id,
        width: Dimen,
        height: Dimen,
    },

    /// The mode offers no refresh rate.
    #[error("mode {width}x{height} on monitor {monitor} has no refresh rates")]
    NoRefreshRates {
        monitor: Id,
        width: Dimen,
        height: Dimen,
    },
}

/// `true` iff width and height are positive and the rate set is non-empty.
pub fn mode_is_valid(mode: &Mode) -> bool {
    mode.width > 0 && mode.height > 0 && mode.refresh_rates.valid()
}

/// `true` iff every mode is valid and no two modes share a resolution.
pub fn monitor_is_valid(monitor: &Monitor) -> bool {
    monitor.modes().iter().all(mode_is_valid) && !has_duplicate_resolutions(monitor.modes())
}

/// `true` iff every monitor is valid and all ids are distinct.
pub fn registry_is_valid(monitors: &[Monitor]) -> bool {
    monitors.iter().all(monitor_is_valid) && duplicate_ids(monitors).is_empty()
}

/// Ids used by more than one monitor, each listed once, in order of first
/// repetition.
pub fn duplicate_ids(monitors: &[Monitor]) -> Vec<Id> {
    let mut seen = HashSet::with_capacity(monitors.len());
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();

    for monitor in monitors {
        if !seen.insert(monitor.id) && reported.insert(monitor.id) {
            duplicates.push(monitor.id);
        }
    }

    duplicates
}

/// Lists every issue in the tree, in registry order.
///
/// Empty iff [`registry_is_valid`] holds.
pub fn issues(monitors: &[Monitor]) -> Vec<ValidityIssue> {
    let mut found: Vec<ValidityIssue> = duplicate_ids(monitors)
        .into_iter()
        .map(|id| ValidityIssue::DuplicateMonitorId { id })
        .collect();

    for monitor in monitors {
        found.extend(monitor_issues(monitor));
    }

    found
}

/// Lists the issues local to one monitor.
pub fn monitor_issues(monitor: &Monitor) -> Vec<ValidityIssue> {
    let mut found = Vec::new();
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();

    for mode in monitor.modes() {
        let (width, height) = mode.resolution();

        if width == 0 || height == 0 {
            found.push(ValidityIssue::ZeroDimension {
                monitor: monitor.id,
                width,
                height,
            });
        }
        if !mode.refresh_rates.valid() {
            found.push(ValidityIssue::NoRefreshRates {
                monitor: monitor.id,
                width,
                height,
            });
        }
        if !seen.insert((width, height)) && reported.insert((width, height)) {
            found.push(ValidityIssue::DuplicateMode {
                monitor: monitor.id,
                width,
                height,
            });
        }
    }

    found
}

fn has_duplicate_resolutions(modes: &[Mode]) -> bool {
    let mut seen = HashSet::with_capacity(modes.len());
    modes.iter().any(|mode| !seen.insert(mode.resolution()))
}
