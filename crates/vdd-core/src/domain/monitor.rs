//! A single virtual monitor and its ordered list of modes.

use crate::domain::mode::Mode;
use crate::domain::validity;
use crate::{Dimen, Id};

/// A virtual monitor.
///
/// `id` uniqueness is a registry-wide property and is deliberately not
/// checked by [`Monitor::valid`]; use [`crate::MonitorRegistry::valid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    /// Identifier the driver knows this monitor by.
    pub id: Id,
    /// Optional human-readable name. Names are not required to be unique.
    pub name: Option<String>,
    /// Whether the driver should expose this monitor to the system.
    pub enabled: bool,
    modes: Vec<Mode>,
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Monitor {
    /// Creates an enabled, unnamed monitor with no modes.
    pub fn new(id: Id) -> Self {
        Self {
            id,
            name: None,
            enabled: true,
            modes: Vec::new(),
        }
    }

    /// Builder-style setter for [`Monitor::name`].
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder-style setter for [`Monitor::enabled`].
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder-style append of modes.
    pub fn with_modes(mut self, modes: impl IntoIterator<Item = Mode>) -> Self {
        self.modes.extend(modes);
        self
    }

    /// All modes in storage order.
    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    /// Mutable iteration over all modes in storage order.
    pub fn modes_mut(&mut self) -> impl Iterator<Item = &mut Mode> {
        self.modes.iter_mut()
    }

    /// Number of modes.
    pub fn mode_count(&self) -> usize {
        self.modes.len()
    }

    /// The mode at `index`.
    pub fn mode(&self, index: usize) -> Option<&Mode> {
        self.modes.get(index)
    }

    /// Mutable access to the mode at `index`.
    pub fn mode_mut(&mut self, index: usize) -> Option<&mut Mode> {
        self.modes.get_mut(index)
    }

    /// Replaces the mode at `index`, returning the previous one.
    ///
    /// Out of bounds is a no-op returning `None`.
    pub fn set_mode(&mut self, index: usize, mode: Mode) -> Option<Mode> {
        let slot = self.modes.get_mut(index)?;
        Some(std::mem::replace(slot, mode))
    }

    /// Removes and returns the mode at `index`.
    ///
    /// Out of bounds is a no-op returning `None`.
    pub fn remove_mode(&mut self, index: usize) -> Option<Mode> {
        if index < self.modes.len() {
            Some(self.modes.remove(index))
        } else {
            None
        }
    }

    /// Appends a mode. Duplicated resolutions are accepted and reported by
    /// [`Monitor::valid`].
    pub fn push_mode(&mut self, mode: Mode) {
        self.modes.push(mode);
    }

    /// Appends several modes in order.
    pub fn extend_modes(&mut self, modes: impl IntoIterator<Item = Mode>) {
        self.modes.extend(modes);
    }

    /// Replaces the whole mode list.
    pub fn set_modes(&mut self, modes: Vec<Mode>) {
        self.modes = modes;
    }

    /// Consumes the monitor and returns its modes.
    pub fn into_modes(self) -> Vec<Mode> {
        self.modes
    }

    /// First mode with the given resolution.
    pub fn find_mode(&self, width: Dimen, height: Dimen) -> Option<&Mode> {
        self.modes.iter().find(|m| m.resolution() == (width, height))
    }

    /// Mutable access to the first mode with the given resolution.
    pub fn find_mode_mut(&mut self, width: Dimen, height: Dimen) -> Option<&mut Mode> {
        self.modes
            .iter_mut()
            .find(|m| m.resolution() == (width, height))
    }

    /// Removes every mode with the given resolution; returns how many went.
    pub fn remove_resolution(&mut self, width: Dimen, height: Dimen) -> usize {
        self.remove_modes_where(|m| m.resolution() == (width, height))
    }

    /// Removes every mode matching `pred`; returns how many went.
    pub fn remove_modes_where(&mut self, mut pred: impl FnMut(&Mode) -> bool) -> usize {
        let before = self.modes.len();
        self.modes.retain(|m| !pred(m));
        before - self.modes.len()
    }

    /// `true` iff every mode is valid and no two modes share a resolution.
    ///
    /// Does not look at `id`: uniqueness of ids is a registry-wide check.
    pub fn valid(&self) -> bool {
        validity::monitor_is_valid(self)
    }
}
