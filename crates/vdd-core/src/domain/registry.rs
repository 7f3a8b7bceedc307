//! MonitorRegistry: the client's in-memory document of all monitors.
//!
//! The registry is the single source of truth for a client session until it
//! is pushed to the driver or overwritten by a pull.  Local mutation never
//! reaches the driver on its own.
//!
//! # Stale state
//!
//! Another process may change the driver at any time.  Everything here works
//! on whatever the registry currently holds, so in particular
//! [`MonitorRegistry::new_id`] only avoids ids that are *locally* known.  A
//! stale registry can therefore hand out an id that is already taken on the
//! driver side; the driver silently drops such duplicates when the state is
//! pushed.
//!
//! # Query rules
//!
//! [`MonitorRegistry::find_id`] and [`MonitorRegistry::find_monitor_query`]
//! accept either an id or a name:
//!
//! 1. If the query parses as an [`Id`] and some monitor has that id, the first
//!    such monitor (in registry order) matches.
//! 2. Otherwise the first monitor whose name equals the query exactly
//!    (case-sensitive) matches.
//! 3. Otherwise nothing matches.
//!
//! Names are not unique, so "first in registry order" is the tie-break.

use std::collections::HashSet;

use crate::domain::mode::Mode;
use crate::domain::monitor::Monitor;
use crate::domain::validity::{self, ValidityIssue};
use crate::protocol::record::MonitorRecord;
use crate::{Dimen, Id};

/// Ordered collection of monitors.
///
/// May transiently hold monitors with conflicting ids; that is reported by
/// [`MonitorRegistry::valid`] but never prevented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorRegistry {
    monitors: Vec<Monitor>,
}

impl MonitorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding `monitors` in the given order.
    pub fn from_monitors(monitors: Vec<Monitor>) -> Self {
        Self { monitors }
    }

    /// Builds a registry from wire records, preserving order and duplicates.
    pub fn from_records(records: impl IntoIterator<Item = MonitorRecord>) -> Self {
        Self {
            monitors: records.into_iter().map(Monitor::from).collect(),
        }
    }

    /// Serializes every monitor to its wire record, in registry order.
    pub fn to_records(&self) -> Vec<MonitorRecord> {
        self.monitors.iter().map(MonitorRecord::from).collect()
    }

    // ── Collection access ─────────────────────────────────────────────────────

    /// Number of monitors.
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    /// Returns `true` if the registry holds no monitors.
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    /// All monitors in registry order.
    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    /// Iterates monitors in registry order.
    pub fn iter(&self) -> std::slice::Iter<'_, Monitor> {
        self.monitors.iter()
    }

    /// Mutably iterates monitors in registry order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Monitor> {
        self.monitors.iter_mut()
    }

    /// The monitor at position `index`.
    pub fn get(&self, index: usize) -> Option<&Monitor> {
        self.monitors.get(index)
    }

    /// Mutable access to the monitor at position `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Monitor> {
        self.monitors.get_mut(index)
    }

    /// Replaces the monitor at `index`, returning the previous one.
    ///
    /// Out of bounds is a no-op returning `None`.
    pub fn set(&mut self, index: usize, monitor: Monitor) -> Option<Monitor> {
        let slot = self.monitors.get_mut(index)?;
        Some(std::mem::replace(slot, monitor))
    }

    /// Removes and returns the monitor at `index`.
    ///
    /// Out of bounds is a no-op returning `None`.
    pub fn remove_at(&mut self, index: usize) -> Option<Monitor> {
        if index < self.monitors.len() {
            Some(self.monitors.remove(index))
        } else {
            None
        }
    }

    /// Appends a monitor, even if its id is already in use.
    pub fn push(&mut self, monitor: Monitor) {
        self.monitors.push(monitor);
    }

    /// Appends several monitors in order.
    pub fn extend(&mut self, monitors: impl IntoIterator<Item = Monitor>) {
        self.monitors.extend(monitors);
    }

    /// Replaces the whole collection, returning the old one.
    pub fn replace_all(&mut self, monitors: Vec<Monitor>) -> Vec<Monitor> {
        std::mem::replace(&mut self.monitors, monitors)
    }

    /// Consumes the registry and returns its monitors.
    pub fn into_monitors(self) -> Vec<Monitor> {
        self.monitors
    }

    // ── Lookup ────────────────────────────────────────────────────────────────

    /// First monitor with the given id.
    pub fn find_monitor(&self, id: Id) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.id == id)
    }

    /// Mutable access to the first monitor with the given id.
    pub fn find_monitor_mut(&mut self, id: Id) -> Option<&mut Monitor> {
        self.monitors.iter_mut().find(|m| m.id == id)
    }

    /// Resolves a name-or-id query to a monitor id.
    ///
    /// See the module docs for the matching rules.
    pub fn find_id(&self, query: &str) -> Option<Id> {
        self.position_by_query(query).map(|i| self.monitors[i].id)
    }

    /// Resolves a name-or-id query to a monitor.
    pub fn find_monitor_query(&self, query: &str) -> Option<&Monitor> {
        self.position_by_query(query).map(|i| &self.monitors[i])
    }

    /// Resolves a name-or-id query to a mutable monitor.
    pub fn find_monitor_query_mut(&mut self, query: &str) -> Option<&mut Monitor> {
        let index = self.position_by_query(query)?;
        self.monitors.get_mut(index)
    }

    // ── Id allocation ─────────────────────────────────────────────────────────

    /// Allocates an id that no monitor in this registry uses.
    ///
    /// - `Some(preferred)` returns `preferred` if unused, otherwise `None`.
    ///   The caller never silently gets a different id than requested.
    /// - `None` returns the smallest non-negative id not in use.
    ///
    /// Only locally known ids are avoided; see the module docs on stale state.
    pub fn new_id(&self, preferred: Option<Id>) -> Option<Id> {
        let existing: HashSet<Id> = self.monitors.iter().map(|m| m.id).collect();

        match preferred {
            Some(id) if existing.contains(&id) => None,
            Some(id) => Some(id),
            // At most `len` ids are taken, so a gap exists in 0..=len.
            None => (0..=Id::MAX).find(|id| !existing.contains(id)),
        }
    }

    // ── Bulk mutation ─────────────────────────────────────────────────────────

    /// Removes every monitor whose id is in `ids`. Unknown ids are skipped.
    ///
    /// Returns how many monitors were removed.
    pub fn remove(&mut self, ids: &[Id]) -> usize {
        self.remove_where(|m| ids.contains(&m.id))
    }

    /// Removes every monitor matched by one of `queries`.
    ///
    /// Each query is resolved with [`MonitorRegistry::find_id`] before anything
    /// is removed; unmatched queries are skipped.  Returns how many monitors
    /// were removed.
    pub fn remove_query(&mut self, queries: &[impl AsRef<str>]) -> usize {
        let ids = self.resolve_queries(queries);
        self.remove(&ids)
    }

    /// Removes every monitor matching `pred`; returns how many went.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&Monitor) -> bool) -> usize {
        let before = self.monitors.len();
        self.monitors.retain(|m| !pred(m));
        before - self.monitors.len()
    }

    /// Removes every monitor.
    pub fn remove_all(&mut self) {
        self.monitors.clear();
    }

    /// Sets `enabled` on every monitor whose id is in `ids`. Unknown ids are
    /// skipped.
    ///
    /// Returns how many monitors were updated.
    pub fn set_enabled(&mut self, ids: &[Id], enabled: bool) -> usize {
        let mut updated = 0;
        for monitor in self.monitors.iter_mut().filter(|m| ids.contains(&m.id)) {
            monitor.enabled = enabled;
            updated += 1;
        }
        updated
    }

    /// Sets `enabled` on every monitor matched by one of `queries`.
    ///
    /// Unmatched queries are skipped. Returns how many monitors were updated.
    pub fn set_enabled_query(&mut self, queries: &[impl AsRef<str>], enabled: bool) -> usize {
        let ids = self.resolve_queries(queries);
        self.set_enabled(&ids, enabled)
    }

    // ── Per-monitor edits ─────────────────────────────────────────────────────

    /// Replaces the first monitor whose id equals `monitor.id`.
    ///
    /// Returns the monitor that was replaced, or `None` (leaving the registry
    /// untouched) when no monitor has that id.
    pub fn replace_monitor(&mut self, monitor: Monitor) -> Option<Monitor> {
        let slot = self.find_monitor_mut(monitor.id)?;
        Some(std::mem::replace(slot, monitor))
    }

    /// Appends `mode` to the first monitor with the given id.
    ///
    /// A mode whose resolution the monitor already has is still appended;
    /// the clash shows up in [`MonitorRegistry::issues`].  Returns `false`
    /// when no monitor has that id.
    pub fn add_mode(&mut self, id: Id, mode: Mode) -> bool {
        match self.find_monitor_mut(id) {
            Some(monitor) => {
                monitor.push_mode(mode);
                true
            }
            None => false,
        }
    }

    /// [`MonitorRegistry::add_mode`] for a name-or-id query.
    pub fn add_mode_query(&mut self, query: &str, mode: Mode) -> bool {
        match self.find_monitor_query_mut(query) {
            Some(monitor) => {
                monitor.push_mode(mode);
                true
            }
            None => false,
        }
    }

    /// Drops every mode with the given resolution from the first monitor with
    /// the given id.
    ///
    /// Returns how many modes went, or `None` when no monitor has that id.
    /// A resolution the monitor does not have removes nothing.
    pub fn remove_mode(&mut self, id: Id, (width, height): (Dimen, Dimen)) -> Option<usize> {
        self.find_monitor_mut(id)
            .map(|monitor| monitor.remove_resolution(width, height))
    }

    /// [`MonitorRegistry::remove_mode`] for a name-or-id query.
    pub fn remove_mode_query(
        &mut self,
        query: &str,
        (width, height): (Dimen, Dimen),
    ) -> Option<usize> {
        self.find_monitor_query_mut(query)
            .map(|monitor| monitor.remove_resolution(width, height))
    }

    // ── Validity ──────────────────────────────────────────────────────────────

    /// `true` iff every monitor is valid and no two monitors share an id.
    ///
    /// Advisory only: an invalid registry can still be edited and pushed.
    pub fn valid(&self) -> bool {
        validity::registry_is_valid(&self.monitors)
    }

    /// Every validity issue in the registry; empty iff [`Self::valid`].
    pub fn issues(&self) -> Vec<ValidityIssue> {
        validity::issues(&self.monitors)
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn position_by_query(&self, query: &str) -> Option<usize> {
        if let Ok(id) = query.parse::<Id>() {
            if let Some(index) = self.monitors.iter().position(|m| m.id == id) {
                return Some(index);
            }
        }

        self.monitors
            .iter()
            .position(|m| m.name.as_deref() == Some(query))
    }

    fn resolve_queries(&self, queries: &[impl AsRef<str>]) -> Vec<Id> {
        queries
            .iter()
            .filter_map(|q| self.find_id(q.as_ref()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a MonitorRegistry {
    type Item = &'a Monitor;
    type IntoIter = std::slice::Iter<'a, Monitor>;

    fn into_iter(self) -> Self::IntoIter {
        self.monitors.iter()
    }
}

impl IntoIterator for MonitorRegistry {
    type Item = Monitor;
    type IntoIter = std::vec::IntoIter<Monitor>;

    fn into_iter(self) -> Self::IntoIter {
        self.monitors.into_iter()
    }
}

impl FromIterator<Monitor> for MonitorRegistry {
    fn from_iter<I: IntoIterator<Item = Monitor>>(iter: I) -> Self {
        Self::from_monitors(iter.into_iter().collect())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn with_ids(ids: &[Id]) -> MonitorRegistry {
        ids.iter().map(|&id| Monitor::new(id)).collect()
    }

    fn ids(registry: &MonitorRegistry) -> Vec<Id> {
        registry.iter().map(|m| m.id).collect()
    }

    // ── new_id ────────────────────────────────────────────────────────────────

    #[test]
    fn test_new_id_on_empty_registry_is_zero() {
        assert_eq!(MonitorRegistry::new().new_id(None), Some(0));
    }

    #[test]
    fn test_new_id_returns_first_gap() {
        assert_eq!(with_ids(&[0, 1, 3]).new_id(None), Some(2));
    }

    #[test]
    fn test_new_id_returns_next_after_dense_ids() {
        assert_eq!(with_ids(&[2, 0, 1]).new_id(None), Some(3));
    }

    #[test]
    fn test_new_id_fills_gap_at_zero() {
        assert_eq!(with_ids(&[1, 2]).new_id(None), Some(0));
    }

    #[test]
    fn test_new_id_preferred_unused_is_returned() {
        assert_eq!(with_ids(&[0, 1]).new_id(Some(5)), Some(5));
    }

    #[test]
    fn test_new_id_preferred_taken_is_none() {
        assert_eq!(with_ids(&[0, 5]).new_id(Some(5)), None);
    }

    // ── lookup ────────────────────────────────────────────────────────────────

    #[test]
    fn test_find_monitor_returns_none_when_absent() {
        assert!(with_ids(&[0, 1]).find_monitor(9).is_none());
    }

    #[test]
    fn test_find_monitor_returns_first_of_duplicates() {
        let mut registry = MonitorRegistry::new();
        registry.push(Monitor::new(1).with_name("first"));
        registry.push(Monitor::new(1).with_name("second"));
        assert_eq!(
            registry.find_monitor(1).and_then(|m| m.name.as_deref()),
            Some("first")
        );
    }

    #[test]
    fn test_find_query_numeric_matches_id_first() {
        // Arrange: monitor 2 is named "1"; a query of "1" must hit id 1.
        let registry: MonitorRegistry = [
            Monitor::new(0).with_name("foo"),
            Monitor::new(2).with_name("1"),
            Monitor::new(1).with_name("bar"),
        ]
        .into_iter()
        .collect();

        // Act / Assert
        assert_eq!(registry.find_id("1"), Some(1));
        assert_eq!(registry.find_id("0"), Some(0));
    }

    #[test]
    fn test_find_query_numeric_without_id_match_falls_back_to_name() {
        let registry: MonitorRegistry =
            [Monitor::new(0), Monitor::new(4).with_name("7")].into_iter().collect();
        assert_eq!(registry.find_id("7"), Some(4));
    }

    #[test]
    fn test_find_query_non_numeric_matches_name() {
        let registry: MonitorRegistry =
            [Monitor::new(0).with_name("left"), Monitor::new(1).with_name("right")]
                .into_iter()
                .collect();
        assert_eq!(
            registry.find_monitor_query("right").map(|m| m.id),
            Some(1)
        );
    }

    #[test]
    fn test_find_query_name_match_is_case_sensitive() {
        let registry: MonitorRegistry =
            [Monitor::new(0).with_name("Left")].into_iter().collect();
        assert_eq!(registry.find_id("left"), None);
    }

    #[test]
    fn test_find_query_shared_name_returns_first_in_order() {
        let registry: MonitorRegistry = [
            Monitor::new(3).with_name("tv"),
            Monitor::new(1).with_name("tv"),
        ]
        .into_iter()
        .collect();
        assert_eq!(registry.find_id("tv"), Some(3));
    }

    #[test]
    fn test_find_query_returns_none_when_nothing_matches() {
        let registry: MonitorRegistry =
            [Monitor::new(0).with_name("foo")].into_iter().collect();
        assert_eq!(registry.find_id("baz"), None);
        assert_eq!(registry.find_id("42"), None);
        assert!(registry.find_monitor_query("baz").is_none());
    }

    #[test]
    fn test_find_monitor_query_mut_edits_in_place() {
        let mut registry: MonitorRegistry =
            [Monitor::new(0).with_name("desk")].into_iter().collect();
        registry
            .find_monitor_query_mut("desk")
            .expect("monitor present")
            .push_mode(Mode::new(1920, 1080, [60]));
        assert_eq!(registry.get(0).map(Monitor::mode_count), Some(1));
    }

    // ── bulk mutation ─────────────────────────────────────────────────────────

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut registry = with_ids(&[0, 1]);
        assert_eq!(registry.remove(&[7]), 0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_remove_skips_unknown_and_removes_known() {
        let mut registry = with_ids(&[0, 1, 2]);
        assert_eq!(registry.remove(&[2, 9, 0]), 2);
        assert_eq!(ids(&registry), vec![1]);
    }

    #[test]
    fn test_remove_takes_every_monitor_sharing_the_id() {
        let mut registry = with_ids(&[1, 0, 1]);
        assert_eq!(registry.remove(&[1]), 2);
        assert_eq!(ids(&registry), vec![0]);
    }

    #[test]
    fn test_remove_query_mixes_names_and_ids() {
        let mut registry: MonitorRegistry = [
            Monitor::new(0).with_name("a"),
            Monitor::new(1).with_name("b"),
            Monitor::new(2).with_name("c"),
        ]
        .into_iter()
        .collect();
        assert_eq!(registry.remove_query(&["a", "2", "missing"]), 2);
        assert_eq!(ids(&registry), vec![1]);
    }

    #[test]
    fn test_set_enabled_updates_matching_and_skips_unknown() {
        // Arrange
        let mut registry = with_ids(&[0, 1, 2]);

        // Act
        let updated = registry.set_enabled(&[0, 2, 5], false);

        // Assert
        assert_eq!(updated, 2);
        let enabled: Vec<bool> = registry.iter().map(|m| m.enabled).collect();
        assert_eq!(enabled, vec![false, true, false]);
    }

    #[test]
    fn test_set_enabled_query_uses_names() {
        let mut registry: MonitorRegistry = [
            Monitor::new(0).with_name("main"),
            Monitor::new(1).with_name("side"),
        ]
        .into_iter()
        .collect();
        assert_eq!(registry.set_enabled_query(&["side", "ghost"], false), 1);
        assert!(registry.find_monitor(0).is_some_and(|m| m.enabled));
        assert!(registry.find_monitor(1).is_some_and(|m| !m.enabled));
    }

    #[test]
    fn test_remove_where_and_remove_all() {
        let mut registry = with_ids(&[0, 1, 2, 3]);
        assert_eq!(registry.remove_where(|m| m.id % 2 == 1), 2);
        assert_eq!(ids(&registry), vec![0, 2]);
        registry.remove_all();
        assert!(registry.is_empty());
    }

    // ── per-monitor edits ─────────────────────────────────────────────────────

    #[test]
    fn test_replace_monitor_swaps_by_id_in_place() {
        // Arrange
        let mut registry = with_ids(&[0, 1, 2]);

        // Act
        let old = registry.replace_monitor(Monitor::new(1).with_name("swapped"));

        // Assert
        assert_eq!(old, Some(Monitor::new(1)));
        assert_eq!(ids(&registry), vec![0, 1, 2]);
        assert_eq!(registry.find_id("swapped"), Some(1));
    }

    #[test]
    fn test_replace_monitor_unknown_id_leaves_registry_alone() {
        let mut registry = with_ids(&[0]);
        assert_eq!(registry.replace_monitor(Monitor::new(4)), None);
        assert_eq!(registry, with_ids(&[0]));
    }

    #[test]
    fn test_add_mode_accepts_duplicate_resolution_and_flags_it() {
        // Arrange
        let mut registry: MonitorRegistry = [Monitor::new(0)
            .with_modes([Mode::new(1920, 1080, [60])])]
        .into_iter()
        .collect();
        assert!(registry.valid());

        // Act
        let added = registry.add_mode(0, Mode::new(1920, 1080, [144]));

        // Assert
        assert!(added);
        assert_eq!(registry.find_monitor(0).map(Monitor::mode_count), Some(2));
        assert!(!registry.valid());
    }

    #[test]
    fn test_add_mode_to_unknown_monitor_returns_false() {
        let mut registry = with_ids(&[0]);
        assert!(!registry.add_mode(3, Mode::new(800, 600, [60])));
        assert_eq!(registry.find_monitor(0).map(Monitor::mode_count), Some(0));
    }

    #[test]
    fn test_add_mode_query_resolves_name() {
        let mut registry: MonitorRegistry = [Monitor::new(5).with_name("side")]
            .into_iter()
            .collect();
        assert!(registry.add_mode_query("side", Mode::new(1280, 720, [60])));
        assert!(!registry.add_mode_query("ghost", Mode::new(1280, 720, [60])));
        assert_eq!(registry.find_monitor(5).map(Monitor::mode_count), Some(1));
    }

    #[test]
    fn test_remove_mode_counts_removed_modes() {
        // Arrange
        let mut registry: MonitorRegistry = [Monitor::new(0).with_modes([
            Mode::new(1920, 1080, [60]),
            Mode::new(1280, 720, [60]),
            Mode::new(1920, 1080, [120]),
        ])]
        .into_iter()
        .collect();

        // Act / Assert
        assert_eq!(registry.remove_mode(0, (1920, 1080)), Some(2));
        assert_eq!(registry.remove_mode(0, (640, 480)), Some(0));
        assert_eq!(registry.remove_mode(9, (1280, 720)), None);
        assert_eq!(registry.find_monitor(0).map(Monitor::mode_count), Some(1));
    }

    #[test]
    fn test_remove_mode_query_uses_name_or_id() {
        let mut registry: MonitorRegistry = [Monitor::new(2)
            .with_name("desk")
            .with_modes([Mode::new(2560, 1440, [144])])]
        .into_iter()
        .collect();
        assert_eq!(registry.remove_mode_query("missing", (2560, 1440)), None);
        assert_eq!(registry.remove_mode_query("desk", (2560, 1440)), Some(1));
        assert_eq!(registry.remove_mode_query("2", (2560, 1440)), Some(0));
    }

    // ── collection semantics ──────────────────────────────────────────────────

    #[test]
    fn test_indexed_set_and_remove_preserve_order() {
        let mut registry = with_ids(&[0, 1, 2]);
        assert_eq!(registry.set(1, Monitor::new(9)).map(|m| m.id), Some(1));
        assert_eq!(registry.remove_at(0).map(|m| m.id), Some(0));
        assert!(registry.set(5, Monitor::new(3)).is_none());
        assert!(registry.remove_at(5).is_none());
        assert_eq!(ids(&registry), vec![9, 2]);
    }

    #[test]
    fn test_replace_all_returns_previous_collection() {
        let mut registry = with_ids(&[0]);
        let old = registry.replace_all(vec![Monitor::new(4), Monitor::new(5)]);
        assert_eq!(old.len(), 1);
        assert_eq!(ids(&registry), vec![4, 5]);
    }

    // ── validity ──────────────────────────────────────────────────────────────

    #[test]
    fn test_valid_false_when_two_monitors_share_an_id() {
        let mut registry = with_ids(&[0, 1]);
        assert!(registry.valid());

        registry.get_mut(1).expect("second monitor").id = 0;

        assert!(!registry.valid());
        assert_eq!(registry.issues(), vec![ValidityIssue::DuplicateMonitorId { id: 0 }]);
    }

    #[test]
    fn test_valid_false_when_a_monitor_is_invalid() {
        let registry: MonitorRegistry =
            [Monitor::new(0).with_modes([Mode::new(1920, 1080, [])])]
                .into_iter()
                .collect();
        assert!(!registry.valid());
    }

    #[test]
    fn test_records_preserve_order_and_duplicates() {
        let registry = with_ids(&[3, 3, 1]);
        let restored = MonitorRegistry::from_records(registry.to_records());
        assert_eq!(restored, registry);
    }
}
