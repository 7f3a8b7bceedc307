//! Refresh-rate collection owned by a single [`crate::Mode`].
//!
//! Refresh rates are conceptually a set: adding a rate that is already present
//! is a silent no-op.  Unlike a `BTreeSet`, the order of first insertion is
//! kept, because that is the order the driver and any UI list them in.

use crate::RefreshRate;

/// Ordered, duplicate-free sequence of refresh rates.
///
/// No operation rejects a value because of its magnitude; emptiness is only
/// reported by [`RefreshRateSet::valid`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RefreshRateSet {
    rates: Vec<RefreshRate>,
}

impl RefreshRateSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rates in the set.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Returns `true` if the set holds no rates.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Returns `true` if `rate` is in the set.
    pub fn contains(&self, rate: RefreshRate) -> bool {
        self.rates.contains(&rate)
    }

    /// Returns the rate at `index`, if any.
    pub fn get(&self, index: usize) -> Option<RefreshRate> {
        self.rates.get(index).copied()
    }

    /// Appends `rate` unless it is already present.
    ///
    /// Returns `true` if the set grew.
    pub fn push(&mut self, rate: RefreshRate) -> bool {
        if self.contains(rate) {
            return false;
        }
        self.rates.push(rate);
        true
    }

    /// Appends every rate in `rates`, skipping duplicates.
    ///
    /// Returns how many rates were actually added.
    pub fn push_many(&mut self, rates: impl IntoIterator<Item = RefreshRate>) -> usize {
        rates.into_iter().filter(|&rate| self.push(rate)).count()
    }

    /// Removes and returns the rate at `index`.
    ///
    /// Returns `None` (and changes nothing) if `index` is out of bounds.
    pub fn remove(&mut self, index: usize) -> Option<RefreshRate> {
        if index < self.rates.len() {
            Some(self.rates.remove(index))
        } else {
            None
        }
    }

    /// Replaces the rate at `index` with `rate`, returning the previous value.
    ///
    /// Returns `None` without changing anything if `index` is out of bounds or
    /// if `rate` is already stored at a different index.
    pub fn set(&mut self, index: usize, rate: RefreshRate) -> Option<RefreshRate> {
        let duplicate_elsewhere = self
            .rates
            .iter()
            .enumerate()
            .any(|(i, &r)| i != index && r == rate);
        if duplicate_elsewhere {
            return None;
        }

        let slot = self.rates.get_mut(index)?;
        Some(std::mem::replace(slot, rate))
    }

    /// Replaces the whole content, coalescing duplicates in `rates`.
    pub fn replace_all(&mut self, rates: impl IntoIterator<Item = RefreshRate>) {
        self.rates.clear();
        self.push_many(rates);
    }

    /// Removes every rate.
    pub fn clear(&mut self) {
        self.rates.clear();
    }

    /// Iterates rates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = RefreshRate> + '_ {
        self.rates.iter().copied()
    }

    /// Borrows the rates as a slice, in insertion order.
    pub fn as_slice(&self) -> &[RefreshRate] {
        &self.rates
    }

    /// Consumes the set and returns its rates in insertion order.
    pub fn into_vec(self) -> Vec<RefreshRate> {
        self.rates
    }

    /// A rate set is valid when it is not empty.
    pub fn valid(&self) -> bool {
        !self.is_empty()
    }
}

impl FromIterator<RefreshRate> for RefreshRateSet {
    fn from_iter<I: IntoIterator<Item = RefreshRate>>(iter: I) -> Self {
        let mut set = Self::new();
        set.push_many(iter);
        set
    }
}

impl Extend<RefreshRate> for RefreshRateSet {
    fn extend<I: IntoIterator<Item = RefreshRate>>(&mut self, iter: I) {
        self.push_many(iter);
    }
}

impl From<Vec<RefreshRate>> for RefreshRateSet {
    fn from(rates: Vec<RefreshRate>) -> Self {
        rates.into_iter().collect()
    }
}

impl<const N: usize> From<[RefreshRate; N]> for RefreshRateSet {
    fn from(rates: [RefreshRate; N]) -> Self {
        rates.into_iter().collect()
    }
}
