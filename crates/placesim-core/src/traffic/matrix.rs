use rustc_hash::FxHashMap;

use crate::network::types::ContainerId;

/// A sparse per-step traffic matrix keyed by ordered `(src, dst)` container
/// pairs. An absent entry means zero traffic. Entries are transient; the
/// owning generator fully replaces the matrix on every step.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TrafficMatrix {
    inner: FxHashMap<(ContainerId, ContainerId), f64>,
}

impl TrafficMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn get(&self, src: ContainerId, dst: ContainerId) -> f64 {
        self.inner.get(&(src, dst)).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, src: ContainerId, dst: ContainerId, volume: f64) {
        self.inner.insert((src, dst), volume);
    }

    /// Sets both directions to exactly `volume`, overwriting prior entries.
    pub fn set_symmetric(&mut self, a: ContainerId, b: ContainerId, volume: f64) {
        self.inner.insert((a, b), volume);
        self.inner.insert((b, a), volume);
    }

    pub fn add(&mut self, src: ContainerId, dst: ContainerId, volume: f64) {
        *self.inner.entry((src, dst)).or_insert(0.0) += volume;
    }

    /// Adds `volume` to both directions.
    pub fn add_symmetric(&mut self, a: ContainerId, b: ContainerId, volume: f64) {
        self.add(a, b, volume);
        self.add(b, a, volume);
    }

    /// Total volume flowing into `dst` from all sources.
    pub fn incoming_volume(&self, dst: ContainerId) -> f64 {
        self.inner
            .iter()
            .filter(|&(&(_, d), _)| d == dst)
            .map(|(_, &v)| v)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = ((ContainerId, ContainerId), f64)> + '_ {
        self.inner.iter().map(|(&pair, &v)| (pair, v))
    }

    delegate::delegate! {
        to self.inner {
            pub fn len(&self) -> usize;

            pub fn is_empty(&self) -> bool;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(i: usize) -> ContainerId {
        ContainerId::new(i)
    }

    #[test]
    fn absent_entry_is_zero() {
        let matrix = TrafficMatrix::new();
        assert_eq!(matrix.get(c(0), c(1)), 0.0);
        assert!(matrix.is_empty());
    }

    #[test]
    fn symmetric_set_writes_both_directions() {
        let mut matrix = TrafficMatrix::new();
        matrix.set_symmetric(c(0), c(1), 42.0);
        assert_eq!(matrix.get(c(0), c(1)), 42.0);
        assert_eq!(matrix.get(c(1), c(0)), 42.0);
        assert_eq!(matrix.len(), 2);
    }

    #[test]
    fn add_accumulates_within_a_step() {
        let mut matrix = TrafficMatrix::new();
        matrix.add_symmetric(c(0), c(1), 10.0);
        matrix.add_symmetric(c(0), c(1), 5.0);
        assert_eq!(matrix.get(c(0), c(1)), 15.0);
        assert_eq!(matrix.get(c(1), c(0)), 15.0);
    }

    #[test]
    fn incoming_volume_sums_all_sources() {
        let mut matrix = TrafficMatrix::new();
        matrix.set(c(0), c(2), 3.0);
        matrix.set(c(1), c(2), 4.0);
        matrix.set(c(2), c(0), 100.0);
        assert_eq!(matrix.incoming_volume(c(2)), 7.0);
    }
}
