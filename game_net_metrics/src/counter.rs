use std::fmt::{self, Display, Formatter};

/// A counter that accumulates within a single tick.
///
/// Counters are zeroed by the collection after every dispatch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct Counter(u64);

impl Counter {
    #[inline]
    pub const fn new() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn get(&self) -> u64 {
        self.0
    }

    #[inline]
    pub fn add(&mut self, val: u64) {
        self.0 = self.0.saturating_add(val);
    }

    #[inline]
    pub fn inc(&mut self) {
        self.add(1);
    }

    #[inline]
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

impl Display for Counter {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// An instantaneous value where the last write wins.
///
/// Unlike [`Counter`] a gauge keeps its value across ticks.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[repr(transparent)]
pub struct Gauge<T>(T);

impl<T> Gauge<T>
where
    T: Copy,
{
    #[inline]
    pub const fn new(val: T) -> Self {
        Self(val)
    }

    #[inline]
    pub fn get(&self) -> T {
        self.0
    }

    #[inline]
    pub fn set(&mut self, val: T) {
        self.0 = val;
    }
}

impl<T> Display for Gauge<T>
where
    T: Display,
{
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::{Counter, Gauge};

    #[test]
    fn counter_accumulates() {
        let mut counter = Counter::new();
        counter.add(100);
        counter.inc();
        assert_eq!(counter.get(), 101);

        counter.reset();
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn counter_saturates() {
        let mut counter = Counter::new();
        counter.add(u64::MAX);
        counter.inc();
        assert_eq!(counter.get(), u64::MAX);
    }

    #[test]
    fn gauge_overwrites() {
        let mut gauge = Gauge::new(0.0);
        gauge.set(0.25);
        gauge.set(0.5);
        assert_eq!(gauge.get(), 0.5);
    }
}
