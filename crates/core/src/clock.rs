//! Frame clock.
//!
//! [`Clock`] samples a [`TimeSource`] once per frame in [`Clock::advance`] and
//! caches the result, so every reader in the same frame sees the same time.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// A source of "now", in seconds since some fixed origin.
pub trait TimeSource {
    fn now_secs(&self) -> f64;
}

/// Monotonic time source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicSource {
    origin: Instant,
}

impl MonotonicSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicSource {
    fn now_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Frame clock exposing elapsed and delta time.
///
/// Time never runs backward: if the source reports a value earlier than the
/// last sample, the clock holds its previous "now" and reports a zero delta.
#[derive(Debug)]
pub struct Clock<S: TimeSource = MonotonicSource> {
    source: S,
    start: f64,
    now: f64,
    delta: f64,
}

impl Clock<MonotonicSource> {
    /// Create a clock on the monotonic system source, starting from now.
    pub fn new() -> Self {
        Self::with_source(MonotonicSource::new())
    }
}

impl Default for Clock<MonotonicSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TimeSource> Clock<S> {
    /// Create a clock reading from `source`. The first sample becomes the start time.
    pub fn with_source(source: S) -> Self {
        let start = source.now_secs();
        Self {
            source,
            start,
            now: start,
            delta: 0.0,
        }
    }

    /// Sample the time source and update elapsed and delta time.
    pub fn advance(&mut self) {
        let sample = self.source.now_secs();
        let next = sample.max(self.now);
        self.delta = next - self.now;
        self.now = next;
    }

    /// Seconds between construction and the most recent [`advance`](Self::advance).
    pub fn elapsed_since_start(&self) -> f32 {
        (self.now - self.start) as f32
    }

    /// Seconds between the two most recent calls to [`advance`](Self::advance).
    pub fn delta_since_last_advance(&self) -> f32 {
        self.delta as f32
    }
}

/// Derive a PRNG seed from the wall clock.
pub fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[derive(Clone)]
    struct ManualSource(Rc<Cell<f64>>);

    impl TimeSource for ManualSource {
        fn now_secs(&self) -> f64 {
            self.0.get()
        }
    }

    fn manual_clock(start: f64) -> (Clock<ManualSource>, Rc<Cell<f64>>) {
        let time = Rc::new(Cell::new(start));
        (Clock::with_source(ManualSource(time.clone())), time)
    }

    #[test]
    fn test_new_clock_reports_zero() {
        let (clock, _) = manual_clock(10.0);
        assert_eq!(clock.elapsed_since_start(), 0.0);
        assert_eq!(clock.delta_since_last_advance(), 0.0);
    }

    #[test]
    fn test_advance_updates_elapsed_and_delta() {
        let (mut clock, time) = manual_clock(1.0);

        time.set(1.25);
        clock.advance();
        assert_eq!(clock.delta_since_last_advance(), 0.25);
        assert_eq!(clock.elapsed_since_start(), 0.25);

        time.set(2.0);
        clock.advance();
        assert_eq!(clock.delta_since_last_advance(), 0.75);
        assert_eq!(clock.elapsed_since_start(), 1.0);
    }

    #[test]
    fn test_readers_are_pure_between_advances() {
        let (mut clock, time) = manual_clock(0.0);
        time.set(0.5);
        clock.advance();

        time.set(3.0);
        assert_eq!(clock.delta_since_last_advance(), 0.5);
        assert_eq!(clock.elapsed_since_start(), 0.5);
    }

    #[test]
    fn test_backward_source_clamps_delta() {
        let (mut clock, time) = manual_clock(5.0);
        time.set(6.0);
        clock.advance();

        time.set(4.0);
        clock.advance();
        assert_eq!(clock.delta_since_last_advance(), 0.0);
        assert_eq!(clock.elapsed_since_start(), 1.0);

        // Catching up to the old "now" still reports no time passing.
        time.set(6.0);
        clock.advance();
        assert_eq!(clock.delta_since_last_advance(), 0.0);

        time.set(6.5);
        clock.advance();
        assert_eq!(clock.delta_since_last_advance(), 0.5);
    }

    #[test]
    fn test_monotonic_clock_never_negative() {
        let mut clock = Clock::new();
        for _ in 0..100 {
            clock.advance();
            assert!(clock.delta_since_last_advance() >= 0.0);
        }
        assert!(clock.elapsed_since_start() >= 0.0);
    }

    #[test]
    fn test_seeds_differ_over_time() {
        let a = time_seed();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = time_seed();
        assert_ne!(a, b);
    }
}
