//! Ripple simulation.
//!
//! A [`RippleBuffer`] owns a fixed ring of [`RIPPLE_CAPACITY`] ripples. Every
//! update ages all of them and, once a randomly chosen interval has elapsed,
//! overwrites the oldest slot with a freshly spawned ripple. Nothing is ever
//! removed: an old ripple fades out in the shader through its decay terms and
//! is eventually overwritten.
//!
//! # Example
//!
//! ```
//! use ripples_scene::ripple::RippleBuffer;
//!
//! let mut ripples = RippleBuffer::new(7);
//! for _ in 0..120 {
//!     ripples.update(1.0 / 60.0);
//! }
//! let slots = ripples.snapshot();
//! assert_eq!(slots.len(), 10);
//! ```

use std::ops::RangeInclusive;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::trace;

/// Number of ripple slots. Must match the array length in `ripple.frag`.
pub const RIPPLE_CAPACITY: usize = 10;

/// A single decaying wave.
///
/// Layout matches one element of the shader's `Ripple ripples[10]` array under
/// std140: `origin` and `age` share the first 16 bytes, the four scalars fill
/// the second 16.
///
/// | Field            | Offset | Size |
/// |------------------|--------|------|
/// | `origin`         | 0      | 12   |
/// | `age`            | 12     | 4    |
/// | `speed`          | 16     | 4    |
/// | `amplitude`      | 20     | 4    |
/// | `temporal_decay` | 24     | 4    |
/// | `spatial_decay`  | 28     | 4    |
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Ripple {
    /// Centre of the wave in quad space; `z` is always 0.
    pub origin: Vec3,
    /// Seconds since the ripple was spawned.
    pub age: f32,
    /// Propagation speed of the wave front.
    pub speed: f32,
    /// Peak displacement.
    pub amplitude: f32,
    /// Decay rate over time.
    pub temporal_decay: f32,
    /// Decay rate over distance from the wave front.
    pub spatial_decay: f32,
}

impl Ripple {
    /// Size in bytes of one ripple record.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Tunables for spawning ripples.
#[derive(Clone, Debug, PartialEq)]
pub struct RippleConfig {
    /// Range the time between two spawns is drawn from, in seconds.
    pub spawn_interval: RangeInclusive<f32>,
    pub speed: f32,
    pub amplitude: f32,
    pub temporal_decay: f32,
    pub spatial_decay: f32,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            spawn_interval: 0.1..=2.0,
            speed: 0.3,
            amplitude: 0.2,
            temporal_decay: 1.0,
            spatial_decay: 10.0,
        }
    }
}

/// Rejected [`RippleConfig`].
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid ripple config: {0}")]
pub struct InvalidRippleConfig(pub String);

impl RippleConfig {
    /// Checks that the spawn interval is a finite, non-negative, non-empty range.
    pub fn validate(&self) -> Result<(), InvalidRippleConfig> {
        let (lo, hi) = (*self.spawn_interval.start(), *self.spawn_interval.end());
        if !lo.is_finite() || !hi.is_finite() {
            return Err(InvalidRippleConfig(format!(
                "spawn interval {lo}..={hi} is not finite"
            )));
        }
        if lo < 0.0 {
            return Err(InvalidRippleConfig(format!(
                "spawn interval starts below zero ({lo})"
            )));
        }
        if lo > hi {
            return Err(InvalidRippleConfig(format!(
                "spawn interval {lo}..={hi} is empty"
            )));
        }
        Ok(())
    }
}

/// Fixed-capacity ring of ripples with a single write cursor.
///
/// The only way to change a slot's identity is [`spawn`](Self::spawn), which
/// overwrites exactly one slot and moves the cursor on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RippleRing {
    slots: [Ripple; RIPPLE_CAPACITY],
    next: usize,
}

impl RippleRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the slot under the cursor and returns its index.
    pub fn spawn(&mut self, ripple: Ripple) -> usize {
        let slot = self.next;
        self.slots[slot] = ripple;
        self.next = (self.next + 1) % RIPPLE_CAPACITY;
        slot
    }

    /// Visits every slot, occupied or not.
    pub fn for_each(&mut self, f: impl FnMut(&mut Ripple)) {
        self.slots.iter_mut().for_each(f);
    }

    #[inline]
    pub fn slots(&self) -> &[Ripple; RIPPLE_CAPACITY] {
        &self.slots
    }

    /// Index the next [`spawn`](Self::spawn) will write.
    #[inline]
    pub fn next_slot(&self) -> usize {
        self.next
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        RIPPLE_CAPACITY
    }
}

/// Record of one spawn, as returned by [`RippleBuffer::update`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnEvent {
    /// Slot that was overwritten.
    pub slot: usize,
    /// Origin of the new ripple.
    pub origin: Vec3,
    /// Interval drawn for the following spawn.
    pub next_interval: f32,
}

/// Ring of ripples plus the randomized spawn timer that feeds it.
#[derive(Clone, Debug)]
pub struct RippleBuffer {
    ring: RippleRing,
    time_since_last_spawn: f32,
    next_spawn_interval: f32,
    config: RippleConfig,
    rng: StdRng,
}

impl RippleBuffer {
    /// Creates a buffer with the default [`RippleConfig`].
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, RippleConfig::default())
    }

    /// Creates a buffer and draws the first spawn interval from `seed`.
    ///
    /// An invalid config falls back to the default one; call
    /// [`RippleConfig::validate`] first to reject it instead.
    pub fn with_config(seed: u64, config: RippleConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::warn!("{e}; using defaults");
                RippleConfig::default()
            }
        };

        let mut rng = StdRng::seed_from_u64(seed);
        let next_spawn_interval = rng.gen_range(config.spawn_interval.clone());

        Self {
            ring: RippleRing::new(),
            time_since_last_spawn: 0.0,
            next_spawn_interval,
            config,
            rng,
        }
    }

    /// Advances the simulation by `delta_time` seconds.
    ///
    /// Every slot ages by `delta_time`. If the accumulated time since the last
    /// spawn then exceeds the current interval, one ripple is spawned and a new
    /// interval is drawn. At most one spawn happens per call no matter how
    /// large `delta_time` is. Non-positive or non-finite steps do nothing.
    pub fn update(&mut self, delta_time: f32) -> Option<SpawnEvent> {
        if !(delta_time.is_finite() && delta_time > 0.0) {
            return None;
        }

        self.ring.for_each(|ripple| ripple.age += delta_time);
        self.time_since_last_spawn += delta_time;

        if self.time_since_last_spawn <= self.next_spawn_interval {
            return None;
        }

        let origin = self.random_origin();
        let slot = self.ring.spawn(Ripple {
            origin,
            age: 0.0,
            speed: self.config.speed,
            amplitude: self.config.amplitude,
            temporal_decay: self.config.temporal_decay,
            spatial_decay: self.config.spatial_decay,
        });
        self.time_since_last_spawn = 0.0;
        self.next_spawn_interval = self.rng.gen_range(self.config.spawn_interval.clone());

        trace!(
            slot,
            x = origin.x,
            y = origin.y,
            next = self.next_spawn_interval,
            "ripple spawned"
        );

        Some(SpawnEvent {
            slot,
            origin,
            next_interval: self.next_spawn_interval,
        })
    }

    /// Copy of all slots for the uniform payload.
    pub fn snapshot(&self) -> [Ripple; RIPPLE_CAPACITY] {
        *self.ring.slots()
    }

    pub fn slots(&self) -> &[Ripple; RIPPLE_CAPACITY] {
        self.ring.slots()
    }

    pub fn next_slot(&self) -> usize {
        self.ring.next_slot()
    }

    pub fn time_since_last_spawn(&self) -> f32 {
        self.time_since_last_spawn
    }

    pub fn next_spawn_interval(&self) -> f32 {
        self.next_spawn_interval
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn config(&self) -> &RippleConfig {
        &self.config
    }

    fn random_origin(&mut self) -> Vec3 {
        let x = self.rng.gen_range(-1.0f32..=1.0);
        let y = self.rng.gen_range(-1.0f32..=1.0);
        Vec3::new(x, y, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ripple_size() {
        assert_eq!(Ripple::SIZE, 32);
        assert_eq!(std::mem::align_of::<Ripple>(), 4);
    }

    #[test]
    fn test_default_ripple_is_inert() {
        let ripple = Ripple::default();
        assert_eq!(ripple.amplitude, 0.0);
        assert_eq!(ripple.age, 0.0);
    }

    #[test]
    fn test_ring_spawn_wraps() {
        let mut ring = RippleRing::new();
        for i in 0..RIPPLE_CAPACITY {
            assert_eq!(ring.spawn(Ripple::default()), i);
        }
        assert_eq!(ring.next_slot(), 0);
        assert_eq!(ring.spawn(Ripple::default()), 0);
        assert_eq!(ring.next_slot(), 1);
    }

    #[test]
    fn test_ring_spawn_touches_only_one_slot() {
        let mut ring = RippleRing::new();
        ring.for_each(|r| r.age = 3.0);

        let slot = ring.spawn(Ripple {
            amplitude: 1.0,
            ..Ripple::default()
        });

        for (i, ripple) in ring.slots().iter().enumerate() {
            if i == slot {
                assert_eq!(ripple.age, 0.0);
                assert_eq!(ripple.amplitude, 1.0);
            } else {
                assert_eq!(ripple.age, 3.0);
            }
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(RippleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_rejects_bad_intervals() {
        let inverted = RippleConfig {
            spawn_interval: 2.0..=1.0,
            ..RippleConfig::default()
        };
        assert!(inverted.validate().is_err());

        let infinite = RippleConfig {
            spawn_interval: 0.1..=f32::INFINITY,
            ..RippleConfig::default()
        };
        assert!(infinite.validate().is_err());

        let nan = RippleConfig {
            spawn_interval: f32::NAN..=1.0,
            ..RippleConfig::default()
        };
        assert!(nan.validate().is_err());

        let negative = RippleConfig {
            spawn_interval: -1.0..=1.0,
            ..RippleConfig::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_config_error_is_std_error() {
        let inverted = RippleConfig {
            spawn_interval: 2.0..=1.0,
            ..RippleConfig::default()
        };
        let err: Box<dyn std::error::Error> = Box::new(inverted.validate().unwrap_err());
        assert_eq!(
            err.to_string(),
            "invalid ripple config: spawn interval 2..=1 is empty"
        );
    }

    #[test]
    fn test_invalid_config_falls_back_to_default() {
        let buffer = RippleBuffer::with_config(
            1,
            RippleConfig {
                spawn_interval: 5.0..=1.0,
                ..RippleConfig::default()
            },
        );
        assert_eq!(buffer.config(), &RippleConfig::default());
    }

    #[test]
    fn test_degenerate_delta_is_ignored() {
        let mut buffer = RippleBuffer::new(3);
        let before = buffer.snapshot();

        for dt in [0.0, -1.0, f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            assert!(buffer.update(dt).is_none());
        }

        assert_eq!(buffer.snapshot(), before);
        assert_eq!(buffer.time_since_last_spawn(), 0.0);
    }

    #[test]
    fn test_spawned_ripple_uses_config() {
        let mut buffer = RippleBuffer::new(11);
        let event = buffer.update(10.0).unwrap();
        let ripple = buffer.slots()[event.slot];

        assert_eq!(ripple.origin, event.origin);
        assert_eq!(ripple.age, 0.0);
        assert_eq!(ripple.speed, 0.3);
        assert_eq!(ripple.amplitude, 0.2);
        assert_eq!(ripple.temporal_decay, 1.0);
        assert_eq!(ripple.spatial_decay, 10.0);
        assert_eq!(ripple.origin.z, 0.0);
        assert_eq!(event.next_interval, buffer.next_spawn_interval());
    }
}
