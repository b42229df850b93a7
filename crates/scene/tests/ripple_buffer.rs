//! Behavioural tests for the ripple spawn/aging algorithm.

use ripples_scene::ripple::{RIPPLE_CAPACITY, RippleBuffer, RippleConfig, SpawnEvent};

const EPS: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() <= EPS * b.abs().max(1.0)
}

/// Deterministic pseudo-random step sizes, large enough to cover both the
/// "no spawn" and "overshoot" cases.
fn steps(count: usize) -> Vec<f32> {
    let mut state = 0x2545_f491_u32;
    (0..count)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            0.001 + (state % 3000) as f32 / 1000.0
        })
        .collect()
}

fn fixed_interval(seconds: f32) -> RippleConfig {
    RippleConfig {
        spawn_interval: seconds..=seconds,
        ..RippleConfig::default()
    }
}

#[test]
fn capacity_and_cursor_stay_in_bounds() {
    let mut buffer = RippleBuffer::new(1);
    for dt in steps(500) {
        buffer.update(dt);
        assert_eq!(buffer.snapshot().len(), RIPPLE_CAPACITY);
        assert_eq!(buffer.capacity(), RIPPLE_CAPACITY);
        assert!(buffer.next_slot() < RIPPLE_CAPACITY);
    }
}

#[test]
fn age_is_sum_of_steps_since_spawn() {
    let mut buffer = RippleBuffer::new(2);
    let mut expected = [0.0f64; RIPPLE_CAPACITY];

    for dt in steps(300) {
        let event = buffer.update(dt);
        for age in expected.iter_mut() {
            *age += dt as f64;
        }
        if let Some(SpawnEvent { slot, .. }) = event {
            expected[slot] = 0.0;
        }

        for (ripple, want) in buffer.slots().iter().zip(expected) {
            let tolerance = 1e-3 * want.max(1.0);
            assert!(
                (ripple.age as f64 - want).abs() <= tolerance,
                "age {} drifted from {}",
                ripple.age,
                want
            );
        }
    }
}

#[test]
fn at_most_one_spawn_per_update() {
    let mut buffer = RippleBuffer::new(3);
    // Warm up so every slot has a non-zero age.
    for _ in 0..50 {
        buffer.update(0.5);
    }

    for dt in [0.01, 0.5, 5.0, 1_000.0] {
        buffer.update(dt);
        let reset = buffer.slots().iter().filter(|r| r.age == 0.0).count();
        assert!(reset <= 1, "{reset} slots reset by update({dt})");
    }
}

#[test]
fn huge_step_spawns_exactly_once() {
    let mut buffer = RippleBuffer::new(4);
    let before = buffer.next_slot();

    assert!(buffer.update(10_000.0).is_some());
    assert_eq!(buffer.next_slot(), (before + 1) % RIPPLE_CAPACITY);
    assert_eq!(buffer.time_since_last_spawn(), 0.0);
}

#[test]
fn spawn_intervals_stay_in_default_range() {
    let config = RippleConfig::default();
    let (lo, hi) = (*config.spawn_interval.start(), *config.spawn_interval.end());

    for seed in 0..50 {
        let mut buffer = RippleBuffer::new(seed);
        assert!((lo..=hi).contains(&buffer.next_spawn_interval()));

        for _ in 0..40 {
            if let Some(event) = buffer.update(2.5) {
                assert!((lo..=hi).contains(&event.next_interval));
                assert_eq!(event.next_interval, buffer.next_spawn_interval());
            }
        }
    }
}

#[test]
fn spawn_intervals_follow_custom_range() {
    let config = RippleConfig {
        spawn_interval: 0.25..=0.75,
        ..RippleConfig::default()
    };
    let mut buffer = RippleBuffer::with_config(9, config);

    for _ in 0..200 {
        buffer.update(1.0);
        let interval = buffer.next_spawn_interval();
        assert!((0.25..=0.75).contains(&interval));
    }
}

#[test]
fn origins_lie_in_unit_square() {
    let mut buffer = RippleBuffer::new(5);
    for _ in 0..500 {
        if let Some(event) = buffer.update(3.0) {
            assert!((-1.0..=1.0).contains(&event.origin.x));
            assert!((-1.0..=1.0).contains(&event.origin.y));
            assert_eq!(event.origin.z, 0.0);
        }
    }
}

#[test]
fn same_seed_same_spawns() {
    let mut a = RippleBuffer::new(0xdead_beef);
    let mut b = RippleBuffer::new(0xdead_beef);
    assert_eq!(a.next_spawn_interval(), b.next_spawn_interval());

    let mut spawned = 0;
    for (i, dt) in steps(400).into_iter().enumerate() {
        let ea = a.update(dt);
        let eb = b.update(dt);
        assert_eq!(ea, eb, "diverged at step {i}");
        spawned += usize::from(ea.is_some());
    }

    assert!(spawned > 0);
    assert_eq!(a.snapshot(), b.snapshot());
}

#[test]
fn different_seeds_diverge() {
    let mut a = RippleBuffer::new(1);
    let mut b = RippleBuffer::new(2);

    let origins = |buffer: &mut RippleBuffer| {
        (0..20)
            .filter_map(|_| buffer.update(2.5).map(|e| e.origin))
            .collect::<Vec<_>>()
    };

    assert_ne!(origins(&mut a), origins(&mut b));
}

#[test]
fn two_step_scenario() {
    let mut buffer = RippleBuffer::with_config(42, fixed_interval(0.5));
    assert_eq!(buffer.next_spawn_interval(), 0.5);
    assert_eq!(buffer.next_slot(), 0);

    // 0.3 < 0.5: everything ages, nothing spawns.
    assert!(buffer.update(0.3).is_none());
    assert!(buffer.slots().iter().all(|r| approx(r.age, 0.3)));
    assert!(approx(buffer.time_since_last_spawn(), 0.3));
    assert_eq!(buffer.next_slot(), 0);

    // 0.6 > 0.5: slot 0 is overwritten, the rest keep aging.
    let event = buffer.update(0.3).expect("second step should spawn");
    assert_eq!(event.slot, 0);
    assert_eq!(buffer.time_since_last_spawn(), 0.0);
    assert_eq!(buffer.next_spawn_interval(), 0.5);
    assert_eq!(buffer.next_slot(), 1);

    let slots = buffer.slots();
    assert_eq!(slots[0].age, 0.0);
    assert_eq!(slots[0].amplitude, 0.2);
    for ripple in &slots[1..] {
        assert!(approx(ripple.age, 0.6));
        assert_eq!(ripple.amplitude, 0.0);
    }
}

#[test]
fn spawn_requires_strictly_exceeding_interval() {
    let mut buffer = RippleBuffer::with_config(7, fixed_interval(0.5));
    assert!(buffer.update(0.5).is_none());
    assert!(buffer.update(0.001).is_some());
}

#[test]
fn slots_fill_in_order_then_wrap() {
    let mut buffer = RippleBuffer::with_config(8, fixed_interval(0.1));
    let slots: Vec<usize> = (0..25)
        .filter_map(|_| buffer.update(0.2).map(|e| e.slot))
        .collect();

    let expected: Vec<usize> = (0..25).map(|i| i % RIPPLE_CAPACITY).collect();
    assert_eq!(slots, expected);
}
