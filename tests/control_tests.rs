use habsim::control::{
    CycleTimer, MixValve, PhaseCycle, ResourcePair, SweepCounter, VALVE_FULLY_CLOSED,
    VALVE_FULLY_OPEN,
};
use habsim::engine::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    A,
    B,
}

#[test]
fn test_resource_pair_rejects_identical_roles() {
    assert!(matches!(
        ResourcePair::new(Side::A, Side::A),
        Err(EngineError::InvalidOperation(_))
    ));
}

#[test]
fn test_resource_pair_roles_stay_complementary() {
    let mut pair = ResourcePair::new(Side::A, Side::B).unwrap();
    assert_eq!(pair.active(), Side::A);
    assert_eq!(pair.standby(), Side::B);

    // Complementarity holds through any number of swaps
    for _ in 0..7 {
        pair.swap();
        assert_ne!(pair.active(), pair.standby());
    }
    assert_eq!(pair.active(), Side::B);
}

#[test]
fn test_resource_pair_activate() {
    let mut pair = ResourcePair::new(Side::A, Side::B).unwrap();

    pair.activate(Side::B);
    assert!(pair.is_active(Side::B));
    assert_eq!(pair.standby(), Side::A);

    // Activating the already-active side is a no-op
    pair.activate(Side::B);
    assert!(pair.is_active(Side::B));
    assert_eq!(pair.standby(), Side::A);
}

#[test]
fn test_mix_valve_clamps_at_both_ends() {
    let mut valve = MixValve::new(98, 5).unwrap();

    valve.open();
    assert_eq!(valve.position(), VALVE_FULLY_OPEN);
    valve.open();
    assert_eq!(valve.position(), VALVE_FULLY_OPEN);
    assert!(valve.is_fully_open());

    for _ in 0..25 {
        valve.close();
    }
    assert_eq!(valve.position(), VALVE_FULLY_CLOSED);
    valve.close();
    assert!(valve.is_fully_closed());
}

#[test]
fn test_mix_valve_position_never_leaves_range() {
    let mut valve = MixValve::new(50, 7).unwrap();

    // Arbitrary open/close churn stays within 0..=100
    for i in 0..200 {
        if i % 3 == 0 {
            valve.close();
        } else {
            valve.open();
        }
        assert!(valve.position() <= VALVE_FULLY_OPEN);
    }
}

#[test]
fn test_mix_valve_rejects_invalid_construction_and_writes() {
    assert!(MixValve::new(101, 1).is_err());
    assert!(MixValve::new(50, 0).is_err());

    let mut valve = MixValve::new(50, 1).unwrap();
    assert!(matches!(
        valve.set_position(101),
        Err(EngineError::InvalidOperation(_))
    ));
    assert_eq!(valve.position(), 50);
    valve.set_position(0).unwrap();
    assert!(valve.is_fully_closed());
}

#[test]
fn test_sweep_counter_ping_pongs_between_bounds() {
    let mut sweep = SweepCounter::new(-2.0, 2.0, 1.0).unwrap();
    let mut positions = Vec::new();

    for _ in 0..12 {
        sweep.advance();
        positions.push(sweep.position());
    }

    // Climbs to the bound, holds one tick while reversing, then descends
    assert_eq!(
        positions,
        vec![1.0, 2.0, 2.0, 1.0, 0.0, -1.0, -2.0, -2.0, -1.0, 0.0, 1.0, 2.0]
    );
}

#[test]
fn test_sweep_counter_never_exceeds_bounds() {
    let mut sweep = SweepCounter::new(-205.0, 205.0, 1.0).unwrap();

    for _ in 0..1000 {
        sweep.advance();
        assert!(sweep.position() >= -205.0);
        assert!(sweep.position() <= 205.0);
    }
}

#[test]
fn test_sweep_counter_reset() {
    let mut sweep = SweepCounter::new(-10.0, 10.0, 1.0).unwrap();
    for _ in 0..15 {
        sweep.advance();
    }

    sweep.reset();
    assert_eq!(sweep.position(), 0.0);
    assert!(sweep.is_increasing());
}

#[test]
fn test_phase_cycle_flips_after_countdown() {
    let mut cycle = PhaseCycle::new(2).unwrap();
    assert!(!cycle.in_phase());

    cycle.advance();
    cycle.advance();
    assert!(!cycle.in_phase());

    // Countdown exhausted: the next advance flips the phase
    cycle.advance();
    assert!(cycle.in_phase());

    cycle.advance();
    cycle.advance();
    cycle.advance();
    assert!(!cycle.in_phase());
}

#[test]
fn test_cycle_timer_expiry_and_reset() {
    let mut timer = CycleTimer::new(3).unwrap();
    assert!(!timer.expired());

    timer.tick();
    timer.tick();
    assert!(!timer.expired());

    timer.tick();
    assert!(timer.expired());
    assert_eq!(timer.count(), 3);

    timer.reset();
    assert_eq!(timer.count(), 0);
    assert!(!timer.expired());
}

#[test]
fn test_counter_constructors_reject_zero_lengths() {
    assert!(PhaseCycle::new(0).is_err());
    assert!(CycleTimer::new(0).is_err());
    assert!(SweepCounter::new(5.0, 5.0, 1.0).is_err());
    assert!(SweepCounter::new(-5.0, 5.0, 0.0).is_err());
}
