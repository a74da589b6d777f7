//! Control-logic building blocks shared by the subsystem models: the
//! complementary-role resource pair, bounded proportional valves, and the
//! counters that stand in for environmental cycles and timers.

use serde::Serialize;

use crate::engine::EngineError;

/// Two interchangeable physical resources (zeolite beds, coolant loops)
/// where exactly one is active and the other is standby.
///
/// Complementarity is structural: construction rejects identical ids and
/// [`ResourcePair::swap`] is the only role mutation, so `active != standby`
/// holds for every reachable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourcePair<Id> {
    active: Id,
    standby: Id,
}

impl<Id: Copy + PartialEq> ResourcePair<Id> {
    pub fn new(active: Id, standby: Id) -> Result<Self, EngineError> {
        if active == standby {
            return Err(EngineError::InvalidOperation(
                "resource pair roles must name distinct resources",
            ));
        }
        Ok(Self { active, standby })
    }

    pub fn active(&self) -> Id {
        self.active
    }

    pub fn standby(&self) -> Id {
        self.standby
    }

    pub fn is_active(&self, id: Id) -> bool {
        self.active == id
    }

    /// Exchange the roles.
    pub fn swap(&mut self) {
        core::mem::swap(&mut self.active, &mut self.standby);
    }

    /// Make `id` the active slot; no-op when it already is.
    pub fn activate(&mut self, id: Id) {
        if self.standby == id {
            self.swap();
        }
    }
}

pub const VALVE_FULLY_CLOSED: u8 = 0;
pub const VALVE_FULLY_OPEN: u8 = 100;

/// Proportional mixing valve: a bounded 0..=100 position moved by a fixed
/// step per tick, clamping at the bounds rather than wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MixValve {
    position: u8,
    step: u8,
}

impl MixValve {
    pub fn new(position: u8, step: u8) -> Result<Self, EngineError> {
        if position > VALVE_FULLY_OPEN {
            return Err(EngineError::Config("valve position must be within 0..=100"));
        }
        if step == 0 || step > VALVE_FULLY_OPEN {
            return Err(EngineError::Config("valve step must be within 1..=100"));
        }
        Ok(Self { position, step })
    }

    pub fn position(&self) -> u8 {
        self.position
    }

    /// Step toward fully open, clamping at 100.
    pub fn open(&mut self) {
        self.position = self.position.saturating_add(self.step).min(VALVE_FULLY_OPEN);
    }

    /// Step toward fully closed, clamping at 0.
    pub fn close(&mut self) {
        self.position = self.position.saturating_sub(self.step);
    }

    pub fn set_position(&mut self, position: u8) -> Result<(), EngineError> {
        if position > VALVE_FULLY_OPEN {
            return Err(EngineError::InvalidOperation(
                "valve position must be within 0..=100",
            ));
        }
        self.position = position;
        Ok(())
    }

    pub fn is_fully_open(&self) -> bool {
        self.position == VALVE_FULLY_OPEN
    }

    pub fn is_fully_closed(&self) -> bool {
        self.position == VALVE_FULLY_CLOSED
    }
}

/// Ping-pong counter for rotation sweeps (solar array, radiator): the
/// position walks between the bounds by a fixed step and reverses direction
/// at each bound. The reversal tick holds position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepCounter {
    position: f64,
    min: f64,
    max: f64,
    step: f64,
    increasing: bool,
}

impl SweepCounter {
    pub fn new(min: f64, max: f64, step: f64) -> Result<Self, EngineError> {
        if min >= max {
            return Err(EngineError::Config("sweep range must satisfy min < max"));
        }
        if step <= 0.0 {
            return Err(EngineError::Config("sweep step must be positive"));
        }
        Ok(Self {
            position: 0.0,
            min,
            max,
            step,
            increasing: true,
        })
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_increasing(&self) -> bool {
        self.increasing
    }

    pub fn advance(&mut self) {
        if self.increasing && self.position < self.max {
            self.position += self.step;
        } else if !self.increasing && self.position > self.min {
            self.position -= self.step;
        } else {
            self.increasing = !self.increasing;
        }
    }

    /// Return to the neutral position, sweeping upward again.
    pub fn reset(&mut self) {
        self.position = 0.0;
        self.increasing = true;
    }
}

/// Two-phase cycle counter for environmental phenomena (orbital day/night).
/// A countdown flips the phase every `length + 1` advances; no randomness
/// is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseCycle {
    remaining: u32,
    length: u32,
    phase: bool,
}

impl PhaseCycle {
    pub fn new(length: u32) -> Result<Self, EngineError> {
        if length == 0 {
            return Err(EngineError::Config("phase cycle length must be at least 1"));
        }
        Ok(Self {
            remaining: length,
            length,
            phase: false,
        })
    }

    /// True while in the alternate phase (eclipse).
    pub fn in_phase(&self) -> bool {
        self.phase
    }

    pub fn advance(&mut self) {
        if self.remaining == 0 {
            self.phase = !self.phase;
            self.remaining = self.length;
        } else {
            self.remaining -= 1;
        }
    }
}

/// Elapsed-tick timer for resource alternation (bed regeneration cycles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleTimer {
    count: u32,
    length: u32,
}

impl CycleTimer {
    pub fn new(length: u32) -> Result<Self, EngineError> {
        if length == 0 {
            return Err(EngineError::Config("cycle length must be at least 1"));
        }
        Ok(Self { count: 0, length })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn expired(&self) -> bool {
        self.count >= self.length
    }

    pub fn tick(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}
