use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::alerts::AlertVec;
use crate::subsystems::{Mode, OperatingState, Snapshot, SubsystemModel};

/// Failures a caller can see. Out-of-range sensor data is never an error —
/// reporting it is what the alert list is for. `Trouble` is an operating
/// state communicated through snapshots, not an error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Limit-band or counter invariants violated at construction. Fatal:
    /// rejected before the first tick.
    #[error("invalid configuration: {0}")]
    Config(&'static str),

    /// Manual override attempted while not in manual mode. No mutation
    /// occurred.
    #[error("manual override rejected while in {0:?} mode")]
    ManualOverrideRejected(Mode),

    /// A requested operation is not valid for the current state. No mutation
    /// occurred.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
}

/// Per-subsystem simulation driver: owns the model and a seeded random
/// source, and runs the generate → control → evaluate sequence once per
/// tick.
///
/// A tick is a bounded, synchronous, pure computation; given equal seeds and
/// mode sequences two engines produce identical snapshot and alert streams.
/// Engines are independent — tick separate instances from separate tasks
/// freely, but never share one instance for concurrent mutation.
#[derive(Debug)]
pub struct Engine<M: SubsystemModel> {
    model: M,
    rng: StdRng,
    tick_count: u64,
}

impl<M: SubsystemModel> Engine<M> {
    pub fn new(model: M, seed: u64) -> Self {
        Self {
            model,
            rng: StdRng::seed_from_u64(seed),
            tick_count: 0,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// The subsystem's fixed initial state.
    pub fn seed_snapshot(&self) -> M::Snapshot {
        self.model.seed()
    }

    /// Advance one simulation step: copy the previous snapshot, stamp it,
    /// draw telemetry, run control (Automatic mode only, never while in
    /// Trouble), and grade the result.
    ///
    /// The previous snapshot stays with the caller; the engine retains
    /// nothing of it.
    pub fn tick(&mut self, previous: &M::Snapshot, mode: Mode) -> (M::Snapshot, AlertVec) {
        let mut snapshot = previous.clone();
        self.tick_count += 1;
        snapshot.set_report_tick(self.tick_count);
        snapshot.set_mode(mode);

        self.model.generate(&mut snapshot, &mut self.rng);

        if mode == Mode::Automatic && snapshot.status() != OperatingState::Trouble {
            let before = snapshot.status();
            self.model.control(&mut snapshot);
            let after = snapshot.status();
            if after != before {
                if after == OperatingState::Trouble {
                    warn!(subsystem = ?M::ID, from = ?before, "subsystem latched trouble");
                } else {
                    debug!(subsystem = ?M::ID, from = ?before, to = ?after, "state transition");
                }
            }
        }

        let alerts = self.model.alerts(&snapshot);
        (snapshot, alerts)
    }

    /// Recompute the alert list for a snapshot without advancing anything.
    pub fn evaluate(&self, snapshot: &M::Snapshot) -> AlertVec {
        self.model.alerts(snapshot)
    }

    /// Apply a manual actuator override. Permitted only while the snapshot
    /// is in manual mode; otherwise rejected with no mutation.
    pub fn set_manual(
        &mut self,
        snapshot: &mut M::Snapshot,
        command: M::Override,
    ) -> Result<(), EngineError> {
        if snapshot.mode() != Mode::Manual {
            return Err(EngineError::ManualOverrideRejected(snapshot.mode()));
        }
        self.model.apply_override(snapshot, command)
    }

    /// The only exit from `Trouble`: an explicit external reset back to the
    /// subsystem's declared reset state. No-op in any other state.
    pub fn reset_trouble(&self, snapshot: &mut M::Snapshot) {
        if snapshot.status() == OperatingState::Trouble {
            debug!(subsystem = ?M::ID, to = ?M::RESET_STATE, "trouble cleared by external reset");
            snapshot.set_status(M::RESET_STATE);
        }
    }
}
