pub mod co2_scrubber;
pub mod external_coolant;
pub mod internal_coolant;
pub mod power;
pub mod water_processor;

pub use co2_scrubber::{Bed, Co2Override, Co2Scrubber, Co2ScrubberConfig, Co2Snapshot};
pub use external_coolant::{
    ExternalCoolantConfig, ExternalCoolantLoop, ExternalCoolantOverride, ExternalCoolantSnapshot,
};
pub use internal_coolant::{
    CoolantLoop, InternalCoolantConfig, InternalCoolantLoop, InternalCoolantOverride,
    InternalCoolantSnapshot,
};
pub use power::{PowerConfig, PowerOverride, PowerSnapshot, PowerSystem, ShuntState};
pub use water_processor::{
    DiverterPosition, WaterOverride, WaterProcessor, WaterProcessorConfig, WaterSnapshot,
};

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::alerts::AlertVec;
use crate::engine::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubsystemId {
    Co2Scrubber,
    Power,
    WaterProcessor,
    InternalCoolant,
    ExternalCoolant,
}

/// Operating state of a subsystem. Each subsystem uses a declared subset and
/// its own transition table; `Trouble` is terminal until an external reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingState {
    Standby,
    On,
    Processing,
    Trouble,
}

/// In `Manual` mode the engine still simulates sensor readings but suppresses
/// all automatic control decisions and actuator writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Automatic,
    Manual,
}

/// Point-in-time value object for one subsystem. A snapshot is derived from
/// its predecessor by copy at the start of a tick and never mutated once
/// returned to the caller.
pub trait Snapshot: Clone + PartialEq + Serialize {
    fn status(&self) -> OperatingState;
    fn set_status(&mut self, status: OperatingState);
    fn mode(&self) -> Mode;
    fn set_mode(&mut self, mode: Mode);
    fn report_tick(&self) -> u64;
    fn set_report_tick(&mut self, tick: u64);
}

/// One subsystem's simulation callbacks. The model owns the configuration
/// and the control-logic counters (cycle timers, sweep positions) so that
/// independent instances never interfere; all measured state lives in the
/// snapshot.
pub trait SubsystemModel {
    type Snapshot: Snapshot;
    type Override: Clone;

    const ID: SubsystemId;
    /// State the subsystem returns to when trouble is externally cleared.
    const RESET_STATE: OperatingState;

    /// Fixed, documented initial state.
    fn seed(&self) -> Self::Snapshot;

    /// Draw this tick's raw sensor values. Runs in every mode and state;
    /// failure flips must come from draws separate from the value draws.
    fn generate(&mut self, snapshot: &mut Self::Snapshot, rng: &mut StdRng);

    /// Apply control decisions: actuator writes and state transitions.
    /// Only invoked in `Automatic` mode while not in `Trouble`.
    fn control(&mut self, snapshot: &mut Self::Snapshot);

    /// Grade every monitored field, in declared order, invariant rules last.
    /// Side-effect-free.
    fn alerts(&self, snapshot: &Self::Snapshot) -> AlertVec;

    /// Apply a manual actuator override. Mode gating happens in the engine;
    /// models only validate the command itself.
    fn apply_override(
        &mut self,
        snapshot: &mut Self::Snapshot,
        command: Self::Override,
    ) -> Result<(), EngineError>;
}
