//! Station coordinator: one engine and one latest snapshot per subsystem,
//! advanced in lockstep and reported as a single serializable record per
//! tick. Subsystems share nothing; each engine draws from its own stream
//! seeded at a fixed offset from the master seed.

use serde::{Deserialize, Serialize};

use crate::alerts::AlertVec;
use crate::engine::{Engine, EngineError};
use crate::limits::AlertLevel;
use crate::subsystems::{
    Co2Override, Co2Scrubber, Co2ScrubberConfig, Co2Snapshot, ExternalCoolantConfig,
    ExternalCoolantLoop, ExternalCoolantOverride, ExternalCoolantSnapshot, InternalCoolantConfig,
    InternalCoolantLoop, InternalCoolantOverride, InternalCoolantSnapshot, Mode, PowerConfig,
    PowerOverride, PowerSnapshot, PowerSystem, Snapshot, SubsystemId, SubsystemModel,
    WaterOverride, WaterProcessor, WaterProcessorConfig, WaterSnapshot,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    pub seed: u64,
    pub co2_scrubber: Co2ScrubberConfig,
    pub power: PowerConfig,
    pub water_processor: WaterProcessorConfig,
    pub internal_coolant: InternalCoolantConfig,
    pub external_coolant: ExternalCoolantConfig,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            co2_scrubber: Co2ScrubberConfig::default(),
            power: PowerConfig::default(),
            water_processor: WaterProcessorConfig::default(),
            internal_coolant: InternalCoolantConfig::default(),
            external_coolant: ExternalCoolantConfig::default(),
        }
    }
}

/// One subsystem's contribution to a tick report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsystemReport<S> {
    pub snapshot: S,
    pub alerts: AlertVec,
}

impl<S> SubsystemReport<S> {
    pub fn worst_level(&self) -> AlertLevel {
        self.alerts
            .iter()
            .map(|alert| alert.level)
            .max()
            .unwrap_or(AlertLevel::Nominal)
    }
}

/// Everything the station produced in one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationReport {
    pub tick: u64,
    pub co2_scrubber: SubsystemReport<Co2Snapshot>,
    pub power: SubsystemReport<PowerSnapshot>,
    pub water_processor: SubsystemReport<WaterSnapshot>,
    pub internal_coolant: SubsystemReport<InternalCoolantSnapshot>,
    pub external_coolant: SubsystemReport<ExternalCoolantSnapshot>,
}

impl StationReport {
    /// Most severe grade across every subsystem this tick.
    pub fn worst_level(&self) -> AlertLevel {
        self.co2_scrubber
            .worst_level()
            .max(self.power.worst_level())
            .max(self.water_processor.worst_level())
            .max(self.internal_coolant.worst_level())
            .max(self.external_coolant.worst_level())
    }
}

/// Engine, latest snapshot, and commanded mode for one subsystem.
struct Unit<M: SubsystemModel> {
    engine: Engine<M>,
    snapshot: M::Snapshot,
    mode: Mode,
}

impl<M: SubsystemModel> Unit<M> {
    fn new(model: M, seed: u64) -> Self {
        let engine = Engine::new(model, seed);
        let snapshot = engine.seed_snapshot();
        Self {
            engine,
            snapshot,
            mode: Mode::Automatic,
        }
    }

    fn tick(&mut self) -> SubsystemReport<M::Snapshot> {
        let (snapshot, alerts) = self.engine.tick(&self.snapshot, self.mode);
        self.snapshot = snapshot.clone();
        SubsystemReport { snapshot, alerts }
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        // Stamped immediately so overrides are accepted without waiting a
        // tick for the engine to restamp.
        self.snapshot.set_mode(mode);
    }
}

pub struct Station {
    tick: u64,
    co2_scrubber: Unit<Co2Scrubber>,
    power: Unit<PowerSystem>,
    water_processor: Unit<WaterProcessor>,
    internal_coolant: Unit<InternalCoolantLoop>,
    external_coolant: Unit<ExternalCoolantLoop>,
}

impl Station {
    pub fn new(config: StationConfig) -> Result<Self, EngineError> {
        let seed = config.seed;
        Ok(Self {
            tick: 0,
            co2_scrubber: Unit::new(Co2Scrubber::new(config.co2_scrubber)?, seed),
            power: Unit::new(PowerSystem::new(config.power)?, seed.wrapping_add(1)),
            water_processor: Unit::new(
                WaterProcessor::new(config.water_processor)?,
                seed.wrapping_add(2),
            ),
            internal_coolant: Unit::new(
                InternalCoolantLoop::new(config.internal_coolant)?,
                seed.wrapping_add(3),
            ),
            external_coolant: Unit::new(
                ExternalCoolantLoop::new(config.external_coolant)?,
                seed.wrapping_add(4),
            ),
        })
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance every subsystem one step and collect the results.
    pub fn tick_all(&mut self) -> StationReport {
        self.tick += 1;
        StationReport {
            tick: self.tick,
            co2_scrubber: self.co2_scrubber.tick(),
            power: self.power.tick(),
            water_processor: self.water_processor.tick(),
            internal_coolant: self.internal_coolant.tick(),
            external_coolant: self.external_coolant.tick(),
        }
    }

    pub fn mode(&self, id: SubsystemId) -> Mode {
        match id {
            SubsystemId::Co2Scrubber => self.co2_scrubber.mode,
            SubsystemId::Power => self.power.mode,
            SubsystemId::WaterProcessor => self.water_processor.mode,
            SubsystemId::InternalCoolant => self.internal_coolant.mode,
            SubsystemId::ExternalCoolant => self.external_coolant.mode,
        }
    }

    pub fn set_mode(&mut self, id: SubsystemId, mode: Mode) {
        match id {
            SubsystemId::Co2Scrubber => self.co2_scrubber.set_mode(mode),
            SubsystemId::Power => self.power.set_mode(mode),
            SubsystemId::WaterProcessor => self.water_processor.set_mode(mode),
            SubsystemId::InternalCoolant => self.internal_coolant.set_mode(mode),
            SubsystemId::ExternalCoolant => self.external_coolant.set_mode(mode),
        }
    }

    pub fn reset_trouble(&mut self, id: SubsystemId) {
        match id {
            SubsystemId::Co2Scrubber => self
                .co2_scrubber
                .engine
                .reset_trouble(&mut self.co2_scrubber.snapshot),
            SubsystemId::Power => self.power.engine.reset_trouble(&mut self.power.snapshot),
            SubsystemId::WaterProcessor => self
                .water_processor
                .engine
                .reset_trouble(&mut self.water_processor.snapshot),
            SubsystemId::InternalCoolant => self
                .internal_coolant
                .engine
                .reset_trouble(&mut self.internal_coolant.snapshot),
            SubsystemId::ExternalCoolant => self
                .external_coolant
                .engine
                .reset_trouble(&mut self.external_coolant.snapshot),
        }
    }

    /// Crew departure or arrival; widens or narrows the CO2 intake draw
    /// ceiling on the scrubber model.
    pub fn set_crewed(&mut self, crewed: bool) {
        self.co2_scrubber.engine.model_mut().set_crewed(crewed);
    }

    pub fn toggle_internal_coolant_standby(&mut self) {
        self.internal_coolant
            .engine
            .model()
            .toggle_standby(&mut self.internal_coolant.snapshot);
    }

    pub fn toggle_external_coolant_standby(&mut self) {
        self.external_coolant
            .engine
            .model()
            .toggle_standby(&mut self.external_coolant.snapshot);
    }

    pub fn co2_snapshot(&self) -> &Co2Snapshot {
        &self.co2_scrubber.snapshot
    }

    pub fn power_snapshot(&self) -> &PowerSnapshot {
        &self.power.snapshot
    }

    pub fn water_snapshot(&self) -> &WaterSnapshot {
        &self.water_processor.snapshot
    }

    pub fn internal_coolant_snapshot(&self) -> &InternalCoolantSnapshot {
        &self.internal_coolant.snapshot
    }

    pub fn external_coolant_snapshot(&self) -> &ExternalCoolantSnapshot {
        &self.external_coolant.snapshot
    }

    pub fn override_co2(&mut self, command: Co2Override) -> Result<(), EngineError> {
        self.co2_scrubber
            .engine
            .set_manual(&mut self.co2_scrubber.snapshot, command)
    }

    pub fn override_power(&mut self, command: PowerOverride) -> Result<(), EngineError> {
        self.power.engine.set_manual(&mut self.power.snapshot, command)
    }

    pub fn override_water(&mut self, command: WaterOverride) -> Result<(), EngineError> {
        self.water_processor
            .engine
            .set_manual(&mut self.water_processor.snapshot, command)
    }

    pub fn override_internal_coolant(
        &mut self,
        command: InternalCoolantOverride,
    ) -> Result<(), EngineError> {
        self.internal_coolant
            .engine
            .set_manual(&mut self.internal_coolant.snapshot, command)
    }

    pub fn override_external_coolant(
        &mut self,
        command: ExternalCoolantOverride,
    ) -> Result<(), EngineError> {
        self.external_coolant
            .engine
            .set_manual(&mut self.external_coolant.snapshot, command)
    }
}
