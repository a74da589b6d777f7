//! Internal coolant: two water loops (low temperature for avionics cold
//! plates, medium temperature for cabin heat exchangers) with a crossover
//! valve that lets one loop carry both heat loads when a pump goes down.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Mode, OperatingState, Snapshot, SubsystemId, SubsystemModel};
use crate::alerts::{Alert, AlertVec, BandMessages};
use crate::control::{MixValve, ResourcePair};
use crate::engine::EngineError;
use crate::limits::{AlertLevel, LimitBand};

/// Loop temperature draws during normal circulation, degrees C.
const LOW_LOOP_DRAW: core::ops::Range<f64> = 0.0..15.0;
const MED_LOOP_DRAW: core::ops::Range<f64> = 0.0..35.0;

const LOW_TEMP_MSGS: BandMessages = BandMessages {
    high_error: "low-temperature loop is above maximum",
    high_warning: "low-temperature loop is running warm",
    low_error: "low-temperature loop is below minimum",
    low_warning: "low-temperature loop is running cold",
};

const MED_TEMP_MSGS: BandMessages = BandMessages {
    high_error: "medium-temperature loop is above maximum",
    high_warning: "medium-temperature loop is running warm",
    low_error: "medium-temperature loop is below minimum",
    low_warning: "medium-temperature loop is running cold",
};

const VALVE_MSGS: BandMessages = BandMessages {
    high_error: "mix valve saturated fully open",
    high_warning: "mix valve near fully open",
    low_error: "mix valve saturated fully closed",
    low_warning: "mix valve near fully closed",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoolantLoop {
    LowTemp,
    MedTemp,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InternalCoolantSnapshot {
    pub report_tick: u64,
    pub status: OperatingState,
    pub mode: Mode,
    pub low_pump_on: bool,
    pub med_pump_on: bool,
    pub low_mix_valve: MixValve,
    pub med_mix_valve: MixValve,
    pub crossover_valve: MixValve,
    /// `None` during dual-loop operation; `Some` names which loop carries
    /// the combined load after a pump failure.
    pub single_loop: Option<ResourcePair<CoolantLoop>>,
    pub temp_low_c: f64,
    pub temp_med_c: f64,
    pub set_temp_low_c: f64,
    pub set_temp_med_c: f64,
}

impl Snapshot for InternalCoolantSnapshot {
    fn status(&self) -> OperatingState {
        self.status
    }

    fn set_status(&mut self, status: OperatingState) {
        self.status = status;
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn report_tick(&self) -> u64 {
        self.report_tick
    }

    fn set_report_tick(&mut self, tick: u64) {
        self.report_tick = tick;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InternalCoolantConfig {
    /// Loop setpoints, degrees C.
    pub set_temp_low_c: f64,
    pub set_temp_med_c: f64,
    /// Low loop alert band.
    pub low_hard_min: f64,
    pub low_hard_max: f64,
    pub low_ideal_min: f64,
    pub low_ideal_max: f64,
    pub low_tolerance: f64,
    /// Medium loop alert band.
    pub med_hard_min: f64,
    pub med_hard_max: f64,
    pub med_ideal_min: f64,
    pub med_ideal_max: f64,
    pub med_tolerance: f64,
    /// Valve travel per control pass and the saturation alert margin,
    /// percent of travel.
    pub valve_step: u8,
    pub valve_tolerance: f64,
    /// Crossover opening commanded when a loop takes the combined load.
    pub crossover_takeover_position: u8,
    /// One-in-N per-tick odds of each pump dropping out. Distinct values so
    /// the two loops never fail in lockstep.
    pub low_pump_fault_odds: u32,
    pub med_pump_fault_odds: u32,
    /// Heat soak per idle tick and its ceiling, degrees C.
    pub standby_creep: f64,
    pub standby_ceiling: f64,
}

impl Default for InternalCoolantConfig {
    fn default() -> Self {
        Self {
            set_temp_low_c: 4.0,
            set_temp_med_c: 10.5,
            low_hard_min: 0.0,
            low_hard_max: 20.0,
            low_ideal_min: 2.0,
            low_ideal_max: 10.0,
            low_tolerance: 2.0,
            med_hard_min: 0.0,
            med_hard_max: 35.0,
            med_ideal_min: 10.0,
            med_ideal_max: 27.0,
            med_tolerance: 5.0,
            valve_step: 1,
            valve_tolerance: 5.0,
            crossover_takeover_position: 40,
            low_pump_fault_odds: 10,
            med_pump_fault_odds: 12,
            standby_creep: 0.5,
            standby_ceiling: 60.0,
        }
    }
}

#[derive(Debug, Clone)]
pub enum InternalCoolantOverride {
    SetLowPump(bool),
    SetMedPump(bool),
    SetLowMixValve(u8),
    SetMedMixValve(u8),
    SetCrossoverValve(u8),
}

#[derive(Debug)]
pub struct InternalCoolantLoop {
    config: InternalCoolantConfig,
    low_temp_band: LimitBand,
    med_temp_band: LimitBand,
    valve_band: LimitBand,
}

impl InternalCoolantLoop {
    pub fn new(config: InternalCoolantConfig) -> Result<Self, EngineError> {
        let low_temp_band = LimitBand::with_ideal(
            config.low_hard_min,
            config.low_hard_max,
            config.low_ideal_min,
            config.low_ideal_max,
            config.low_tolerance,
        )?;
        let med_temp_band = LimitBand::with_ideal(
            config.med_hard_min,
            config.med_hard_max,
            config.med_ideal_min,
            config.med_ideal_max,
            config.med_tolerance,
        )?;
        let valve_band = LimitBand::new(0.0, 100.0, config.valve_tolerance)?;
        if config.valve_step == 0 || config.valve_step > 100 {
            return Err(EngineError::Config("valve step must be within 1..=100"));
        }
        if config.low_pump_fault_odds == 0 || config.med_pump_fault_odds == 0 {
            return Err(EngineError::Config("pump fault odds must be at least 1"));
        }
        if config.crossover_takeover_position > 100 {
            return Err(EngineError::Config(
                "crossover takeover position must be within 0..=100",
            ));
        }
        if config.standby_creep <= 0.0 {
            return Err(EngineError::Config("standby heat creep must be positive"));
        }
        Ok(Self {
            config,
            low_temp_band,
            med_temp_band,
            valve_band,
        })
    }

    pub fn config(&self) -> &InternalCoolantConfig {
        &self.config
    }

    /// Crew-commanded transition between On and Standby. Ignored in any
    /// other state; leaving Trouble takes an explicit reset instead.
    pub fn toggle_standby(&self, snapshot: &mut InternalCoolantSnapshot) {
        match snapshot.status {
            OperatingState::On => {
                snapshot.status = OperatingState::Standby;
                snapshot.low_pump_on = false;
                snapshot.med_pump_on = false;
            }
            OperatingState::Standby => {
                snapshot.status = OperatingState::On;
                snapshot.low_pump_on = true;
                snapshot.med_pump_on = true;
            }
            _ => {}
        }
    }

    fn step_valve(valve: &mut MixValve, temp: f64, setpoint: f64) {
        if temp > setpoint {
            valve.open();
        } else if temp < setpoint {
            valve.close();
        }
    }

    fn run_single_loop(&mut self, snapshot: &mut InternalCoolantSnapshot) {
        snapshot.status = OperatingState::Trouble;

        if !snapshot.low_pump_on && !snapshot.med_pump_on {
            return;
        }

        let (survivor, failed) = if snapshot.low_pump_on {
            (CoolantLoop::LowTemp, CoolantLoop::MedTemp)
        } else {
            (CoolantLoop::MedTemp, CoolantLoop::LowTemp)
        };

        match snapshot.single_loop.as_mut() {
            Some(pair) => pair.activate(survivor),
            None => match ResourcePair::new(survivor, failed) {
                Ok(pair) => snapshot.single_loop = Some(pair),
                Err(_) => return,
            },
        }

        if snapshot.crossover_valve.is_fully_closed() {
            // Takeover position is config-validated; the write cannot fail.
            let _ = snapshot
                .crossover_valve
                .set_position(self.config.crossover_takeover_position);
        }

        // One combined pass: the survivor's own valve chases its loop while
        // the crossover chases the orphaned load.
        let (survivor_valve, survivor_temp, survivor_set, failed_temp, failed_set) =
            match survivor {
                CoolantLoop::LowTemp => (
                    &mut snapshot.low_mix_valve,
                    snapshot.temp_low_c,
                    snapshot.set_temp_low_c,
                    snapshot.temp_med_c,
                    snapshot.set_temp_med_c,
                ),
                CoolantLoop::MedTemp => (
                    &mut snapshot.med_mix_valve,
                    snapshot.temp_med_c,
                    snapshot.set_temp_med_c,
                    snapshot.temp_low_c,
                    snapshot.set_temp_low_c,
                ),
            };
        Self::step_valve(survivor_valve, survivor_temp, survivor_set);
        Self::step_valve(&mut snapshot.crossover_valve, failed_temp, failed_set);
    }
}

impl SubsystemModel for InternalCoolantLoop {
    type Snapshot = InternalCoolantSnapshot;
    type Override = InternalCoolantOverride;

    const ID: SubsystemId = SubsystemId::InternalCoolant;
    const RESET_STATE: OperatingState = OperatingState::On;

    fn seed(&self) -> InternalCoolantSnapshot {
        InternalCoolantSnapshot {
            report_tick: 0,
            status: OperatingState::On,
            mode: Mode::Automatic,
            low_pump_on: true,
            med_pump_on: true,
            low_mix_valve: MixValve::new(15, self.config.valve_step)
                .unwrap_or_else(|_| unreachable!("position and step are validated")),
            med_mix_valve: MixValve::new(32, self.config.valve_step)
                .unwrap_or_else(|_| unreachable!("position and step are validated")),
            crossover_valve: MixValve::new(0, self.config.valve_step)
                .unwrap_or_else(|_| unreachable!("position and step are validated")),
            single_loop: None,
            temp_low_c: self.config.set_temp_low_c,
            temp_med_c: self.config.set_temp_med_c,
            set_temp_low_c: self.config.set_temp_low_c,
            set_temp_med_c: self.config.set_temp_med_c,
        }
    }

    fn generate(&mut self, snapshot: &mut InternalCoolantSnapshot, rng: &mut StdRng) {
        match snapshot.status {
            OperatingState::Standby | OperatingState::Trouble => {
                // Idle equipment heat-soaks the stagnant coolant.
                snapshot.temp_low_c =
                    (snapshot.temp_low_c + self.config.standby_creep).min(self.config.standby_ceiling);
                snapshot.temp_med_c =
                    (snapshot.temp_med_c + self.config.standby_creep).min(self.config.standby_ceiling);
            }
            _ => {
                snapshot.temp_low_c = rng.gen_range(LOW_LOOP_DRAW);
                snapshot.temp_med_c = rng.gen_range(MED_LOOP_DRAW);

                // Pump readings are re-drawn every circulation tick: a
                // dropout is transient and clears on a later draw, so a
                // reset subsystem can actually stay recovered.
                snapshot.low_pump_on = rng.gen_range(0..self.config.low_pump_fault_odds) != 0;
                snapshot.med_pump_on = rng.gen_range(0..self.config.med_pump_fault_odds) != 0;
            }
        }
    }

    fn control(&mut self, snapshot: &mut InternalCoolantSnapshot) {
        if snapshot.status != OperatingState::On {
            return;
        }

        if snapshot.low_pump_on && snapshot.med_pump_on {
            snapshot.single_loop = None;
            let _ = snapshot.crossover_valve.set_position(0);
            let low_temp = snapshot.temp_low_c;
            let low_set = snapshot.set_temp_low_c;
            Self::step_valve(&mut snapshot.low_mix_valve, low_temp, low_set);
            let med_temp = snapshot.temp_med_c;
            let med_set = snapshot.set_temp_med_c;
            Self::step_valve(&mut snapshot.med_mix_valve, med_temp, med_set);
        } else {
            self.run_single_loop(snapshot);
        }
    }

    fn alerts(&self, snapshot: &InternalCoolantSnapshot) -> AlertVec {
        let mut out = AlertVec::new();

        let low = self.low_temp_band.classify(snapshot.temp_low_c);
        let _ = out.push(Alert::graded("temp_low_c", low, &LOW_TEMP_MSGS));

        let med = self.med_temp_band.classify(snapshot.temp_med_c);
        let _ = out.push(Alert::graded("temp_med_c", med, &MED_TEMP_MSGS));

        let low_valve = self
            .valve_band
            .classify(f64::from(snapshot.low_mix_valve.position()));
        let _ = out.push(Alert::graded("low_mix_valve", low_valve, &VALVE_MSGS));

        let med_valve = self
            .valve_band
            .classify(f64::from(snapshot.med_mix_valve.position()));
        let _ = out.push(Alert::graded("med_mix_valve", med_valve, &VALVE_MSGS));

        // Fully closed is the commanded position in dual-loop operation;
        // the crossover is only graded once it is part of the flow path.
        if snapshot.single_loop.is_some() {
            let crossover = self
                .valve_band
                .classify(f64::from(snapshot.crossover_valve.position()));
            let _ = out.push(Alert::graded("crossover_valve", crossover, &VALVE_MSGS));
        } else {
            let _ = out.push(Alert::nominal("crossover_valve"));
        }

        // Pumps are commanded off in Standby; a stopped pump is only a
        // finding while the loops are supposed to be circulating.
        let expect_pumps = snapshot.status != OperatingState::Standby;
        let low_pump = if snapshot.low_pump_on || !expect_pumps {
            Alert::nominal("low_pump_on")
        } else {
            Alert::new(
                "low_pump_on",
                "low-temperature loop pump is not running",
                AlertLevel::HighError,
            )
        };
        let _ = out.push(low_pump);

        let med_pump = if snapshot.med_pump_on || !expect_pumps {
            Alert::nominal("med_pump_on")
        } else {
            Alert::new(
                "med_pump_on",
                "medium-temperature loop pump is not running",
                AlertLevel::HighError,
            )
        };
        let _ = out.push(med_pump);

        // Invariant rule: single-loop roles must be complementary.
        let roles_alert = match snapshot.single_loop {
            Some(pair) if pair.active() == pair.standby() => Alert::new(
                "single_loop",
                "single-loop roles name the same coolant loop",
                AlertLevel::HighError,
            ),
            _ => Alert::nominal("single_loop"),
        };
        let _ = out.push(roles_alert);

        out
    }

    fn apply_override(
        &mut self,
        snapshot: &mut InternalCoolantSnapshot,
        command: InternalCoolantOverride,
    ) -> Result<(), EngineError> {
        match command {
            InternalCoolantOverride::SetLowPump(on) => {
                snapshot.low_pump_on = on;
                Ok(())
            }
            InternalCoolantOverride::SetMedPump(on) => {
                snapshot.med_pump_on = on;
                Ok(())
            }
            InternalCoolantOverride::SetLowMixValve(position) => {
                snapshot.low_mix_valve.set_position(position)
            }
            InternalCoolantOverride::SetMedMixValve(position) => {
                snapshot.med_mix_valve.set_position(position)
            }
            InternalCoolantOverride::SetCrossoverValve(position) => {
                snapshot.crossover_valve.set_position(position)
            }
        }
    }
}
