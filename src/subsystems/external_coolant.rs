//! External coolant: the ammonia loop that carries collected heat to the
//! deployable radiator. A mix valve blends radiator return against bypass
//! flow to hold the output setpoint; a line heater backstops the valve when
//! the loop runs too cold with the valve already shut.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Mode, OperatingState, Snapshot, SubsystemId, SubsystemModel};
use crate::alerts::{Alert, AlertVec, BandMessages};
use crate::control::{MixValve, SweepCounter};
use crate::engine::EngineError;
use crate::limits::{AlertLevel, LimitBand};

/// Line pressure draw, kilopascals.
const LINE_PRESSURE_DRAW: core::ops::Range<f64> = 1500.0..3000.0;
/// Loop output temperature draw during circulation, degrees C.
const OUTPUT_TEMP_DRAW: core::ops::Range<f64> = 0.0..8.1;

const VALVE_MSGS: BandMessages = BandMessages {
    high_error: "radiator mix valve saturated fully open",
    high_warning: "radiator mix valve near fully open",
    low_error: "radiator mix valve saturated fully closed",
    low_warning: "radiator mix valve near fully closed",
};

const ROTATION_MSGS: BandMessages = BandMessages {
    high_error: "radiator rotation exceeds the positive travel stop",
    high_warning: "radiator rotation is near the positive travel stop",
    low_error: "radiator rotation exceeds the negative travel stop",
    low_warning: "radiator rotation is near the negative travel stop",
};

const LINE_PRESSURE_MSGS: BandMessages = BandMessages {
    high_error: "ammonia line pressure is above maximum",
    high_warning: "ammonia line pressure is elevated",
    low_error: "ammonia line pressure is below minimum",
    low_warning: "ammonia line pressure is low",
};

const OUTPUT_TEMP_MSGS: BandMessages = BandMessages {
    high_error: "coolant output temperature is above maximum",
    high_warning: "coolant output temperature is elevated",
    low_error: "coolant output temperature is below minimum",
    low_warning: "coolant output temperature is low",
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExternalCoolantSnapshot {
    pub report_tick: u64,
    pub status: OperatingState,
    pub mode: Mode,
    pub radiator_rotation_deg: f64,
    pub pump_a_on: bool,
    pub pump_b_on: bool,
    pub mix_valve: MixValve,
    pub line_a_kpa: f64,
    pub line_b_kpa: f64,
    pub line_heater_on: bool,
    pub radiator_deployed: bool,
    pub output_temp_c: f64,
    pub set_temp_c: f64,
}

impl Snapshot for ExternalCoolantSnapshot {
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
pub struct ExternalCoolantConfig {
    /// Loop output setpoint, degrees C.
    pub set_temp_c: f64,
    /// Radiator sweep travel and step, degrees.
    pub sweep_limit: f64,
    pub sweep_step: f64,
    /// Rotation alert band.
    pub rotation_hard_limit: f64,
    pub rotation_tolerance: f64,
    /// Valve travel per control pass and the saturation alert margin,
    /// percent of travel.
    pub valve_step: u8,
    pub valve_tolerance: f64,
    /// Ammonia line pressure band, kilopascals.
    pub pressure_min: f64,
    pub pressure_max: f64,
    pub pressure_tolerance: f64,
    /// Output temperature band, degrees C.
    pub output_min: f64,
    pub output_max: f64,
    pub output_tolerance: f64,
    /// Passive cooling per idle tick and the deep-cold floor, degrees C.
    pub standby_decay: f64,
    pub standby_floor: f64,
    /// One-in-N per-tick odds of each pump reading flipping. Distinct values
    /// so the pumps never fault in lockstep.
    pub pump_a_fault_odds: u32,
    pub pump_b_fault_odds: u32,
}

impl Default for ExternalCoolantConfig {
    fn default() -> Self {
        Self {
            set_temp_c: 2.8,
            sweep_limit: 205.0,
            sweep_step: 0.5,
            rotation_hard_limit: 215.0,
            rotation_tolerance: 10.0,
            valve_step: 1,
            valve_tolerance: 5.0,
            pressure_min: 345.0,
            pressure_max: 3309.0,
            pressure_tolerance: 827.0,
            output_min: 1.6,
            output_max: 8.1,
            output_tolerance: 2.0,
            standby_decay: 1.75,
            standby_floor: -120.0,
            pump_a_fault_odds: 10,
            pump_b_fault_odds: 12,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExternalCoolantOverride {
    SetPumpA(bool),
    SetPumpB(bool),
    SetMixValve(u8),
    SetLineHeater(bool),
    SetRadiatorDeployed(bool),
}

#[derive(Debug)]
pub struct ExternalCoolantLoop {
    config: ExternalCoolantConfig,
    sweep: SweepCounter,
    valve_band: LimitBand,
    rotation_band: LimitBand,
    pressure_band: LimitBand,
    output_band: LimitBand,
}

impl ExternalCoolantLoop {
    pub fn new(config: ExternalCoolantConfig) -> Result<Self, EngineError> {
        let sweep = SweepCounter::new(-config.sweep_limit, config.sweep_limit, config.sweep_step)?;
        let valve_band = LimitBand::new(0.0, 100.0, config.valve_tolerance)?;
        let rotation_band = LimitBand::new(
            -config.rotation_hard_limit,
            config.rotation_hard_limit,
            config.rotation_tolerance,
        )?;
        let pressure_band = LimitBand::new(
            config.pressure_min,
            config.pressure_max,
            config.pressure_tolerance,
        )?;
        let output_band =
            LimitBand::new(config.output_min, config.output_max, config.output_tolerance)?;
        if config.valve_step == 0 || config.valve_step > 100 {
            return Err(EngineError::Config("valve step must be within 1..=100"));
        }
        if config.pump_a_fault_odds == 0 || config.pump_b_fault_odds == 0 {
            return Err(EngineError::Config("pump fault odds must be at least 1"));
        }
        if config.standby_decay <= 0.0 {
            return Err(EngineError::Config("standby decay must be positive"));
        }
        if config.sweep_limit >= config.rotation_hard_limit {
            return Err(EngineError::Config(
                "sweep travel must stay inside the rotation hard limit",
            ));
        }
        Ok(Self {
            config,
            sweep,
            valve_band,
            rotation_band,
            pressure_band,
            output_band,
        })
    }

    pub fn config(&self) -> &ExternalCoolantConfig {
        &self.config
    }

    /// Crew-commanded transition between On and Standby. Ignored in any
    /// other state; leaving Trouble takes an explicit reset instead.
    pub fn toggle_standby(&self, snapshot: &mut ExternalCoolantSnapshot) {
        match snapshot.status {
            OperatingState::On => {
                snapshot.status = OperatingState::Standby;
                snapshot.pump_a_on = false;
                snapshot.pump_b_on = false;
                snapshot.line_heater_on = false;
            }
            OperatingState::Standby => {
                snapshot.status = OperatingState::On;
                snapshot.pump_a_on = true;
                snapshot.pump_b_on = true;
            }
            _ => {}
        }
    }

    fn is_circulating(status: OperatingState) -> bool {
        matches!(status, OperatingState::On | OperatingState::Processing)
    }
}

impl SubsystemModel for ExternalCoolantLoop {
    type Snapshot = ExternalCoolantSnapshot;
    type Override = ExternalCoolantOverride;

    const ID: SubsystemId = SubsystemId::ExternalCoolant;
    const RESET_STATE: OperatingState = OperatingState::On;

    fn seed(&self) -> ExternalCoolantSnapshot {
        ExternalCoolantSnapshot {
            report_tick: 0,
            status: OperatingState::On,
            mode: Mode::Automatic,
            radiator_rotation_deg: 0.0,
            pump_a_on: true,
            pump_b_on: true,
            mix_valve: MixValve::new(25, self.config.valve_step)
                .unwrap_or_else(|_| unreachable!("position and step are validated")),
            line_a_kpa: 2050.0,
            line_b_kpa: 2060.0,
            line_heater_on: false,
            radiator_deployed: true,
            output_temp_c: self.config.set_temp_c,
            set_temp_c: self.config.set_temp_c,
        }
    }

    fn generate(&mut self, snapshot: &mut ExternalCoolantSnapshot, rng: &mut StdRng) {
        snapshot.line_a_kpa = rng.gen_range(LINE_PRESSURE_DRAW);
        snapshot.line_b_kpa = rng.gen_range(LINE_PRESSURE_DRAW);

        if Self::is_circulating(snapshot.status) {
            snapshot.output_temp_c = rng.gen_range(OUTPUT_TEMP_DRAW);

            if rng.gen_range(0..self.config.pump_a_fault_odds) == 0 {
                snapshot.pump_a_on = !snapshot.pump_a_on;
            }
            if rng.gen_range(0..self.config.pump_b_fault_odds) == 0 {
                snapshot.pump_b_on = !snapshot.pump_b_on;
            }
        } else {
            // Stagnant ammonia radiates toward deep cold.
            snapshot.output_temp_c =
                (snapshot.output_temp_c - self.config.standby_decay).max(self.config.standby_floor);
        }
    }

    fn control(&mut self, snapshot: &mut ExternalCoolantSnapshot) {
        if !Self::is_circulating(snapshot.status) {
            return;
        }

        if !snapshot.pump_a_on && !snapshot.pump_b_on {
            snapshot.status = OperatingState::Trouble;
            snapshot.line_heater_on = false;
            return;
        }

        if snapshot.output_temp_c > snapshot.set_temp_c {
            // Shed the heater's contribution before sending more flow to
            // the radiator.
            if snapshot.line_heater_on {
                snapshot.line_heater_on = false;
            } else {
                snapshot.mix_valve.open();
            }
        } else if snapshot.output_temp_c < snapshot.set_temp_c {
            if snapshot.mix_valve.is_fully_closed() {
                snapshot.line_heater_on = true;
            } else {
                snapshot.mix_valve.close();
            }
        }

        if snapshot.radiator_deployed {
            self.sweep.advance();
            snapshot.radiator_rotation_deg = self.sweep.position();
        } else {
            snapshot.radiator_rotation_deg = 0.0;
            self.sweep.reset();
        }
    }

    fn alerts(&self, snapshot: &ExternalCoolantSnapshot) -> AlertVec {
        let mut out = AlertVec::new();

        let expect_pumps = snapshot.status != OperatingState::Standby;
        let pump_a = if snapshot.pump_a_on || !expect_pumps {
            Alert::nominal("pump_a_on")
        } else {
            Alert::new(
                "pump_a_on",
                "ammonia pump A is not running",
                AlertLevel::HighError,
            )
        };
        let _ = out.push(pump_a);

        let pump_b = if snapshot.pump_b_on || !expect_pumps {
            Alert::nominal("pump_b_on")
        } else {
            Alert::new(
                "pump_b_on",
                "ammonia pump B is not running",
                AlertLevel::HighError,
            )
        };
        let _ = out.push(pump_b);

        let valve = self
            .valve_band
            .classify(f64::from(snapshot.mix_valve.position()));
        let _ = out.push(Alert::graded("mix_valve", valve, &VALVE_MSGS));

        let deployed_alert = if snapshot.radiator_deployed {
            Alert::nominal("radiator_deployed")
        } else {
            Alert::new(
                "radiator_deployed",
                "radiator is stowed; loop has no heat rejection",
                AlertLevel::LowWarning,
            )
        };
        let _ = out.push(deployed_alert);

        let rotation = self.rotation_band.classify(snapshot.radiator_rotation_deg);
        let _ = out.push(Alert::graded(
            "radiator_rotation_deg",
            rotation,
            &ROTATION_MSGS,
        ));

        let line_a = self.pressure_band.classify(snapshot.line_a_kpa);
        let _ = out.push(Alert::graded("line_a_kpa", line_a, &LINE_PRESSURE_MSGS));

        let line_b = self.pressure_band.classify(snapshot.line_b_kpa);
        let _ = out.push(Alert::graded("line_b_kpa", line_b, &LINE_PRESSURE_MSGS));

        // Standby lets the loop drift cold on purpose; the output band only
        // applies while coolant is circulating.
        if Self::is_circulating(snapshot.status) {
            let output = self.output_band.classify(snapshot.output_temp_c);
            let _ = out.push(Alert::graded("output_temp_c", output, &OUTPUT_TEMP_MSGS));
        } else {
            let _ = out.push(Alert::nominal("output_temp_c"));
        }

        out
    }

    fn apply_override(
        &mut self,
        snapshot: &mut ExternalCoolantSnapshot,
        command: ExternalCoolantOverride,
    ) -> Result<(), EngineError> {
        match command {
            ExternalCoolantOverride::SetPumpA(on) => {
                snapshot.pump_a_on = on;
                Ok(())
            }
            ExternalCoolantOverride::SetPumpB(on) => {
                snapshot.pump_b_on = on;
                Ok(())
            }
            ExternalCoolantOverride::SetMixValve(position) => {
                snapshot.mix_valve.set_position(position)
            }
            ExternalCoolantOverride::SetLineHeater(on) => {
                snapshot.line_heater_on = on;
                Ok(())
            }
            ExternalCoolantOverride::SetRadiatorDeployed(deployed) => {
                snapshot.radiator_deployed = deployed;
                Ok(())
            }
        }
    }
}
