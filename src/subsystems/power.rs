//! Electrical power: solar array, shunt regulator, and battery bank. The
//! array sweeps to track the sun and the shunt switches the battery between
//! charge and discharge as array output crosses the charging threshold.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Mode, OperatingState, Snapshot, SubsystemId, SubsystemModel};
use crate::alerts::{Alert, AlertVec, BandMessages};
use crate::control::{PhaseCycle, SweepCounter};
use crate::engine::EngineError;
use crate::limits::{AlertLevel, LimitBand};

/// Array output draw in full sun, volts.
const SUNLIT_VOLTAGE_DRAW: core::ops::Range<f64> = 160.0..180.0;
/// Residual output draw in eclipse or with control handed over, volts.
const DARK_VOLTAGE_DRAW: core::ops::Range<f64> = 0.0..10.0;
/// Battery temperature draw, degrees C.
const BATTERY_TEMP_DRAW: core::ops::Range<f64> = -10.0..20.0;

const CHARGE_MSGS: BandMessages = BandMessages {
    high_error: "battery charge level is above maximum",
    high_warning: "battery charge level is high",
    low_error: "battery charge level is depleted",
    low_warning: "battery charge level is low",
};

const BATTERY_TEMP_MSGS: BandMessages = BandMessages {
    high_error: "battery temperature is above maximum",
    high_warning: "battery temperature is elevated",
    low_error: "battery temperature is below minimum",
    low_warning: "battery temperature is low",
};

const BATTERY_VOLTAGE_MSGS: BandMessages = BandMessages {
    high_error: "battery voltage is above maximum",
    high_warning: "battery voltage is elevated",
    low_error: "battery voltage is below minimum",
    low_warning: "battery voltage is low",
};

const ROTATION_MSGS: BandMessages = BandMessages {
    high_error: "solar array rotation exceeds the positive travel stop",
    high_warning: "solar array rotation is near the positive travel stop",
    low_error: "solar array rotation exceeds the negative travel stop",
    low_warning: "solar array rotation is near the negative travel stop",
};

/// Which way the shunt regulator routes array output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShuntState {
    Charge,
    Discharge,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerSnapshot {
    pub report_tick: u64,
    pub status: OperatingState,
    pub mode: Mode,
    pub shunt: ShuntState,
    pub solar_rotation_deg: f64,
    pub solar_deployed: bool,
    pub solar_voltage: f64,
    pub battery_temp_c: f64,
    pub battery_charge_pct: f64,
    pub battery_voltage: f64,
    pub in_eclipse: bool,
}

impl Snapshot for PowerSnapshot {
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
pub struct PowerConfig {
    /// Array voltage below which the battery carries the load.
    pub min_output_to_charge: f64,
    /// Charge-level change per tick while charging / discharging.
    pub charge_step: f64,
    pub drain_step: f64,
    /// Ticks per orbital day/night phase.
    pub eclipse_length: u32,
    /// Array sweep travel and step, degrees.
    pub sweep_limit: f64,
    pub sweep_step: f64,
    /// Hard travel stop for the rotation alert band.
    pub rotation_hard_limit: f64,
    pub rotation_tolerance: f64,
    /// Battery charge alert band, percent.
    pub charge_hard_max: f64,
    pub charge_ideal_min: f64,
    pub charge_ideal_max: f64,
    pub charge_tolerance: f64,
    /// Battery temperature band, degrees C; strictly outside it is Trouble.
    pub battery_temp_min: f64,
    pub battery_temp_max: f64,
    pub battery_temp_tolerance: f64,
    /// Battery voltage band, volts.
    pub battery_voltage_min: f64,
    pub battery_voltage_max: f64,
    pub battery_voltage_tolerance: f64,
    /// Array output alert ceiling, volts.
    pub solar_voltage_limit: f64,
    pub solar_voltage_tolerance: f64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            min_output_to_charge: 160.0,
            charge_step: 2.0,
            drain_step: 2.0,
            eclipse_length: 20,
            sweep_limit: 205.0,
            sweep_step: 1.0,
            rotation_hard_limit: 215.0,
            rotation_tolerance: 5.0,
            charge_hard_max: 105.0,
            charge_ideal_min: 50.0,
            charge_ideal_max: 95.0,
            charge_tolerance: 10.0,
            battery_temp_min: -10.0,
            battery_temp_max: 20.0,
            battery_temp_tolerance: 3.0,
            battery_voltage_min: 110.0,
            battery_voltage_max: 160.0,
            battery_voltage_tolerance: 10.0,
            solar_voltage_limit: 180.0,
            solar_voltage_tolerance: 10.0,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PowerOverride {
    SetShunt(ShuntState),
    SetSolarDeployed(bool),
    SetBatteryCharge(f64),
}

#[derive(Debug)]
pub struct PowerSystem {
    config: PowerConfig,
    eclipse: PhaseCycle,
    sweep: SweepCounter,
    charge_band: LimitBand,
    battery_temp_band: LimitBand,
    battery_voltage_band: LimitBand,
    rotation_band: LimitBand,
}

impl PowerSystem {
    pub fn new(config: PowerConfig) -> Result<Self, EngineError> {
        let eclipse = PhaseCycle::new(config.eclipse_length)?;
        let sweep = SweepCounter::new(-config.sweep_limit, config.sweep_limit, config.sweep_step)?;
        let charge_band = LimitBand::with_ideal(
            0.0,
            config.charge_hard_max,
            config.charge_ideal_min,
            config.charge_ideal_max,
            config.charge_tolerance,
        )?;
        let battery_temp_band = LimitBand::new(
            config.battery_temp_min,
            config.battery_temp_max,
            config.battery_temp_tolerance,
        )?;
        let battery_voltage_band = LimitBand::new(
            config.battery_voltage_min,
            config.battery_voltage_max,
            config.battery_voltage_tolerance,
        )?;
        let rotation_band = LimitBand::with_ideal(
            -config.rotation_hard_limit,
            config.rotation_hard_limit,
            -config.sweep_limit,
            config.sweep_limit,
            config.rotation_tolerance,
        )?;
        if config.min_output_to_charge <= 0.0 {
            return Err(EngineError::Config("charging threshold must be positive"));
        }
        if config.charge_step <= 0.0 || config.drain_step <= 0.0 {
            return Err(EngineError::Config("charge and drain steps must be positive"));
        }
        Ok(Self {
            config,
            eclipse,
            sweep,
            charge_band,
            battery_temp_band,
            battery_voltage_band,
            rotation_band,
        })
    }

    pub fn config(&self) -> &PowerConfig {
        &self.config
    }
}

impl SubsystemModel for PowerSystem {
    type Snapshot = PowerSnapshot;
    type Override = PowerOverride;

    const ID: SubsystemId = SubsystemId::Power;
    const RESET_STATE: OperatingState = OperatingState::On;

    fn seed(&self) -> PowerSnapshot {
        PowerSnapshot {
            report_tick: 0,
            status: OperatingState::On,
            mode: Mode::Automatic,
            shunt: ShuntState::Charge,
            solar_rotation_deg: 0.0,
            solar_deployed: true,
            solar_voltage: 172.0,
            battery_temp_c: 8.0,
            battery_charge_pct: 85.0,
            battery_voltage: 126.0,
            in_eclipse: false,
        }
    }

    fn generate(&mut self, snapshot: &mut PowerSnapshot, rng: &mut StdRng) {
        // Orbital day/night runs off its own counter, not the RNG.
        self.eclipse.advance();
        snapshot.in_eclipse = self.eclipse.in_phase();

        snapshot.solar_voltage = if !snapshot.solar_deployed {
            0.0
        } else if snapshot.in_eclipse || snapshot.mode == Mode::Manual {
            rng.gen_range(DARK_VOLTAGE_DRAW)
        } else {
            rng.gen_range(SUNLIT_VOLTAGE_DRAW)
        };

        snapshot.battery_voltage = if snapshot.battery_charge_pct > 40.0 {
            rng.gen_range(90.0..170.0)
        } else if snapshot.battery_charge_pct > 20.0 {
            rng.gen_range(70.0..140.0)
        } else {
            rng.gen_range(40.0..110.0)
        };

        snapshot.battery_temp_c = rng.gen_range(BATTERY_TEMP_DRAW);
    }

    fn control(&mut self, snapshot: &mut PowerSnapshot) {
        // Strictly outside the temperature band, not merely at a bound:
        // the generation draw touches both bounds in normal operation.
        if snapshot.battery_temp_c > self.config.battery_temp_max
            || snapshot.battery_temp_c < self.config.battery_temp_min
        {
            snapshot.status = OperatingState::Trouble;
            return;
        }

        if snapshot.solar_voltage < self.config.min_output_to_charge {
            snapshot.shunt = ShuntState::Discharge;
            snapshot.battery_charge_pct =
                (snapshot.battery_charge_pct - self.config.drain_step).max(0.0);
        } else {
            snapshot.shunt = ShuntState::Charge;
            snapshot.battery_charge_pct =
                (snapshot.battery_charge_pct + self.config.charge_step).min(100.0);
        }

        self.sweep.advance();
        snapshot.solar_rotation_deg = self.sweep.position();
    }

    fn alerts(&self, snapshot: &PowerSnapshot) -> AlertVec {
        let mut out = AlertVec::new();

        let charge = self.charge_band.classify(snapshot.battery_charge_pct);
        let _ = out.push(Alert::graded("battery_charge_pct", charge, &CHARGE_MSGS));

        let temp = self.battery_temp_band.classify(snapshot.battery_temp_c);
        let _ = out.push(Alert::graded("battery_temp_c", temp, &BATTERY_TEMP_MSGS));

        let voltage = self.battery_voltage_band.classify(snapshot.battery_voltage);
        let _ = out.push(Alert::graded(
            "battery_voltage",
            voltage,
            &BATTERY_VOLTAGE_MSGS,
        ));

        let rotation = self.rotation_band.classify(snapshot.solar_rotation_deg);
        let _ = out.push(Alert::graded("solar_rotation_deg", rotation, &ROTATION_MSGS));

        // No lower bound: zero output is the expected reading in eclipse or
        // with the array stowed.
        let solar_alert = if snapshot.solar_voltage >= self.config.solar_voltage_limit {
            Alert::new(
                "solar_voltage",
                "solar array output is above maximum",
                AlertLevel::HighError,
            )
        } else if snapshot.solar_voltage
            >= self.config.solar_voltage_limit - self.config.solar_voltage_tolerance
        {
            Alert::new(
                "solar_voltage",
                "solar array output is elevated",
                AlertLevel::HighWarning,
            )
        } else {
            Alert::nominal("solar_voltage")
        };
        let _ = out.push(solar_alert);

        out
    }

    fn apply_override(
        &mut self,
        snapshot: &mut PowerSnapshot,
        command: PowerOverride,
    ) -> Result<(), EngineError> {
        match command {
            PowerOverride::SetShunt(state) => {
                snapshot.shunt = state;
                Ok(())
            }
            PowerOverride::SetSolarDeployed(deployed) => {
                snapshot.solar_deployed = deployed;
                if !deployed {
                    snapshot.solar_voltage = 0.0;
                }
                Ok(())
            }
            PowerOverride::SetBatteryCharge(pct) => {
                if !(0.0..=100.0).contains(&pct) {
                    return Err(EngineError::InvalidOperation(
                        "battery charge must be within 0..=100 percent",
                    ));
                }
                snapshot.battery_charge_pct = pct;
                Ok(())
            }
        }
    }
}
