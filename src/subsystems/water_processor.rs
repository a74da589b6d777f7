//! Water reclamation: waste water is pumped through filter beds, a catalytic
//! reactor, and a post-heater; product that passes the quality check is
//! diverted to the product tank, the rest goes back around for another pass.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Mode, OperatingState, Snapshot, SubsystemId, SubsystemModel};
use crate::alerts::{Alert, AlertVec, BandMessages};
use crate::engine::EngineError;
use crate::limits::{AlertLevel, LimitBand};

/// Post-heater outlet draw while processing, degrees C.
const POST_HEATER_DRAW: core::ops::Range<f64> = 120.0..130.0;
/// Cabin-ambient outlet reading while the heater is off.
const AMBIENT_TEMP_C: f64 = 19.0;

const POST_HEATER_MSGS: BandMessages = BandMessages {
    high_error: "post-heater water temperature is above maximum",
    high_warning: "post-heater water temperature is elevated",
    low_error: "post-heater water temperature is below minimum",
    low_warning: "post-heater water temperature is low",
};

/// Where product-side flow is routed after the quality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiverterPosition {
    Reprocess,
    ProductTank,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaterSnapshot {
    pub report_tick: u64,
    pub status: OperatingState,
    pub mode: Mode,
    pub pump_on: bool,
    pub heater_on: bool,
    pub filters_ok: bool,
    pub post_heater_temp_c: f64,
    /// Last post-reactor conductivity check: true means potable.
    pub post_reactor_quality_ok: bool,
    pub diverter: DiverterPosition,
    pub product_tank_pct: f64,
    pub waste_tank_pct: f64,
}

impl Snapshot for WaterSnapshot {
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
pub struct WaterProcessorConfig {
    /// Waste tank drain per processing tick, percent.
    pub processing_rate: f64,
    /// Waste accrual per idle tick from crew usage, percent.
    pub usage_rate: f64,
    /// Product tank draw-down per idle tick, percent.
    pub product_drain: f64,
    /// Product tank fill per processing tick with the diverter open.
    pub fill_step: f64,
    /// Waste level that starts a processing run.
    pub waste_high_level: f64,
    /// Product level low enough to start a run early.
    pub product_low_level: f64,
    /// Margin below full at which a run shuts off and the tank is called full.
    pub shutoff_margin: f64,
    /// Product tank alert thresholds, percent.
    pub product_full_level: f64,
    pub product_high_level: f64,
    /// Post-heater temperature band, degrees C.
    pub post_heater_min: f64,
    pub post_heater_max: f64,
    pub post_heater_tolerance: f64,
    /// One-in-N per-tick odds while processing.
    pub pump_fault_odds: u32,
    pub filter_clog_odds: u32,
    pub quality_toggle_odds: u32,
}

impl Default for WaterProcessorConfig {
    fn default() -> Self {
        Self {
            processing_rate: 5.0,
            usage_rate: 3.0,
            product_drain: 2.0,
            fill_step: 5.0,
            waste_high_level: 80.0,
            product_low_level: 20.0,
            shutoff_margin: 5.0,
            product_full_level: 100.0,
            product_high_level: 80.0,
            post_heater_min: 120.0,
            post_heater_max: 130.0,
            post_heater_tolerance: 2.0,
            pump_fault_odds: 10,
            filter_clog_odds: 50,
            quality_toggle_odds: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub enum WaterOverride {
    SetPump(bool),
    SetHeater(bool),
    SetDiverter(DiverterPosition),
    SetProductTankLevel(f64),
    SetWasteTankLevel(f64),
    /// Crew swaps the clogged filter beds for clean ones.
    ServiceFilters,
}

#[derive(Debug)]
pub struct WaterProcessor {
    config: WaterProcessorConfig,
    post_heater_band: LimitBand,
}

impl WaterProcessor {
    pub fn new(config: WaterProcessorConfig) -> Result<Self, EngineError> {
        let post_heater_band = LimitBand::new(
            config.post_heater_min,
            config.post_heater_max,
            config.post_heater_tolerance,
        )?;
        if config.pump_fault_odds == 0
            || config.filter_clog_odds == 0
            || config.quality_toggle_odds == 0
        {
            return Err(EngineError::Config("fault odds must be at least 1"));
        }
        if config.processing_rate <= 0.0 || config.usage_rate <= 0.0 {
            return Err(EngineError::Config("tank flow rates must be positive"));
        }
        if config.product_low_level >= config.waste_high_level {
            return Err(EngineError::Config(
                "product low level must be below the waste high level",
            ));
        }
        if config.shutoff_margin < 0.0 || config.shutoff_margin >= config.product_full_level {
            return Err(EngineError::Config("shutoff margin is out of range"));
        }
        Ok(Self {
            config,
            post_heater_band,
        })
    }

    pub fn config(&self) -> &WaterProcessorConfig {
        &self.config
    }

    fn should_start(&self, snapshot: &WaterSnapshot) -> bool {
        let waste_pressing = snapshot.waste_tank_pct >= self.config.waste_high_level
            && snapshot.product_tank_pct < self.config.product_full_level;
        let product_short = snapshot.product_tank_pct < self.config.product_low_level
            && snapshot.waste_tank_pct > 0.0;
        waste_pressing || product_short
    }
}

impl SubsystemModel for WaterProcessor {
    type Snapshot = WaterSnapshot;
    type Override = WaterOverride;

    const ID: SubsystemId = SubsystemId::WaterProcessor;
    const RESET_STATE: OperatingState = OperatingState::Standby;

    fn seed(&self) -> WaterSnapshot {
        WaterSnapshot {
            report_tick: 0,
            status: OperatingState::Standby,
            mode: Mode::Automatic,
            pump_on: false,
            heater_on: false,
            filters_ok: true,
            post_heater_temp_c: 20.0,
            post_reactor_quality_ok: false,
            diverter: DiverterPosition::Reprocess,
            product_tank_pct: 80.0,
            waste_tank_pct: 30.0,
        }
    }

    fn generate(&mut self, snapshot: &mut WaterSnapshot, rng: &mut StdRng) {
        if snapshot.status == OperatingState::Processing {
            snapshot.post_heater_temp_c = rng.gen_range(POST_HEATER_DRAW);
            snapshot.waste_tank_pct =
                (snapshot.waste_tank_pct - self.config.processing_rate).max(0.0);

            if rng.gen_range(0..self.config.pump_fault_odds) == 0 {
                snapshot.pump_on = !snapshot.pump_on;
            }
            if rng.gen_range(0..self.config.filter_clog_odds) == 0 {
                snapshot.filters_ok = false;
            }
            if rng.gen_range(0..self.config.quality_toggle_odds) == 0 {
                snapshot.post_reactor_quality_ok = !snapshot.post_reactor_quality_ok;
            }
        } else {
            // Idle ticks draw nothing from the RNG; the crew just keeps
            // filling the waste tank.
            snapshot.post_heater_temp_c = AMBIENT_TEMP_C;
            snapshot.waste_tank_pct = (snapshot.waste_tank_pct + self.config.usage_rate).min(100.0);
        }
    }

    fn control(&mut self, snapshot: &mut WaterSnapshot) {
        match snapshot.status {
            OperatingState::Standby => {
                if self.should_start(snapshot) {
                    snapshot.status = OperatingState::Processing;
                    snapshot.pump_on = true;
                    snapshot.heater_on = true;
                } else {
                    snapshot.product_tank_pct =
                        (snapshot.product_tank_pct - self.config.product_drain).max(0.0);
                }
            }
            OperatingState::Processing => {
                // The pump reading disagreeing with a commanded run is the
                // one fault this subsystem cannot work around.
                if !snapshot.pump_on {
                    snapshot.status = OperatingState::Trouble;
                    snapshot.heater_on = false;
                    return;
                }

                snapshot.diverter = if snapshot.post_reactor_quality_ok {
                    DiverterPosition::ProductTank
                } else {
                    DiverterPosition::Reprocess
                };

                if snapshot.waste_tank_pct <= 0.0 {
                    snapshot.status = OperatingState::Standby;
                    snapshot.pump_on = false;
                    snapshot.heater_on = false;
                } else if snapshot.product_tank_pct
                    >= self.config.product_full_level - self.config.shutoff_margin
                {
                    snapshot.product_tank_pct = self.config.product_full_level;
                    snapshot.status = OperatingState::Standby;
                    snapshot.pump_on = false;
                    snapshot.heater_on = false;
                } else if snapshot.diverter == DiverterPosition::ProductTank {
                    snapshot.product_tank_pct = (snapshot.product_tank_pct
                        + self.config.fill_step)
                        .min(self.config.product_full_level);
                }
            }
            _ => {}
        }
    }

    fn alerts(&self, snapshot: &WaterSnapshot) -> AlertVec {
        let mut out = AlertVec::new();

        // An empty product tank is handled by starting a run, not by
        // alerting; only the full side is graded.
        let product_alert = if snapshot.product_tank_pct >= self.config.product_full_level {
            Alert::new(
                "product_tank_pct",
                "product water tank is full",
                AlertLevel::HighError,
            )
        } else if snapshot.product_tank_pct >= self.config.product_high_level {
            Alert::new(
                "product_tank_pct",
                "product water tank is nearly full",
                AlertLevel::HighWarning,
            )
        } else {
            Alert::nominal("product_tank_pct")
        };
        let _ = out.push(product_alert);

        let filters_alert = if snapshot.filters_ok {
            Alert::nominal("filters_ok")
        } else {
            Alert::new(
                "filters_ok",
                "filter beds need service",
                AlertLevel::HighWarning,
            )
        };
        let _ = out.push(filters_alert);

        // Outlet temperature only means anything while the heater is driven.
        if snapshot.status == OperatingState::Processing {
            let level = self.post_heater_band.classify(snapshot.post_heater_temp_c);
            let _ = out.push(Alert::graded("post_heater_temp_c", level, &POST_HEATER_MSGS));
        } else {
            let _ = out.push(Alert::nominal("post_heater_temp_c"));
        }

        let quality_alert = if snapshot.post_reactor_quality_ok {
            Alert::nominal("post_reactor_quality_ok")
        } else {
            Alert::new(
                "post_reactor_quality_ok",
                "post-reactor quality check failing; output routed to reprocess",
                AlertLevel::HighWarning,
            )
        };
        let _ = out.push(quality_alert);

        let status_alert = if snapshot.status == OperatingState::Trouble {
            Alert::new(
                "status",
                "water processor halted on pump fault",
                AlertLevel::HighError,
            )
        } else {
            Alert::nominal("status")
        };
        let _ = out.push(status_alert);

        out
    }

    fn apply_override(
        &mut self,
        snapshot: &mut WaterSnapshot,
        command: WaterOverride,
    ) -> Result<(), EngineError> {
        match command {
            WaterOverride::SetPump(on) => {
                snapshot.pump_on = on;
                Ok(())
            }
            WaterOverride::SetHeater(on) => {
                snapshot.heater_on = on;
                Ok(())
            }
            WaterOverride::SetDiverter(position) => {
                snapshot.diverter = position;
                Ok(())
            }
            WaterOverride::SetProductTankLevel(pct) => {
                if !(0.0..=100.0).contains(&pct) {
                    return Err(EngineError::InvalidOperation(
                        "tank level must be within 0..=100 percent",
                    ));
                }
                snapshot.product_tank_pct = pct;
                Ok(())
            }
            WaterOverride::SetWasteTankLevel(pct) => {
                if !(0.0..=100.0).contains(&pct) {
                    return Err(EngineError::InvalidOperation(
                        "tank level must be within 0..=100 percent",
                    ));
                }
                snapshot.waste_tank_pct = pct;
                Ok(())
            }
            WaterOverride::ServiceFilters => {
                snapshot.filters_ok = true;
                Ok(())
            }
        }
    }
}
