//! Carbon dioxide remediation: a pair of zeolite beds where one absorbs CO2
//! from cabin air while the other is heated to release what it captured.
//! The beds trade roles on a fixed regeneration cycle.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Mode, OperatingState, Snapshot, SubsystemId, SubsystemModel};
use crate::alerts::{Alert, AlertVec, BandMessages};
use crate::control::{CycleTimer, ResourcePair};
use crate::engine::EngineError;
use crate::limits::{AlertLevel, LimitBand};

/// Heater temperature draw for the bed being regenerated, degrees C.
const REGEN_TEMP_DRAW: core::ops::Range<f64> = 175.0..232.0;
/// Cabin-ambient draw for an idle or absorbing bed, degrees C.
const AMBIENT_TEMP_DRAW: core::ops::Range<f64> = 19.0..32.0;
/// Scrubbed-air CO2 draw while processing, percent by volume.
const OUTPUT_DRAW: core::ops::Range<f64> = 0.0..0.4;

const REGEN_TEMP_MSGS: BandMessages = BandMessages {
    high_error: "regenerating bed temperature is above maximum",
    high_warning: "regenerating bed temperature is elevated",
    low_error: "regenerating bed temperature is below minimum",
    low_warning: "regenerating bed temperature is low",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bed {
    Bed1,
    Bed2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Co2Snapshot {
    pub report_tick: u64,
    pub status: OperatingState,
    pub mode: Mode,
    /// Circulation fan moving cabin air over the absorbing bed.
    pub fan_on: bool,
    /// Valve routing airflow; follows the absorbing bed.
    pub bed_selector: Bed,
    /// Active slot absorbs, standby slot regenerates.
    pub beds: ResourcePair<Bed>,
    pub bed1_temp_c: f64,
    pub bed2_temp_c: f64,
    /// CO2 level in air entering the scrubber, percent by volume.
    pub co2_intake_level: f64,
    /// CO2 level in air returned to the cabin.
    pub co2_output_level: f64,
}

impl Co2Snapshot {
    pub fn bed_temp(&self, bed: Bed) -> f64 {
        match bed {
            Bed::Bed1 => self.bed1_temp_c,
            Bed::Bed2 => self.bed2_temp_c,
        }
    }

    fn set_bed_temp(&mut self, bed: Bed, temp_c: f64) {
        match bed {
            Bed::Bed1 => self.bed1_temp_c = temp_c,
            Bed::Bed2 => self.bed2_temp_c = temp_c,
        }
    }
}

impl Snapshot for Co2Snapshot {
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
pub struct Co2ScrubberConfig {
    /// Regeneration heater band, degrees C.
    pub regen_temp_lower: f64,
    pub regen_temp_upper: f64,
    pub regen_temp_tolerance: f64,
    /// Scrubbed-air CO2 ceiling and its approaching-limit margin.
    pub output_limit: f64,
    pub output_tolerance: f64,
    /// Intake CO2 alert thresholds, percent by volume.
    pub intake_ideal_max: f64,
    pub intake_hard_max: f64,
    /// Intake level above which the scrubber starts processing.
    pub processing_threshold: f64,
    /// Processing ticks between bed role swaps.
    pub cycle_length: u32,
    /// One-in-N odds per tick of a transient fan fault.
    pub failure_odds: u32,
    /// Intake draw ceilings in tenths of a percent.
    pub crewed_intake_ceiling: u32,
    pub uncrewed_intake_ceiling: u32,
}

impl Default for Co2ScrubberConfig {
    fn default() -> Self {
        Self {
            regen_temp_lower: 220.0,
            regen_temp_upper: 250.0,
            regen_temp_tolerance: 10.0,
            output_limit: 0.5,
            output_tolerance: 0.25,
            intake_ideal_max: 5.0,
            intake_hard_max: 8.0,
            processing_threshold: 0.5,
            cycle_length: 10,
            failure_odds: 10,
            crewed_intake_ceiling: 30,
            uncrewed_intake_ceiling: 80,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Co2Override {
    SetFan(bool),
    SelectBed(Bed),
    SetIntakeLevel(f64),
    SetBedTemperature(Bed, f64),
}

#[derive(Debug)]
pub struct Co2Scrubber {
    config: Co2ScrubberConfig,
    regen_temp_band: LimitBand,
    bed_cycle: CycleTimer,
    crewed: bool,
    intake_ceiling: u32,
}

impl Co2Scrubber {
    pub fn new(config: Co2ScrubberConfig) -> Result<Self, EngineError> {
        let regen_temp_band = LimitBand::new(
            config.regen_temp_lower,
            config.regen_temp_upper,
            config.regen_temp_tolerance,
        )?;
        let bed_cycle = CycleTimer::new(config.cycle_length)?;
        if config.failure_odds == 0 {
            return Err(EngineError::Config("failure odds must be at least 1"));
        }
        if config.crewed_intake_ceiling == 0 || config.uncrewed_intake_ceiling == 0 {
            return Err(EngineError::Config("intake ceiling must be at least 1"));
        }
        if config.output_limit <= 0.0 || config.output_tolerance < 0.0 {
            return Err(EngineError::Config("output limit band is invalid"));
        }
        if config.intake_ideal_max >= config.intake_hard_max {
            return Err(EngineError::Config(
                "intake ideal maximum must be below the hard maximum",
            ));
        }
        let intake_ceiling = config.crewed_intake_ceiling;
        Ok(Self {
            config,
            regen_temp_band,
            bed_cycle,
            crewed: true,
            intake_ceiling,
        })
    }

    pub fn config(&self) -> &Co2ScrubberConfig {
        &self.config
    }

    pub fn cycle_count(&self) -> u32 {
        self.bed_cycle.count()
    }

    pub fn is_crewed(&self) -> bool {
        self.crewed
    }

    /// Crew departure or arrival: uncrewed operation tolerates a higher CO2
    /// draw ceiling since nobody is breathing the cabin air.
    pub fn set_crewed(&mut self, crewed: bool) {
        self.crewed = crewed;
        self.intake_ceiling = if crewed {
            self.config.crewed_intake_ceiling
        } else {
            self.config.uncrewed_intake_ceiling
        };
    }

    fn run_processing(&mut self, snapshot: &mut Co2Snapshot) {
        // The absorbing bed reading regeneration-hot means the selector
        // valve and the bed sensors disagree about which bed is in the
        // airflow path.
        let absorbing_temp = snapshot.bed_temp(snapshot.beds.active());
        let regen_temp = snapshot.bed_temp(snapshot.beds.standby());
        if absorbing_temp >= self.config.regen_temp_lower
            || regen_temp > self.regen_temp_band.hard_max()
        {
            snapshot.status = OperatingState::Trouble;
            snapshot.fan_on = false;
            return;
        }

        if self.bed_cycle.expired() {
            snapshot.beds.swap();
            snapshot.bed_selector = snapshot.beds.active();
            self.bed_cycle.reset();
        } else {
            self.bed_cycle.tick();
        }
    }
}

impl SubsystemModel for Co2Scrubber {
    type Snapshot = Co2Snapshot;
    type Override = Co2Override;

    const ID: SubsystemId = SubsystemId::Co2Scrubber;
    const RESET_STATE: OperatingState = OperatingState::Standby;

    fn seed(&self) -> Co2Snapshot {
        Co2Snapshot {
            report_tick: 0,
            status: OperatingState::Standby,
            mode: Mode::Automatic,
            fan_on: false,
            bed_selector: Bed::Bed1,
            beds: ResourcePair::new(Bed::Bed1, Bed::Bed2)
                .unwrap_or_else(|_| unreachable!("bed ids are distinct")),
            bed1_temp_c: 200.0,
            bed2_temp_c: 20.0,
            co2_intake_level: 3.0,
            co2_output_level: 0.0,
        }
    }

    fn generate(&mut self, snapshot: &mut Co2Snapshot, rng: &mut StdRng) {
        snapshot.co2_intake_level = f64::from(rng.gen_range(0..self.intake_ceiling)) / 10.0;

        if snapshot.status == OperatingState::Processing {
            snapshot.fan_on = true;
            let regenerating = snapshot.beds.standby();
            let absorbing = snapshot.beds.active();
            snapshot.set_bed_temp(regenerating, rng.gen_range(REGEN_TEMP_DRAW));
            snapshot.set_bed_temp(absorbing, rng.gen_range(AMBIENT_TEMP_DRAW));
            snapshot.co2_output_level = rng.gen_range(OUTPUT_DRAW);
        } else {
            snapshot.fan_on = false;
            snapshot.bed1_temp_c = rng.gen_range(AMBIENT_TEMP_DRAW);
            snapshot.bed2_temp_c = rng.gen_range(AMBIENT_TEMP_DRAW);
            snapshot.co2_output_level = 0.0;
        }

        // Transient fan fault, drawn separately from the value draws so
        // failures never correlate with sensor extremes.
        if rng.gen_range(0..self.config.failure_odds) == 0 {
            snapshot.fan_on = !snapshot.fan_on;
        }
    }

    fn control(&mut self, snapshot: &mut Co2Snapshot) {
        match snapshot.status {
            OperatingState::Processing => {
                if snapshot.co2_intake_level <= self.config.processing_threshold {
                    snapshot.status = OperatingState::Standby;
                } else {
                    self.run_processing(snapshot);
                }
            }
            OperatingState::Standby => {
                if snapshot.co2_intake_level > self.config.processing_threshold {
                    snapshot.status = OperatingState::Processing;
                } else {
                    snapshot.fan_on = false;
                }
            }
            _ => {}
        }
    }

    fn alerts(&self, snapshot: &Co2Snapshot) -> AlertVec {
        let mut out = AlertVec::new();

        // Regeneration heat only matters while processing; a cold bed is the
        // expected reading in any other state.
        let regenerating = snapshot.beds.standby();
        let regen_field = match regenerating {
            Bed::Bed1 => "bed1_temperature",
            Bed::Bed2 => "bed2_temperature",
        };
        if snapshot.status == OperatingState::Processing {
            let level = self.regen_temp_band.classify(snapshot.bed_temp(regenerating));
            let _ = out.push(Alert::graded(regen_field, level, &REGEN_TEMP_MSGS));
        } else {
            let _ = out.push(Alert::nominal(regen_field));
        }

        let fan_alert = match snapshot.status {
            OperatingState::Processing if !snapshot.fan_on => Alert::new(
                "fan_on",
                "no fan running while system is processing",
                AlertLevel::HighError,
            ),
            OperatingState::Standby if snapshot.fan_on => Alert::new(
                "fan_on",
                "fan running while system is in standby",
                AlertLevel::HighWarning,
            ),
            _ => Alert::nominal("fan_on"),
        };
        let _ = out.push(fan_alert);

        let output_alert = if snapshot.co2_output_level >= self.config.output_limit {
            Alert::new(
                "co2_output_level",
                "carbon dioxide output is above maximum",
                AlertLevel::HighError,
            )
        } else if snapshot.co2_output_level
            >= self.config.output_limit - self.config.output_tolerance
        {
            Alert::new(
                "co2_output_level",
                "carbon dioxide output is elevated",
                AlertLevel::HighWarning,
            )
        } else {
            Alert::nominal("co2_output_level")
        };
        let _ = out.push(output_alert);

        // Intake has no meaningful lower bound; zero CO2 is clean air.
        let intake_alert = if snapshot.co2_intake_level >= self.config.intake_hard_max {
            Alert::new(
                "co2_intake_level",
                "carbon dioxide intake is above maximum",
                AlertLevel::HighError,
            )
        } else if snapshot.co2_intake_level > self.config.intake_ideal_max {
            Alert::new(
                "co2_intake_level",
                "carbon dioxide intake is elevated",
                AlertLevel::HighWarning,
            )
        } else {
            Alert::nominal("co2_intake_level")
        };
        let _ = out.push(intake_alert);

        // Invariant rule: bed roles must alternate.
        let beds_alert = if snapshot.beds.active() == snapshot.beds.standby() {
            Alert::new(
                "regenerating_bed",
                "regenerating bed is the same as the absorbing bed",
                AlertLevel::HighError,
            )
        } else {
            Alert::nominal("regenerating_bed")
        };
        let _ = out.push(beds_alert);

        out
    }

    fn apply_override(
        &mut self,
        snapshot: &mut Co2Snapshot,
        command: Co2Override,
    ) -> Result<(), EngineError> {
        match command {
            Co2Override::SetFan(on) => {
                snapshot.fan_on = on;
                Ok(())
            }
            Co2Override::SelectBed(bed) => {
                snapshot.bed_selector = bed;
                snapshot.beds.activate(bed);
                Ok(())
            }
            Co2Override::SetIntakeLevel(level) => {
                if !(0.0..=self.config.intake_hard_max).contains(&level) {
                    return Err(EngineError::InvalidOperation(
                        "intake level must be within the configured hard range",
                    ));
                }
                snapshot.co2_intake_level = level;
                Ok(())
            }
            Co2Override::SetBedTemperature(bed, temp_c) => {
                if !(0.0..=300.0).contains(&temp_c) {
                    return Err(EngineError::InvalidOperation(
                        "bed temperature override out of plausible range",
                    ));
                }
                snapshot.set_bed_temp(bed, temp_c);
                Ok(())
            }
        }
    }
}
