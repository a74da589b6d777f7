use serde::{Deserialize, Serialize};

use crate::engine::EngineError;

/// Severity grade for one monitored field, ordered from nominal to worst.
///
/// `Nominal` is a real classification, not an absence: every monitored field
/// produces exactly one grade per evaluation pass so the alert list is a
/// complete audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertLevel {
    Nominal,
    LowWarning,
    HighWarning,
    LowError,
    HighError,
}

impl AlertLevel {
    pub fn is_error(self) -> bool {
        matches!(self, AlertLevel::LowError | AlertLevel::HighError)
    }

    pub fn is_warning(self) -> bool {
        matches!(self, AlertLevel::LowWarning | AlertLevel::HighWarning)
    }

    pub fn is_nominal(self) -> bool {
        self == AlertLevel::Nominal
    }
}

/// Configured limit bands for one measured field.
///
/// A value is graded against the hard range, a tolerance margin inside the
/// hard bounds ("approaching limit"), and an optional ideal range. Boundary
/// values always belong to the stricter band: a reading exactly at the hard
/// maximum grades `HighError`, and a reading exactly at `max - tolerance`
/// grades `HighWarning`. The source subsystems mixed `<` and `<=` between
/// analogous branches; this type fixes one rule for all fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitBand {
    hard_min: f64,
    hard_max: f64,
    ideal: Option<(f64, f64)>,
    tolerance: f64,
}

impl LimitBand {
    /// Build a band with hard limits and a tolerance margin.
    ///
    /// Rejected before the first tick: inverted ranges, negative tolerance,
    /// or a tolerance wide enough that the warning margins overlap.
    pub fn new(hard_min: f64, hard_max: f64, tolerance: f64) -> Result<Self, EngineError> {
        if hard_min >= hard_max {
            return Err(EngineError::Config("hard range must satisfy min < max"));
        }
        if tolerance < 0.0 {
            return Err(EngineError::Config("tolerance must be non-negative"));
        }
        if tolerance >= (hard_max - hard_min) / 2.0 {
            return Err(EngineError::Config(
                "tolerance must be smaller than half the hard range span",
            ));
        }
        Ok(Self {
            hard_min,
            hard_max,
            ideal: None,
            tolerance,
        })
    }

    /// Same as [`LimitBand::new`] plus an ideal range nested inside the hard
    /// range; readings outside it (but clear of the tolerance margins) grade
    /// as warnings.
    pub fn with_ideal(
        hard_min: f64,
        hard_max: f64,
        ideal_min: f64,
        ideal_max: f64,
        tolerance: f64,
    ) -> Result<Self, EngineError> {
        let mut band = Self::new(hard_min, hard_max, tolerance)?;
        if ideal_min >= ideal_max {
            return Err(EngineError::Config("ideal range must satisfy min < max"));
        }
        if ideal_min < hard_min || ideal_max > hard_max {
            return Err(EngineError::Config(
                "ideal range must lie within the hard range",
            ));
        }
        band.ideal = Some((ideal_min, ideal_max));
        Ok(band)
    }

    pub fn hard_min(&self) -> f64 {
        self.hard_min
    }

    pub fn hard_max(&self) -> f64 {
        self.hard_max
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Grade a reading. Checks run in fixed order: hard max, high tolerance
    /// margin, hard min, low tolerance margin, then the ideal range.
    pub fn classify(&self, value: f64) -> AlertLevel {
        if value >= self.hard_max {
            return AlertLevel::HighError;
        }
        if value >= self.hard_max - self.tolerance {
            return AlertLevel::HighWarning;
        }
        if value <= self.hard_min {
            return AlertLevel::LowError;
        }
        if value <= self.hard_min + self.tolerance {
            return AlertLevel::LowWarning;
        }
        if let Some((ideal_min, ideal_max)) = self.ideal {
            if value > ideal_max {
                return AlertLevel::HighWarning;
            }
            if value < ideal_min {
                return AlertLevel::LowWarning;
            }
        }
        AlertLevel::Nominal
    }
}
