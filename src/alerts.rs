use heapless::Vec;
use serde::Serialize;

use crate::limits::AlertLevel;

/// Upper bound on alerts per subsystem evaluation: the widest subsystem
/// monitors eight fields plus appended invariant rules.
pub const MAX_ALERTS: usize = 16;

/// One graded finding for one monitored field.
///
/// A nominal alert (no message, `AlertLevel::Nominal`) is still emitted for
/// every monitored field on every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub field: &'static str,
    pub message: Option<&'static str>,
    pub level: AlertLevel,
}

impl Alert {
    pub fn new(field: &'static str, message: &'static str, level: AlertLevel) -> Self {
        Self {
            field,
            message: Some(message),
            level,
        }
    }

    pub fn nominal(field: &'static str) -> Self {
        Self {
            field,
            message: None,
            level: AlertLevel::Nominal,
        }
    }

    /// Build the alert for a banded field from its classification, picking
    /// the message that matches the grade.
    pub fn graded(field: &'static str, level: AlertLevel, messages: &BandMessages) -> Self {
        let message = match level {
            AlertLevel::Nominal => return Self::nominal(field),
            AlertLevel::LowWarning => messages.low_warning,
            AlertLevel::HighWarning => messages.high_warning,
            AlertLevel::LowError => messages.low_error,
            AlertLevel::HighError => messages.high_error,
        };
        Self::new(field, message, level)
    }

    pub fn is_nominal(&self) -> bool {
        self.level.is_nominal()
    }
}

/// Per-grade message text for one banded field.
#[derive(Debug, Clone, Copy)]
pub struct BandMessages {
    pub high_error: &'static str,
    pub high_warning: &'static str,
    pub low_error: &'static str,
    pub low_warning: &'static str,
}

/// Ordered alert list for one evaluation pass. Field order is declared per
/// subsystem and stable across calls; invariant rules come last.
pub type AlertVec = Vec<Alert, MAX_ALERTS>;
