//! # Habitat Systems Simulator
//!
//! A simulation and alert-evaluation library for the life-support and power
//! subsystems of a crewed station: carbon dioxide scrubbing, electrical
//! power, water reclamation, and the internal and external coolant loops.
//!
//! ## Features
//!
//! - **Deterministic simulation**: every subsystem advances tick by tick
//!   from a seeded random source; equal seeds reproduce identical runs
//! - **Graded alert evaluation**: every monitored field is classified
//!   against configured limit bands on every tick
//! - **Automatic control**: each subsystem runs its own state machine with
//!   latching trouble states and explicit external reset
//! - **Manual override**: per-subsystem manual mode suppresses control and
//!   accepts validated actuator commands
//! - **Bounded alert storage**: alert lists are fixed-capacity, no
//!   per-tick heap growth
//!
//! ## Quick Start
//!
//! ```rust
//! use habsim::{Station, StationConfig};
//!
//! let mut station = Station::new(StationConfig::default()).expect("default config is valid");
//!
//! let report = station.tick_all();
//! println!("tick {}: worst grade {:?}", report.tick, report.worst_level());
//! ```
//!
//! ## Architecture
//!
//! - [`station`] - Coordinator owning one engine per subsystem
//! - [`engine`] - Generic generate → control → evaluate tick driver
//! - [`subsystems`] - The five subsystem models
//! - [`limits`] - Limit bands and alert severity grading
//! - [`alerts`] - Alert records and the bounded alert list
//! - [`control`] - Shared actuator and cycle building blocks

pub mod alerts;
pub mod control;
pub mod engine;
pub mod limits;
pub mod station;
pub mod subsystems;

// Re-export main public types for convenience
pub use alerts::{Alert, AlertVec};
pub use engine::{Engine, EngineError};
pub use limits::{AlertLevel, LimitBand};
pub use station::{Station, StationConfig, StationReport, SubsystemReport};
pub use subsystems::{
    Co2Scrubber, ExternalCoolantLoop, InternalCoolantLoop, Mode, OperatingState, PowerSystem,
    SubsystemId, WaterProcessor,
};
