//! # Climate Controllers
//!
//! A controller is asked once per decision interval (one hour) for heater
//! and vent actuation, given the current air temperature and a lookahead
//! window of the exterior forecast.
//!
//! - [`PredictiveController`]: receding-horizon pre-heating with hysteresis and dwell times
//! - [`ThermostatController`]: plain on/off hysteresis around a set-point
//! - [`ScheduleController`]: fixed heating and venting hours
//!
//! Any other decision source (for instance an externally trained model)
//! plugs in by implementing [`ClimateController`].

pub mod predictive;
pub mod rules;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::domain::Actuation;

pub use predictive::{ControllerParams, ControllerState, LumpedModel, PredictiveController};
pub use rules::{ScheduleConfig, ScheduleController, ThermostatConfig, ThermostatController};

/// Length of one decision interval (s)
pub const DECISION_INTERVAL_S: f64 = 3600.0;

/// One hour of the lookahead window as seen by a controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub exterior_temp_c: f64,
    /// Solar power entering the glazing (W)
    pub solar_gain_w: f64,
}

/// Source of heater/vent decisions
#[cfg_attr(test, mockall::automock)]
pub trait ClimateController: Send {
    /// Decide actuation for the interval starting at `horizon[0]`
    ///
    /// `horizon` may be shorter than requested (or empty) near the end of
    /// the forecast; implementations must degrade gracefully.
    fn decide(&mut self, air_temp_c: f64, horizon: &[HorizonPoint]) -> Actuation;

    fn name(&self) -> &'static str;
}
