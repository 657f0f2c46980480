use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Heater and vent command issued by a climate controller for one decision interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Actuation {
    pub heater_on: bool,
    /// Heater load fraction (0.0-1.0)
    pub part_load: f64,
    /// Commanded ventilation rate (air changes per hour)
    pub vent_ach: f64,
}

impl Actuation {
    pub fn idle() -> Self {
        Self {
            heater_on: false,
            part_load: 0.0,
            vent_ach: 0.0,
        }
    }

    pub fn heating() -> Self {
        Self {
            heater_on: true,
            part_load: 1.0,
            vent_ach: 0.0,
        }
    }

    pub fn with_vent(mut self, vent_ach: f64) -> Self {
        self.vent_ach = vent_ach;
        self
    }

    pub fn is_venting(&self) -> bool {
        self.vent_ach > 0.0
    }
}

impl Default for Actuation {
    fn default() -> Self {
        Self::idle()
    }
}

/// Simulated greenhouse state at the end of one hour
///
/// Heat flows are in Watts and evaluated at the end-of-hour temperatures,
/// except solar and heating gains which are the hour's forcing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub timestamp: DateTime<FixedOffset>,
    pub exterior_temp_c: f64,
    pub air_temp_c: f64,
    pub mass_temp_c: f64,
    pub humidity_pct: f64,
    pub heater_on: bool,
    pub part_load: f64,
    pub vent_ach: f64,
    pub solar_gain_w: f64,
    pub heating_gain_w: f64,
    /// Envelope conduction plus infiltration loss
    pub heat_loss_w: f64,
    pub ventilation_loss_w: f64,
    /// Heat flowing from the thermal mass into the air
    pub exchange_w: f64,
}

impl SimulationState {
    pub fn actuation(&self) -> Actuation {
        Actuation {
            heater_on: self.heater_on,
            part_load: self.part_load,
            vent_ach: self.vent_ach,
        }
    }
}
