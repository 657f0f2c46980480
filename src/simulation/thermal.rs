use serde::{Deserialize, Serialize};

use super::geometry::GreenhouseConfig;
use crate::error::{Result, TwinError};

/// Lumped-capacitance model of the greenhouse's solid mass
///
/// Footings, coupled soil and plants share a single temperature. The node
/// exchanges heat with the air through a fixed coefficient and absorbs any
/// external heat input (e.g. the solar share that lands on the floor).
///
/// Recurrence over a step of `dt` seconds:
/// `T' = T + (k·(T_air − T) + Q_in)·dt / (m·c_p)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalMassNode {
    temp_c: f64,
    mass_kg: f64,
    specific_heat_j_kg_k: f64,
    /// Air-mass exchange coefficient (W/K)
    exchange_w_k: f64,
}

impl ThermalMassNode {
    pub fn new(
        mass_kg: f64,
        specific_heat_j_kg_k: f64,
        exchange_w_k: f64,
        initial_temp_c: f64,
    ) -> Result<Self> {
        if !(mass_kg > 0.0 && mass_kg.is_finite()) {
            return Err(TwinError::Configuration(format!(
                "thermal mass must be positive, got {} kg",
                mass_kg
            )));
        }
        if !(specific_heat_j_kg_k > 0.0 && specific_heat_j_kg_k.is_finite()) {
            return Err(TwinError::Configuration(format!(
                "specific heat must be positive, got {} J/kg/K",
                specific_heat_j_kg_k
            )));
        }
        if !(exchange_w_k >= 0.0 && exchange_w_k.is_finite()) {
            return Err(TwinError::Configuration(format!(
                "air-mass exchange coefficient must be non-negative, got {} W/K",
                exchange_w_k
            )));
        }
        if !initial_temp_c.is_finite() {
            return Err(TwinError::Configuration(
                "initial mass temperature must be finite".to_string(),
            ));
        }

        Ok(Self {
            temp_c: initial_temp_c,
            mass_kg,
            specific_heat_j_kg_k,
            exchange_w_k,
        })
    }

    /// Node for the solid mass of a built greenhouse
    pub fn for_greenhouse(
        config: &GreenhouseConfig,
        exchange_w_k: f64,
        initial_temp_c: f64,
    ) -> Result<Self> {
        Self::new(
            config.mass_kg(),
            config.mass_specific_heat(),
            exchange_w_k,
            initial_temp_c,
        )
    }

    pub fn temp_c(&self) -> f64 {
        self.temp_c
    }

    pub fn mass_kg(&self) -> f64 {
        self.mass_kg
    }

    pub fn specific_heat(&self) -> f64 {
        self.specific_heat_j_kg_k
    }

    /// Heat capacity (J/K)
    pub fn heat_capacity_j_k(&self) -> f64 {
        self.mass_kg * self.specific_heat_j_kg_k
    }

    /// Heat flowing from the air into the mass at the current temperatures (W)
    pub fn exchange_from_air_w(&self, air_temp_c: f64) -> f64 {
        self.exchange_w_k * (air_temp_c - self.temp_c)
    }

    /// Temperature after `dt_seconds`, without touching the node
    pub fn next_temperature(&self, heat_input_w: f64, air_temp_c: f64, dt_seconds: f64) -> f64 {
        let exchange_j = self.exchange_from_air_w(air_temp_c) * dt_seconds;
        let input_j = heat_input_w * dt_seconds;
        self.temp_c + (exchange_j + input_j) / self.heat_capacity_j_k()
    }

    /// Advance the node by one step and return the new temperature
    pub fn update_temperature(&mut self, heat_input_w: f64, air_temp_c: f64, dt_seconds: f64) -> f64 {
        if dt_seconds <= 0.0 {
            return self.temp_c;
        }
        self.temp_c = self.next_temperature(heat_input_w, air_temp_c, dt_seconds);
        self.temp_c
    }
}

/// Air-side heat flow calculator for one greenhouse
///
/// All flows are in Watts. Losses are positive when heat leaves the air.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatFlowModel {
    /// Wall, roof, floor and glazing conductance (W/K)
    conduction_w_k: f64,
    infiltration_w_k: f64,
    /// Ventilation conductance per air change per hour (W/K/ACH)
    vent_w_k_per_ach: f64,
    /// Fractional loss increase per m/s of wind
    wind_coefficient: f64,
    heater_capacity_w: f64,
    heater_efficiency: f64,
}

impl HeatFlowModel {
    pub fn new(config: &GreenhouseConfig, wind_coefficient: f64, heater_efficiency: f64) -> Self {
        Self {
            conduction_w_k: config.ua_envelope_w_k() + config.glazing_conductance_w_k(),
            infiltration_w_k: config.infiltration_conductance_w_k(),
            vent_w_k_per_ach: config.air_exchange_conductance_w_k(1.0),
            wind_coefficient,
            heater_capacity_w: config.heater_capacity_w() as f64,
            heater_efficiency,
        }
    }

    /// Conduction plus infiltration, scaled up linearly with wind speed
    pub fn heat_loss_w(&self, air_temp_c: f64, exterior_temp_c: f64, wind_speed_m_s: f64) -> f64 {
        let dt = air_temp_c - exterior_temp_c;
        let q_cond = self.conduction_w_k * dt;
        let q_inf = self.infiltration_w_k * dt;
        (q_cond + q_inf) * (1.0 + self.wind_coefficient * wind_speed_m_s)
    }

    /// Loss through opened vents; vents never bring heat in
    pub fn ventilation_loss_w(&self, air_temp_c: f64, exterior_temp_c: f64, vent_ach: f64) -> f64 {
        let dt = air_temp_c - exterior_temp_c;
        if vent_ach <= 0.0 || dt < 0.0 {
            return 0.0;
        }
        self.vent_w_k_per_ach * vent_ach * dt
    }

    pub fn heating_gain_w(&self, heater_on: bool, part_load: f64) -> f64 {
        if !heater_on {
            return 0.0;
        }
        part_load.clamp(0.0, 1.0) * self.heater_capacity_w * self.heater_efficiency
    }

    /// Total still-air conductance of the closed house (W/K)
    pub fn closed_conductance_w_k(&self) -> f64 {
        self.conduction_w_k + self.infiltration_w_k
    }
}
