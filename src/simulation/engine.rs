//! # Thermal Engine
//!
//! Hour-by-hour simulation of the greenhouse air and thermal-mass nodes.
//!
//! Once per hour the engine hands the controller the current air
//! temperature and a lookahead slice of the forecast, then integrates the
//! hour in equal sub-steps. Each sub-step re-evaluates the losses at the
//! updated air temperature:
//!
//! 1. conduction + infiltration loss (wind-scaled) and ventilation loss
//! 2. solar gain split between the mass node and the air
//! 3. mass node update, then air–mass exchange from the new mass temperature
//! 4. air update over the combined air + mass heat capacity
//!
//! One [`SimulationState`] is emitted per simulated hour.

use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info, warn};
use validator::Validate;

use super::geometry::GreenhouseConfig;
use super::humidity::HumidityModel;
use super::solar::SolarGainModel;
use super::thermal::{HeatFlowModel, ThermalMassNode};
use crate::controller::{ClimateController, HorizonPoint, DECISION_INTERVAL_S};
use crate::domain::{validate_series, ForecastRow, SimulationState};
use crate::error::{Result, TwinError};

/// What to do when the lookahead runs past the end of the forecast
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ForecastPolicy {
    /// Hand the controller a shorter horizon near the end of the forecast
    #[default]
    Truncate,
    /// Require `start + steps + horizon` rows up front
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EngineParams {
    pub initial_air_temp_c: f64,
    pub initial_mass_temp_c: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub initial_humidity_pct: f64,
    /// Hours to simulate
    #[validate(range(min = 1))]
    pub steps: usize,
    /// Lookahead hours handed to the controller
    #[validate(range(min = 1))]
    pub horizon: usize,
    /// Share of the solar gain absorbed by the thermal mass
    #[validate(range(min = 0.0, max = 1.0))]
    pub mass_solar_fraction: f64,
    #[validate(range(min = 0.0))]
    pub air_mass_exchange_w_k: f64,
    #[validate(range(min = 1, max = 60))]
    pub sub_steps: u32,
    /// Fractional increase of envelope loss per m/s of wind
    #[validate(range(min = 0.0))]
    pub wind_coefficient: f64,
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub heater_efficiency: f64,
    pub forecast_policy: ForecastPolicy,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            initial_air_temp_c: 20.0,
            initial_mass_temp_c: 20.0,
            initial_humidity_pct: 60.0,
            steps: 24,
            horizon: 12,
            mass_solar_fraction: 0.8,
            air_mass_exchange_w_k: 1500.0,
            sub_steps: 4,
            wind_coefficient: 0.05,
            heater_efficiency: 0.90,
            forecast_policy: ForecastPolicy::Truncate,
        }
    }
}

pub struct ThermalEngine {
    config: GreenhouseConfig,
    params: EngineParams,
    flows: HeatFlowModel,
    solar: SolarGainModel,
    humidity: HumidityModel,
    controller: Box<dyn ClimateController>,
}

impl ThermalEngine {
    pub fn new(
        config: GreenhouseConfig,
        params: EngineParams,
        controller: Box<dyn ClimateController>,
    ) -> Result<Self> {
        params.validate()?;

        let flows = HeatFlowModel::new(&config, params.wind_coefficient, params.heater_efficiency);
        let solar = SolarGainModel::new(&config);

        info!(
            controller = controller.name(),
            heater_w = config.heater_capacity_w(),
            mass_kg = config.mass_kg(),
            sub_steps = params.sub_steps,
            policy = %params.forecast_policy,
            "Thermal engine initialized"
        );

        Ok(Self {
            config,
            params,
            flows,
            solar,
            humidity: HumidityModel::default(),
            controller,
        })
    }

    pub fn with_humidity_model(mut self, humidity: HumidityModel) -> Self {
        self.humidity = humidity;
        self
    }

    pub fn config(&self) -> &GreenhouseConfig {
        &self.config
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn controller_name(&self) -> &'static str {
        self.controller.name()
    }

    /// Simulate from the start of the forecast with the configured initial state
    pub fn run(&mut self, forecast: &[ForecastRow]) -> Result<Vec<SimulationState>> {
        self.simulate_step(
            self.params.initial_air_temp_c,
            self.params.initial_mass_temp_c,
            forecast,
            0,
            self.params.steps,
            self.params.horizon,
        )
    }

    /// Simulate `steps` hours starting at `forecast[start_index]`
    ///
    /// The controller keeps its state between calls, so consecutive calls
    /// continue one closed-loop run.
    pub fn simulate_step(
        &mut self,
        initial_air_temp_c: f64,
        initial_mass_temp_c: f64,
        forecast: &[ForecastRow],
        start_index: usize,
        steps: usize,
        horizon: usize,
    ) -> Result<Vec<SimulationState>> {
        if !initial_air_temp_c.is_finite() {
            return Err(TwinError::Configuration(
                "initial air temperature must be finite".to_string(),
            ));
        }
        if horizon == 0 {
            return Err(TwinError::Configuration(
                "controller horizon must be at least one hour".to_string(),
            ));
        }

        let end = start_index.checked_add(steps).unwrap_or(usize::MAX);
        if forecast.len() < end {
            return Err(TwinError::InsufficientForecast {
                required: end,
                available: forecast.len(),
            });
        }
        let full_lookahead = end.saturating_add(horizon);
        match self.params.forecast_policy {
            ForecastPolicy::Strict if forecast.len() < full_lookahead => {
                return Err(TwinError::InsufficientForecast {
                    required: full_lookahead,
                    available: forecast.len(),
                });
            }
            ForecastPolicy::Truncate if forecast.len().saturating_add(1) < full_lookahead => {
                warn!(
                    available = forecast.len(),
                    wanted = full_lookahead - 1,
                    "Forecast too short for the full lookahead, truncating horizon"
                );
            }
            _ => {}
        }

        validate_series(forecast)?;

        let mut mass = ThermalMassNode::for_greenhouse(
            &self.config,
            self.params.air_mass_exchange_w_k,
            initial_mass_temp_c,
        )?;

        let points: Vec<HorizonPoint> = forecast
            .iter()
            .map(|row| HorizonPoint {
                timestamp: row.timestamp,
                exterior_temp_c: row.exterior_temp_c,
                solar_gain_w: self.solar.gain_w(&row.solar),
            })
            .collect();

        let sub_dt_s = DECISION_INTERVAL_S / f64::from(self.params.sub_steps);
        let capacitance = self.config.air_capacitance_j_k() + self.config.mass_capacitance_j_k();
        let mass_fraction = self.params.mass_solar_fraction;

        let mut air = initial_air_temp_c;
        let mut humidity = self.params.initial_humidity_pct;
        let mut states = Vec::with_capacity(steps);

        for k in start_index..end {
            let window = &points[k..k.saturating_add(horizon).min(points.len())];
            let actuation = self.controller.decide(air, window);

            let row = &forecast[k];
            let ext = row.exterior_temp_c;
            let solar_w = points[k].solar_gain_w;
            let heating_w = self.flows.heating_gain_w(actuation.heater_on, actuation.part_load);
            let to_mass_w = mass_fraction * solar_w;
            let to_air_w = (1.0 - mass_fraction) * solar_w;

            for _ in 0..self.params.sub_steps {
                let loss_w = self.flows.heat_loss_w(air, ext, row.wind_speed_m_s);
                let vent_w = self.flows.ventilation_loss_w(air, ext, actuation.vent_ach);

                mass.update_temperature(to_mass_w, air, sub_dt_s);
                let exchange_w = -mass.exchange_from_air_w(air);

                let net_w = to_air_w + heating_w + exchange_w - loss_w - vent_w;
                air += net_w * sub_dt_s / capacitance;
            }

            if !air.is_finite() || !mass.temp_c().is_finite() {
                return Err(TwinError::NumericalDegeneracy(format!(
                    "temperatures diverged at {} (air {}, mass {})",
                    row.timestamp,
                    air,
                    mass.temp_c()
                )));
            }

            humidity = self.humidity.next(
                humidity,
                row.humidity_pct,
                actuation.heater_on,
                actuation.is_venting(),
            );

            debug!(
                hour = %row.timestamp,
                air_temp_c = air,
                mass_temp_c = mass.temp_c(),
                heater_on = actuation.heater_on,
                vent_ach = actuation.vent_ach,
                "Simulated hour"
            );

            states.push(SimulationState {
                timestamp: row.timestamp,
                exterior_temp_c: ext,
                air_temp_c: air,
                mass_temp_c: mass.temp_c(),
                humidity_pct: humidity,
                heater_on: actuation.heater_on,
                part_load: actuation.part_load,
                vent_ach: actuation.vent_ach,
                solar_gain_w: solar_w,
                heating_gain_w: heating_w,
                heat_loss_w: self.flows.heat_loss_w(air, ext, row.wind_speed_m_s),
                ventilation_loss_w: self.flows.ventilation_loss_w(air, ext, actuation.vent_ach),
                exchange_w: -mass.exchange_from_air_w(air),
            });
        }

        match states.iter().map(|s| s.air_temp_c).minmax() {
            MinMaxResult::MinMax(lo, hi) => {
                info!(steps, "Simulation completed, air {:.1}-{:.1}°C", lo, hi)
            }
            MinMaxResult::OneElement(t) => info!(steps, "Simulation completed, air {:.1}°C", t),
            MinMaxResult::NoElements => info!("Simulation completed with no steps"),
        }

        Ok(states)
    }
}
