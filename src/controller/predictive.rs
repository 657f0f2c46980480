//! Forecast-driven heating and venting controller
//!
//! Each decision rolls the greenhouse forward over the lookahead window
//! with the heater off, using a single-node exponential-decay model of the
//! combined air and solid mass:
//!
//! `T[k] = T_ext[k−1] + (T[k−1] − T_ext[k−1])·e^(−UA·Δt/C) + Q_solar[k−1]·Δt/C`
//!
//! If that unforced trajectory falls below the comfort band within the time
//! the heater needs to warm the house, the heater is switched on ahead of
//! the breach. Minimum on/off dwell times stop the heater from chattering;
//! only a hard comfort-band breach overrides them.

use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use super::{ClimateController, HorizonPoint, DECISION_INTERVAL_S};
use crate::domain::Actuation;
use crate::error::{Result, TwinError};
use crate::simulation::geometry::GreenhouseConfig;

/// Guards the warm-up lead time when the coldest forecast hour reaches the set-point
const LEAD_EPSILON_K: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ControllerParams {
    #[validate(range(min = -20.0, max = 45.0))]
    pub set_point_c: f64,
    /// Full width of the comfort band around the set-point (K)
    #[validate(range(exclusive_min = 0.0))]
    pub deadband_c: f64,
    /// Extra margin below the band before the forecast triggers pre-heating (K)
    #[validate(range(min = 0.0))]
    pub safety_margin_c: f64,
    /// Margin above the band before the forecast triggers venting (K)
    #[validate(range(min = 0.0))]
    pub vent_excess_margin_c: f64,
    #[validate(range(min = 1))]
    pub min_on_steps: u32,
    #[validate(range(min = 1))]
    pub min_off_steps: u32,
}

impl Default for ControllerParams {
    fn default() -> Self {
        Self {
            set_point_c: 18.0,
            deadband_c: 3.0,
            safety_margin_c: 0.5,
            vent_excess_margin_c: 5.0,
            min_on_steps: 3,
            min_off_steps: 3,
        }
    }
}

/// Single-node approximation of the greenhouse used for prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LumpedModel {
    /// Air plus solid-mass heat capacity (J/K)
    pub capacitance_j_k: f64,
    /// Envelope, leakage and air-mass exchange conductance (W/K)
    pub conductance_w_k: f64,
    pub heater_w: f64,
    pub vent_max_ach: f64,
}

impl LumpedModel {
    pub fn for_greenhouse(config: &GreenhouseConfig, air_mass_exchange_w_k: f64) -> Self {
        Self {
            capacitance_j_k: config.mass_capacitance_j_k() + config.air_capacitance_j_k(),
            conductance_w_k: config.ua_envelope_w_k()
                + config.infiltration_conductance_w_k()
                + air_mass_exchange_w_k,
            heater_w: config.heater_capacity_w() as f64,
            vent_max_ach: config.design_vent_ach(),
        }
    }
}

/// Persisted heater state and dwell counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerState {
    pub heater_on: bool,
    /// Consecutive decisions the heater has been held on
    pub on_steps: u32,
    /// Consecutive decisions the heater has been held off
    pub off_steps: u32,
}

#[derive(Debug)]
pub struct PredictiveController {
    params: ControllerParams,
    model: LumpedModel,
    /// Per-interval decay factor e^(−UA·Δt/C)
    decay: f64,
    state: ControllerState,
}

impl PredictiveController {
    pub fn new(model: LumpedModel, params: ControllerParams) -> Result<Self> {
        // Range checks let NaN through
        let bounds = [
            params.set_point_c,
            params.deadband_c,
            params.safety_margin_c,
            params.vent_excess_margin_c,
        ];
        if bounds.iter().any(|v| !v.is_finite()) {
            return Err(TwinError::Configuration(format!(
                "controller set-point, deadband and margins must be finite: {:?}",
                params
            )));
        }
        params.validate()?;

        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(model.capacitance_j_k) || !positive(model.conductance_w_k) || !positive(model.heater_w)
        {
            return Err(TwinError::Configuration(format!(
                "lumped model must have positive capacitance, conductance and heater power: {:?}",
                model
            )));
        }
        if !(model.vent_max_ach.is_finite() && model.vent_max_ach >= 0.0) {
            return Err(TwinError::Configuration(format!(
                "maximum ventilation rate must be non-negative, got {}",
                model.vent_max_ach
            )));
        }

        let decay = (-model.conductance_w_k * DECISION_INTERVAL_S / model.capacitance_j_k).exp();

        // Starts idle with a settled off-dwell: no earlier switch to protect
        let state = ControllerState {
            heater_on: false,
            on_steps: 0,
            off_steps: params.min_off_steps,
        };

        Ok(Self {
            params,
            model,
            decay,
            state,
        })
    }

    pub fn for_greenhouse(
        config: &GreenhouseConfig,
        params: ControllerParams,
        air_mass_exchange_w_k: f64,
    ) -> Result<Self> {
        Self::new(LumpedModel::for_greenhouse(config, air_mass_exchange_w_k), params)
    }

    pub fn params(&self) -> &ControllerParams {
        &self.params
    }

    pub fn model(&self) -> &LumpedModel {
        &self.model
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Below this the heater is forced on
    pub fn comfort_low_c(&self) -> f64 {
        self.params.set_point_c - self.params.deadband_c / 2.0
    }

    /// Above this the heater is forced off
    pub fn comfort_high_c(&self) -> f64 {
        self.params.set_point_c + self.params.deadband_c / 2.0
    }

    fn preheat_trigger_c(&self) -> f64 {
        self.comfort_low_c() - self.params.safety_margin_c
    }

    fn vent_trigger_c(&self) -> f64 {
        self.comfort_high_c() + self.params.vent_excess_margin_c
    }

    /// Heater-off temperature trajectory; element 0 is the current air temperature
    pub fn predict_unforced(&self, air_temp_c: f64, horizon: &[HorizonPoint]) -> Vec<f64> {
        let dt_over_c = DECISION_INTERVAL_S / self.model.capacitance_j_k;
        let mut temps = Vec::with_capacity(horizon.len().max(1));
        temps.push(air_temp_c);

        for prev_point in horizon.iter().take(horizon.len().saturating_sub(1)) {
            let prev = temps[temps.len() - 1];
            let next = prev_point.exterior_temp_c
                + (prev - prev_point.exterior_temp_c) * self.decay
                + prev_point.solar_gain_w * dt_over_c;
            temps.push(next);
        }
        temps
    }

    /// Intervals the heater needs to pull the house up against the coldest forecast hour
    pub fn lead_steps(&self, horizon: &[HorizonPoint]) -> usize {
        let Some(min_ext) = horizon
            .iter()
            .map(|p| p.exterior_temp_c)
            .reduce(f64::min)
        else {
            return 0;
        };

        let gap = (self.params.set_point_c - min_ext).max(LEAD_EPSILON_K);
        let tau_s = self.model.capacitance_j_k / (self.model.conductance_w_k + self.model.heater_w / gap);
        (tau_s / DECISION_INTERVAL_S).ceil() as usize
    }

    /// Hold the current heater state until its minimum dwell has elapsed
    fn apply_dwell(&mut self, wanted_on: bool) -> bool {
        let s = &mut self.state;
        if s.heater_on {
            s.on_steps = s.on_steps.saturating_add(1);
            s.off_steps = 0;
            if s.on_steps < self.params.min_on_steps {
                return true;
            }
        } else {
            s.off_steps = s.off_steps.saturating_add(1);
            s.on_steps = 0;
            if s.off_steps < self.params.min_off_steps {
                return false;
            }
        }
        wanted_on
    }
}

impl ClimateController for PredictiveController {
    fn decide(&mut self, air_temp_c: f64, horizon: &[HorizonPoint]) -> Actuation {
        let (wanted_on, need_vent) = if horizon.len() < 2 {
            (self.state.heater_on, false)
        } else {
            let predicted = self.predict_unforced(air_temp_c, horizon);
            let trigger = self.preheat_trigger_c();
            let drop_idx = predicted.iter().position(|&t| t < trigger);
            let lead = self.lead_steps(horizon);
            let vent = predicted.iter().any(|&t| t > self.vent_trigger_c());
            (drop_idx.is_some_and(|i| i <= lead), vent)
        };

        let was_on = self.state.heater_on;
        let mut heater_on = self.apply_dwell(wanted_on);

        if air_temp_c > self.comfort_high_c() {
            if heater_on {
                debug!(air_temp_c, "comfort band exceeded, forcing heater off");
            }
            heater_on = false;
        }
        if air_temp_c < self.comfort_low_c() {
            if !heater_on {
                debug!(air_temp_c, "comfort band breached, forcing heater on");
            }
            heater_on = true;
        }

        if heater_on != was_on {
            debug!(
                heater_on,
                air_temp_c,
                on_steps = self.state.on_steps,
                off_steps = self.state.off_steps,
                "heater switched"
            );
        }
        self.state.heater_on = heater_on;

        Actuation {
            heater_on,
            part_load: if heater_on { 1.0 } else { 0.0 },
            vent_ach: if need_vent { self.model.vent_max_ach } else { 0.0 },
        }
    }

    fn name(&self) -> &'static str {
        "predictive"
    }
}
