use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use super::tariff::{TouPeriod, TouRates, TouTariff};
use crate::domain::SimulationState;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EnergyParams {
    /// Electricity drawn per hour of full-load heating (kWh)
    #[validate(range(min = 0.0))]
    pub heat_kwh_per_hour: f64,
    /// Electricity drawn per hour of venting (kWh)
    #[validate(range(min = 0.0))]
    pub vent_kwh_per_hour: f64,
    #[validate(nested)]
    pub rates: TouRates,
}

impl Default for EnergyParams {
    fn default() -> Self {
        Self {
            heat_kwh_per_hour: 2.0,
            vent_kwh_per_hour: 0.5,
            rates: TouRates::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyRow {
    pub timestamp: DateTime<FixedOffset>,
    pub period: TouPeriod,
    pub rate: f64,
    pub energy_kwh: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyReport {
    pub rows: Vec<EnergyRow>,
    pub total_kwh: f64,
    pub total_cost: f64,
}

/// Converts simulated actuation into energy use and cost
#[derive(Debug, Clone)]
pub struct EnergyAccounting {
    params: EnergyParams,
    tariff: TouTariff,
}

impl EnergyAccounting {
    pub fn new(params: EnergyParams) -> Result<Self> {
        params.validate()?;
        let tariff = TouTariff::new(params.rates);
        Ok(Self { params, tariff })
    }

    pub fn with_tariff(mut self, tariff: TouTariff) -> Self {
        self.tariff = tariff;
        self
    }

    pub fn tariff(&self) -> &TouTariff {
        &self.tariff
    }

    /// Energy for one simulated hour
    ///
    /// Heating is `heat_kwh_per_hour` scaled by the hour's part-load fraction
    /// (clamped to 0..=1), so modulating controllers bill proportionally. The
    /// built-in controllers always run at full load, which reduces this to
    /// `heater_on × heat_kwh_per_hour`. Venting counts as on/off.
    pub fn hourly_kwh(&self, state: &SimulationState) -> f64 {
        let heating = if state.heater_on {
            self.params.heat_kwh_per_hour * state.part_load.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let venting = if state.vent_ach > 0.0 {
            self.params.vent_kwh_per_hour
        } else {
            0.0
        };
        heating + venting
    }

    pub fn estimate(&self, states: &[SimulationState]) -> EnergyReport {
        let rows: Vec<EnergyRow> = states
            .iter()
            .map(|state| {
                let (period, rate) = self.tariff.classify(state.timestamp);
                let energy_kwh = self.hourly_kwh(state);
                EnergyRow {
                    timestamp: state.timestamp,
                    period,
                    rate,
                    energy_kwh,
                    cost: energy_kwh * rate,
                }
            })
            .collect();

        let total_kwh = rows.iter().map(|r| r.energy_kwh).sum();
        let total_cost = rows.iter().map(|r| r.cost).sum();
        debug!(hours = rows.len(), total_kwh, total_cost, "Energy estimated");

        EnergyReport {
            rows,
            total_kwh,
            total_cost,
        }
    }
}
