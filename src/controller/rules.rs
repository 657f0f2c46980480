use chrono::Timelike;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ClimateController, HorizonPoint};
use crate::domain::Actuation;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ThermostatConfig {
    pub target_temp_c: f64,
    #[validate(range(min = 0.0))]
    pub hysteresis_c: f64,
    /// Vents open above this air temperature
    pub vent_above_c: f64,
    #[validate(range(min = 0.0))]
    pub vent_ach: f64,
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            target_temp_c: 18.0,
            hysteresis_c: 1.5,
            vent_above_c: 27.0,
            vent_ach: 2.0,
        }
    }
}

/// Bang-bang heater with a hysteresis band, no forecast
pub struct ThermostatController {
    config: ThermostatConfig,
    is_running: bool,
}

impl ThermostatController {
    pub fn new(config: ThermostatConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            is_running: false,
        })
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }
}

impl ClimateController for ThermostatController {
    fn decide(&mut self, air_temp_c: f64, _horizon: &[HorizonPoint]) -> Actuation {
        if self.is_running {
            if air_temp_c > self.config.target_temp_c + self.config.hysteresis_c {
                self.is_running = false;
            }
        } else if air_temp_c < self.config.target_temp_c - self.config.hysteresis_c {
            self.is_running = true;
        }

        let vent_ach = if air_temp_c > self.config.vent_above_c {
            self.config.vent_ach
        } else {
            0.0
        };

        Actuation {
            heater_on: self.is_running,
            part_load: if self.is_running { 1.0 } else { 0.0 },
            vent_ach,
        }
    }

    fn name(&self) -> &'static str {
        "thermostat"
    }
}

/// Fixed daily heating and venting hours (local clock of the forecast)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Heat during hours strictly before this one
    #[validate(range(max = 24))]
    pub heat_before_hour: u32,
    /// Heat during hours strictly after this one
    #[validate(range(max = 23))]
    pub heat_after_hour: u32,
    #[validate(range(max = 23))]
    pub vent_start_hour: u32,
    /// Inclusive
    #[validate(range(max = 23))]
    pub vent_end_hour: u32,
    #[validate(range(min = 0.0))]
    pub vent_ach: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            heat_before_hour: 7,
            heat_after_hour: 20,
            vent_start_hour: 12,
            vent_end_hour: 16,
            vent_ach: 2.0,
        }
    }
}

pub struct ScheduleController {
    config: ScheduleConfig,
}

impl ScheduleController {
    pub fn new(config: ScheduleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    fn heating_hour(&self, hour: u32) -> bool {
        hour < self.config.heat_before_hour || hour > self.config.heat_after_hour
    }

    fn venting_hour(&self, hour: u32) -> bool {
        (self.config.vent_start_hour..=self.config.vent_end_hour).contains(&hour)
    }
}

impl ClimateController for ScheduleController {
    fn decide(&mut self, _air_temp_c: f64, horizon: &[HorizonPoint]) -> Actuation {
        let Some(now) = horizon.first() else {
            return Actuation::idle();
        };
        let hour = now.timestamp.hour();

        let mut actuation = if self.heating_hour(hour) {
            Actuation::heating()
        } else {
            Actuation::idle()
        };
        if self.venting_hour(hour) {
            actuation = actuation.with_vent(self.config.vent_ach);
        }
        actuation
    }

    fn name(&self) -> &'static str {
        "schedule"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, TimeZone};
    use rstest::rstest;

    fn at_hour(hour: u32) -> Vec<HorizonPoint> {
        let ts: DateTime<FixedOffset> = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 15, hour, 0, 0)
            .unwrap();
        vec![HorizonPoint {
            timestamp: ts,
            exterior_temp_c: 0.0,
            solar_gain_w: 0.0,
        }]
    }

    #[test]
    fn test_thermostat_hysteresis() {
        let mut t = ThermostatController::new(ThermostatConfig::default()).unwrap();
        assert!(!t.decide(17.0, &[]).heater_on);
        assert!(t.decide(16.4, &[]).heater_on);
        // Keeps running inside the band
        assert!(t.decide(18.0, &[]).heater_on);
        assert!(t.decide(19.5, &[]).heater_on);
        assert!(!t.decide(19.6, &[]).heater_on);
        assert!(!t.is_running());
    }

    #[test]
    fn test_thermostat_vents_when_hot() {
        let mut t = ThermostatController::new(ThermostatConfig::default()).unwrap();
        let act = t.decide(30.0, &[]);
        assert!(!act.heater_on);
        assert_eq!(act.vent_ach, 2.0);
        assert_eq!(t.decide(26.0, &[]).vent_ach, 0.0);
    }

    #[test]
    fn test_thermostat_rejects_negative_hysteresis() {
        let cfg = ThermostatConfig {
            hysteresis_c: -1.0,
            ..Default::default()
        };
        assert!(ThermostatController::new(cfg).is_err());
    }

    #[rstest]
    #[case(0, true, false)]
    #[case(6, true, false)]
    #[case(7, false, false)]
    #[case(12, false, true)]
    #[case(16, false, true)]
    #[case(17, false, false)]
    #[case(20, false, false)]
    #[case(21, true, false)]
    #[case(23, true, false)]
    fn test_schedule_hours(#[case] hour: u32, #[case] heat: bool, #[case] vent: bool) {
        let mut s = ScheduleController::new(ScheduleConfig::default()).unwrap();
        let act = s.decide(15.0, &at_hour(hour));
        assert_eq!(act.heater_on, heat);
        assert_eq!(act.is_venting(), vent);
    }

    #[test]
    fn test_schedule_idle_without_horizon() {
        let mut s = ScheduleController::new(ScheduleConfig::default()).unwrap();
        assert_eq!(s.decide(5.0, &[]), Actuation::idle());
    }
}
