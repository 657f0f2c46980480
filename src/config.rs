use anyhow::{Context, Result};
use chrono_tz::Tz;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::controller::ControllerParams;
use crate::energy::{EnergyAccounting, EnergyParams, TouTariff};
use crate::error::TwinError;
use crate::simulation::{ConstructionParams, EngineParams, GreenhouseConfig, Location};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const ENV_PREFIX: &str = "GREENHOUSE__";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub site: SiteConfig,
    #[validate(nested)]
    pub construction: ConstructionParams,
    #[validate(nested)]
    pub controller: ControllerParams,
    #[validate(nested)]
    pub simulation: EngineParams,
    #[validate(nested)]
    pub energy: EnergyParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SiteConfig {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// Local clock for the time-of-use tariff; unset bills on each
    /// forecast timestamp's own offset
    pub timezone: Option<Tz>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let location = Location::default();
        Self {
            latitude: location.latitude,
            longitude: location.longitude,
            timezone: None,
        }
    }
}

impl SiteConfig {
    pub fn location(&self) -> Location {
        Location {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file, then `GREENHOUSE__SECTION__KEY` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("failed to load configuration from {}", file.display()))?;
        config.validate().map_err(TwinError::from)?;
        Ok(config)
    }

    pub fn greenhouse(&self) -> crate::Result<GreenhouseConfig> {
        GreenhouseConfig::new(self.site.location(), self.construction.clone())
    }

    pub fn energy_accounting(&self) -> crate::Result<EnergyAccounting> {
        let mut tariff = TouTariff::new(self.energy.rates);
        if let Some(tz) = self.site.timezone {
            tariff = tariff.with_timezone(tz);
        }
        Ok(EnergyAccounting::new(self.energy.clone())?.with_tariff(tariff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::TouPeriod;
    use crate::simulation::ForecastPolicy;
    use chrono::{FixedOffset, TimeZone};
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            assert_eq!(config.controller.set_point_c, 18.0);
            assert_eq!(config.simulation.forecast_policy, ForecastPolicy::Truncate);
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "greenhouse.toml",
                r#"
                [site]
                latitude = 37.34
                longitude = -121.89
                timezone = "America/Los_Angeles"

                [controller]
                set_point_c = 16.0
                min_on_steps = 2

                [simulation]
                steps = 48
                forecast_policy = "strict"

                [energy.rates]
                peak = 0.40
                "#,
            )?;
            jail.set_env("GREENHOUSE__CONTROLLER__SET_POINT_C", "20.5");

            let config = Config::load(Some(Path::new("greenhouse.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.site.timezone, Some(chrono_tz::America::Los_Angeles));
            assert_eq!(config.controller.set_point_c, 20.5);
            assert_eq!(config.controller.min_on_steps, 2);
            assert_eq!(config.controller.min_off_steps, 3);
            assert_eq!(config.simulation.steps, 48);
            assert_eq!(config.simulation.forecast_policy, ForecastPolicy::Strict);
            assert_eq!(config.energy.rates.peak, 0.40);
            assert_eq!(config.energy.rates.off_peak, 0.1243);
            Ok(())
        });
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "bad.toml",
                r#"
                [construction]
                heater_safety_factor = 2.5
                "#,
            )?;
            let err = Config::load(Some(Path::new("bad.toml"))).unwrap_err();
            assert!(err.to_string().contains("heater_safety_factor"));
            Ok(())
        });
    }

    #[test]
    fn test_builds_greenhouse_and_accounting() {
        let config = Config::default();
        let greenhouse = config.greenhouse().unwrap();
        assert_eq!(greenhouse.location(), Location::default());
        assert!(config.energy_accounting().is_ok());
    }

    #[test]
    fn test_default_tariff_uses_row_offset() {
        let config = Config::default();
        assert_eq!(config.site.timezone, None);

        // Wednesday 17:00 local at -05:00 is 22:00 UTC
        let ts = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 15, 17, 0, 0)
            .unwrap();
        let accounting = config.energy_accounting().unwrap();
        assert_eq!(accounting.tariff().classify(ts), (TouPeriod::Peak, 0.3065));
    }

    #[test]
    fn test_configured_timezone_overrides_row_offset() {
        let mut config = Config::default();
        config.site.timezone = Some(Tz::UTC);
        let ts = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 15, 17, 0, 0)
            .unwrap();
        let accounting = config.energy_accounting().unwrap();
        assert_eq!(accounting.tariff().period(ts), TouPeriod::OffPeak);
    }
}
