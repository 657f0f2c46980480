use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TwinError};
use crate::simulation::solar::{cloud_transmittance, erbs_decomposition};

/// Solar forcing carried by a forecast row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SolarInput {
    /// Solar power already entering the glazing (W)
    Delivered { watts: f64 },
    /// Horizontal irradiance components (W/m²) and sun position (degrees)
    Components {
        ghi: f64,
        dni: f64,
        dhi: f64,
        zenith_deg: f64,
        azimuth_deg: f64,
    },
}

impl Default for SolarInput {
    fn default() -> Self {
        Self::Delivered { watts: 0.0 }
    }
}

impl SolarInput {
    /// Build irradiance components from a clear-sky GHI attenuated by cloud cover
    ///
    /// Cloud attenuation uses the empirical `1 - 0.75·CF³` factor and the
    /// attenuated GHI is split into beam and diffuse parts with the Erbs
    /// correlation.
    pub fn from_clear_sky(
        timestamp: DateTime<FixedOffset>,
        clear_sky_ghi: f64,
        cloud_cover_pct: f64,
        zenith_deg: f64,
        azimuth_deg: f64,
    ) -> Self {
        let ghi = (clear_sky_ghi * cloud_transmittance(cloud_cover_pct)).max(0.0);
        let (dni, dhi) = erbs_decomposition(ghi, zenith_deg, timestamp);
        Self::Components {
            ghi,
            dni,
            dhi,
            zenith_deg,
            azimuth_deg,
        }
    }

    fn is_finite(&self) -> bool {
        match *self {
            Self::Delivered { watts } => watts.is_finite(),
            Self::Components {
                ghi,
                dni,
                dhi,
                zenith_deg,
                azimuth_deg,
            } => [ghi, dni, dhi, zenith_deg, azimuth_deg]
                .iter()
                .all(|v| v.is_finite()),
        }
    }
}

/// One hourly row of the exterior forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub timestamp: DateTime<FixedOffset>,
    /// Exterior dry-bulb temperature (°C)
    pub exterior_temp_c: f64,
    #[serde(default)]
    pub wind_speed_m_s: f64,
    #[serde(default)]
    pub solar: SolarInput,
    /// Exterior relative humidity (%), required
    pub humidity_pct: f64,
    #[serde(default)]
    pub cloud_cover_pct: f64,
}

impl ForecastRow {
    /// Row with no solar forcing and still air
    pub fn calm(timestamp: DateTime<FixedOffset>, exterior_temp_c: f64) -> Self {
        Self {
            timestamp,
            exterior_temp_c,
            wind_speed_m_s: 0.0,
            solar: SolarInput::default(),
            humidity_pct: 50.0,
            cloud_cover_pct: 0.0,
        }
    }

    pub fn with_wind(mut self, wind_speed_m_s: f64) -> Self {
        self.wind_speed_m_s = wind_speed_m_s;
        self
    }

    pub fn with_solar(mut self, solar: SolarInput) -> Self {
        self.solar = solar;
        self
    }

    pub fn with_humidity(mut self, humidity_pct: f64) -> Self {
        self.humidity_pct = humidity_pct;
        self
    }
}

/// Check that a forecast series is usable by the engine
///
/// Timestamps must be strictly increasing and every numeric field finite.
pub fn validate_series(rows: &[ForecastRow]) -> Result<()> {
    for (i, row) in rows.iter().enumerate() {
        if !row.exterior_temp_c.is_finite()
            || !row.wind_speed_m_s.is_finite()
            || !row.humidity_pct.is_finite()
            || !row.solar.is_finite()
        {
            return Err(TwinError::InvalidForecast(format!(
                "row {} ({}) contains a non-finite value",
                i, row.timestamp
            )));
        }
        if !(0.0..=100.0).contains(&row.humidity_pct) {
            return Err(TwinError::InvalidForecast(format!(
                "row {} has humidity {} outside 0-100 %",
                i, row.humidity_pct
            )));
        }
        if row.wind_speed_m_s < 0.0 {
            return Err(TwinError::InvalidForecast(format!(
                "row {} has negative wind speed {}",
                i, row.wind_speed_m_s
            )));
        }
    }

    if let Some((i, pair)) = rows
        .windows(2)
        .enumerate()
        .find(|(_, w)| w[1].timestamp <= w[0].timestamp)
    {
        return Err(TwinError::InvalidForecast(format!(
            "timestamps not increasing at row {}: {} -> {}",
            i + 1,
            pair[0].timestamp,
            pair[1].timestamp
        )));
    }

    Ok(())
}
