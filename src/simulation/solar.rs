//! # Solar Gain
//!
//! Converts forecast irradiance into heat entering the greenhouse through
//! its glazing.
//!
//! - Plane-of-array irradiance on the glazing uses the isotropic sky model
//!   (beam + sky diffuse + ground-reflected)
//! - Cloud cover attenuates clear-sky GHI by `1 − 0.75·CF³`
//! - The Erbs correlation splits GHI into direct-normal and diffuse parts

use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::geometry::GreenhouseConfig;
use crate::domain::SolarInput;

/// Extraterrestrial irradiance at mean sun-earth distance (W/m²)
const SOLAR_CONSTANT: f64 = 1367.0;
/// Beyond this zenith the beam component is discarded
const MAX_BEAM_ZENITH_DEG: f64 = 87.0;
const MIN_COS_ZENITH: f64 = 0.065;

/// Glazing-side solar gain calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarGainModel {
    glazing_area_m2: f64,
    transmittance: f64,
    surface_tilt_deg: f64,
    surface_azimuth_deg: f64,
    albedo: f64,
}

impl SolarGainModel {
    pub fn new(config: &GreenhouseConfig) -> Self {
        let params = config.params();
        Self {
            glazing_area_m2: config.glazing_area_m2(),
            transmittance: params.glazing_transmittance,
            surface_tilt_deg: params.surface_tilt_deg,
            surface_azimuth_deg: params.orientation_deg,
            albedo: config.constants().albedo,
        }
    }

    /// Heat entering through the glazing for one forecast row (W)
    pub fn gain_w(&self, solar: &SolarInput) -> f64 {
        match *solar {
            SolarInput::Delivered { watts } => watts.max(0.0),
            SolarInput::Components {
                ghi,
                dni,
                dhi,
                zenith_deg,
                azimuth_deg,
            } => {
                if ghi <= 0.0 {
                    return 0.0;
                }
                let poa = self.plane_of_array(ghi, dni, dhi, zenith_deg, azimuth_deg);
                poa * self.glazing_area_m2 * self.transmittance
            }
        }
    }

    /// Irradiance on the glazing plane (W/m²)
    pub fn plane_of_array(
        &self,
        ghi: f64,
        dni: f64,
        dhi: f64,
        zenith_deg: f64,
        azimuth_deg: f64,
    ) -> f64 {
        let tilt = self.surface_tilt_deg.to_radians();

        let beam = if zenith_deg < 90.0 {
            dni.max(0.0) * self.incidence_cosine(zenith_deg, azimuth_deg)
        } else {
            0.0
        };
        let diffuse = dhi.max(0.0) * (1.0 + tilt.cos()) / 2.0;
        let ground = ghi.max(0.0) * self.albedo * (1.0 - tilt.cos()) / 2.0;

        beam + diffuse + ground
    }

    /// Cosine of the angle between the sun and the surface normal, zero when the sun is behind it
    fn incidence_cosine(&self, zenith_deg: f64, azimuth_deg: f64) -> f64 {
        let zenith = zenith_deg.to_radians();
        let tilt = self.surface_tilt_deg.to_radians();
        let relative_azimuth = (azimuth_deg - self.surface_azimuth_deg).to_radians();

        let cos_theta = zenith.cos() * tilt.cos() + zenith.sin() * tilt.sin() * relative_azimuth.cos();
        cos_theta.max(0.0)
    }
}

/// Fraction of clear-sky GHI that passes a given cloud cover (percent)
pub fn cloud_transmittance(cloud_cover_pct: f64) -> f64 {
    let cf = (cloud_cover_pct / 100.0).clamp(0.0, 1.0);
    (1.0 - 0.75 * cf.powi(3)).clamp(0.0, 1.0)
}

/// Split GHI into (DNI, DHI) with the Erbs diffuse-fraction correlation
pub fn erbs_decomposition(ghi: f64, zenith_deg: f64, timestamp: DateTime<FixedOffset>) -> (f64, f64) {
    if ghi <= 0.0 || !ghi.is_finite() {
        return (0.0, 0.0);
    }

    let day_of_year = timestamp.ordinal() as f64;
    let extraterrestrial = SOLAR_CONSTANT * (1.0 + 0.033 * (2.0 * PI * day_of_year / 365.0).cos());
    let cos_zenith = zenith_deg.to_radians().cos().max(MIN_COS_ZENITH);

    let kt = (ghi / (extraterrestrial * cos_zenith)).clamp(0.0, 1.0);
    let diffuse_fraction = if kt <= 0.22 {
        1.0 - 0.09 * kt
    } else if kt <= 0.80 {
        0.9511 - 0.1604 * kt + 4.388 * kt.powi(2) - 16.638 * kt.powi(3) + 12.336 * kt.powi(4)
    } else {
        0.165
    };

    let dhi = diffuse_fraction * ghi;
    let dni = if zenith_deg > MAX_BEAM_ZENITH_DEG {
        0.0
    } else {
        ((ghi - dhi) / cos_zenith).max(0.0)
    };

    (dni, dhi)
}
