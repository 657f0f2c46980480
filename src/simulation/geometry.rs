//! # Greenhouse Geometry
//!
//! Derives the static geometry and thermal constants of a fully glazed,
//! arch-roofed greenhouse from a handful of construction parameters.
//!
//! All derived quantities are pure functions of [`ConstructionParams`] and
//! [`ModelConstants`]. A [`GreenhouseConfig`] is immutable once built; to
//! change a parameter, rebuild it with [`GreenhouseConfig::with_construction`].

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Result, TwinError};

/// Divide an imperial R-value (ft²·°F·h/BTU) by this to get m²·K/W
const R_IP_TO_SI: f64 = 5.678263;
const FT_TO_M: f64 = 0.3048;
const FT3_TO_M3: f64 = 0.0283168;

/// Physical constants of the model
///
/// These are properties of the materials and of air, not user input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelConstants {
    pub air_density_kg_m3: f64,
    pub air_specific_heat_j_kg_k: f64,
    /// Extra roof area of the curved arch relative to the floor
    pub arch_factor: f64,
    pub glazing_u_value_w_m2_k: f64,
    pub albedo: f64,
    pub concrete_density_kg_m3: f64,
    pub soil_density_kg_m3: f64,
    /// Fraction of the soil below the floor that is thermally linked to the air
    pub soil_coupling_factor: f64,
    pub soil_depth_m: f64,
    pub footing_volume_m3: f64,
    /// Plants, benches and structure
    pub fixed_mass_kg: f64,
    pub mass_specific_heat_j_kg_k: f64,
}

impl Default for ModelConstants {
    fn default() -> Self {
        Self {
            air_density_kg_m3: 1.225,
            air_specific_heat_j_kg_k: 1005.0,
            arch_factor: 1.15,
            glazing_u_value_w_m2_k: 3.2,
            albedo: 0.20,
            concrete_density_kg_m3: 2400.0,
            soil_density_kg_m3: 1600.0,
            soil_coupling_factor: 0.30,
            soil_depth_m: 2.0 * FT_TO_M,
            footing_volume_m3: 12.0 * FT3_TO_M3,
            fixed_mass_kg: 200.0,
            mass_specific_heat_j_kg_k: 920.0,
        }
    }
}

/// Site coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct Location {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl Default for Location {
    fn default() -> Self {
        // Pittsburgh, PA
        Self {
            latitude: 40.4406,
            longitude: -79.9959,
        }
    }
}

/// Outer dimensions of the greenhouse (m)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct GreenhouseDimensions {
    #[validate(range(exclusive_min = 0.0))]
    pub length_m: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub width_m: f64,
    /// Ridge height
    #[validate(range(exclusive_min = 0.0))]
    pub height_m: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub sidewall_height_m: f64,
}

impl Default for GreenhouseDimensions {
    fn default() -> Self {
        // Taken from the architectural drawings (37' 8" x 18' 11", 12' ridge, 8' sidewall)
        Self {
            length_m: 37.6666 * FT_TO_M,
            width_m: 18.95 * FT_TO_M,
            height_m: 12.0 * FT_TO_M,
            sidewall_height_m: 8.0 * FT_TO_M,
        }
    }
}

/// Construction parameters a greenhouse is built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ConstructionParams {
    #[validate(nested)]
    pub dimensions: GreenhouseDimensions,
    #[validate(range(min = 1))]
    pub footings: u32,
    /// Indoor-outdoor temperature difference the heater is sized for (K)
    #[validate(range(exclusive_min = 0.0))]
    pub design_delta_t_c: f64,
    #[validate(range(min = 1.3, max = 1.6))]
    pub heater_safety_factor: f64,
    /// Wall azimuth, degrees clockwise from north
    #[validate(range(min = 0.0, max = 360.0))]
    pub orientation_deg: f64,
    #[validate(range(min = 0.0, max = 90.0))]
    pub surface_tilt_deg: f64,
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub glazing_transmittance: f64,
    /// Surface resistances (m²·K/W)
    #[validate(range(exclusive_min = 0.0))]
    pub wall_r_si: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub roof_r_si: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub floor_r_si: f64,
    /// Closed-house leakage (air changes per hour)
    #[validate(range(min = 0.0))]
    pub infiltration_ach: f64,
    /// Ventilation rate with vents fully open (air changes per hour)
    #[validate(range(exclusive_min = 0.0))]
    pub design_vent_ach: f64,
}

impl Default for ConstructionParams {
    fn default() -> Self {
        Self {
            dimensions: GreenhouseDimensions::default(),
            footings: 8,
            design_delta_t_c: 25.0,
            heater_safety_factor: 1.6,
            orientation_deg: 135.0,
            surface_tilt_deg: 90.0,
            glazing_transmittance: 0.78,
            wall_r_si: 3.0 / R_IP_TO_SI,
            roof_r_si: 1.8 / R_IP_TO_SI,
            floor_r_si: 8.0 / R_IP_TO_SI,
            infiltration_ach: 0.30,
            design_vent_ach: 2.0,
        }
    }
}

/// Immutable geometry and thermal constants of one greenhouse
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GreenhouseConfig {
    location: Location,
    params: ConstructionParams,
    constants: ModelConstants,
    floor_area_m2: f64,
    wall_area_m2: f64,
    roof_area_m2: f64,
    glazing_area_m2: f64,
    volume_m3: f64,
    mass_kg: f64,
    ua_envelope_w_k: f64,
    heater_capacity_w: u32,
}

/// Serialisable overview of a built greenhouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreenhouseSummary {
    pub location: Location,
    pub dimensions: GreenhouseDimensions,
    pub floor_area_m2: f64,
    pub volume_m3: f64,
    pub glazing_area_m2: f64,
    pub thermal_mass_kg: f64,
    pub ua_envelope_w_k: f64,
    pub heater_capacity_w: u32,
}

impl GreenhouseConfig {
    pub fn new(location: Location, params: ConstructionParams) -> Result<Self> {
        Self::with_constants(location, params, ModelConstants::default())
    }

    pub fn with_constants(
        location: Location,
        params: ConstructionParams,
        constants: ModelConstants,
    ) -> Result<Self> {
        location.validate()?;
        Self::check_physical(&params)?;

        let dims = params.dimensions;
        let floor_area_m2 = dims.length_m * dims.width_m;
        let wall_area_m2 = 2.0 * (dims.length_m + dims.width_m) * dims.sidewall_height_m;
        let roof_area_m2 = floor_area_m2 * constants.arch_factor;
        // Fully glazed envelope
        let glazing_area_m2 = wall_area_m2 + roof_area_m2;

        // Triangular gable over the sidewalls
        let peak_above_sidewall = dims.height_m - dims.sidewall_height_m;
        let volume_m3 = floor_area_m2 * (peak_above_sidewall / 2.0 + dims.sidewall_height_m);

        let concrete_kg =
            params.footings as f64 * constants.footing_volume_m3 * constants.concrete_density_kg_m3;
        let soil_kg = floor_area_m2
            * constants.soil_depth_m
            * constants.soil_density_kg_m3
            * constants.soil_coupling_factor;
        let mass_kg = concrete_kg + soil_kg + constants.fixed_mass_kg;

        let ua_envelope_w_k = wall_area_m2 / params.wall_r_si
            + roof_area_m2 / params.roof_r_si
            + floor_area_m2 / params.floor_r_si;

        let mass_flow_kg_s = volume_m3 * params.design_vent_ach / 3600.0 * constants.air_density_kg_m3;
        let q_cond = ua_envelope_w_k * params.design_delta_t_c;
        let q_vent = mass_flow_kg_s * constants.air_specific_heat_j_kg_k * params.design_delta_t_c;
        let heater = ((q_cond + q_vent) * params.heater_safety_factor).floor();
        if !heater.is_finite() || heater < 1.0 || heater > u32::MAX as f64 {
            return Err(TwinError::Configuration(format!(
                "heater sizing produced a non-physical capacity: {} W",
                heater
            )));
        }

        Ok(Self {
            location,
            params,
            constants,
            floor_area_m2,
            wall_area_m2,
            roof_area_m2,
            glazing_area_m2,
            volume_m3,
            mass_kg,
            ua_envelope_w_k,
            heater_capacity_w: heater as u32,
        })
    }

    /// Rebuild with new construction parameters, recomputing every derived value
    pub fn with_construction(&self, params: ConstructionParams) -> Result<Self> {
        Self::with_constants(self.location, params, self.constants)
    }

    fn check_physical(params: &ConstructionParams) -> Result<()> {
        params.validate()?;

        let dims = &params.dimensions;
        let values = [
            dims.length_m,
            dims.width_m,
            dims.height_m,
            dims.sidewall_height_m,
            params.design_delta_t_c,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(TwinError::Configuration(
                "dimensions and design temperature difference must be finite".to_string(),
            ));
        }
        if dims.height_m < dims.sidewall_height_m {
            return Err(TwinError::Configuration(format!(
                "ridge height {:.2} m is below sidewall height {:.2} m",
                dims.height_m, dims.sidewall_height_m
            )));
        }
        Ok(())
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn params(&self) -> &ConstructionParams {
        &self.params
    }

    pub fn constants(&self) -> &ModelConstants {
        &self.constants
    }

    pub fn floor_area_m2(&self) -> f64 {
        self.floor_area_m2
    }

    pub fn wall_area_m2(&self) -> f64 {
        self.wall_area_m2
    }

    pub fn roof_area_m2(&self) -> f64 {
        self.roof_area_m2
    }

    pub fn glazing_area_m2(&self) -> f64 {
        self.glazing_area_m2
    }

    pub fn volume_m3(&self) -> f64 {
        self.volume_m3
    }

    pub fn mass_kg(&self) -> f64 {
        self.mass_kg
    }

    pub fn mass_specific_heat(&self) -> f64 {
        self.constants.mass_specific_heat_j_kg_k
    }

    /// Heat capacity of the solid mass (J/K)
    pub fn mass_capacitance_j_k(&self) -> f64 {
        self.mass_kg * self.constants.mass_specific_heat_j_kg_k
    }

    /// Heat capacity of the enclosed air (J/K)
    pub fn air_capacitance_j_k(&self) -> f64 {
        self.constants.air_density_kg_m3 * self.volume_m3 * self.constants.air_specific_heat_j_kg_k
    }

    /// Wall, roof and floor conductance (W/K)
    pub fn ua_envelope_w_k(&self) -> f64 {
        self.ua_envelope_w_k
    }

    /// Glazing conductance, using the glazing U-value (W/K)
    pub fn glazing_conductance_w_k(&self) -> f64 {
        self.glazing_area_m2 * self.constants.glazing_u_value_w_m2_k
    }

    /// Heat carried by `ach` air changes per hour, per kelvin of difference (W/K)
    pub fn air_exchange_conductance_w_k(&self, ach: f64) -> f64 {
        self.volume_m3 * ach / 3600.0
            * self.constants.air_density_kg_m3
            * self.constants.air_specific_heat_j_kg_k
    }

    pub fn infiltration_conductance_w_k(&self) -> f64 {
        self.air_exchange_conductance_w_k(self.params.infiltration_ach)
    }

    pub fn design_vent_ach(&self) -> f64 {
        self.params.design_vent_ach
    }

    pub fn heater_capacity_w(&self) -> u32 {
        self.heater_capacity_w
    }

    pub fn summary(&self) -> GreenhouseSummary {
        GreenhouseSummary {
            location: self.location,
            dimensions: self.params.dimensions,
            floor_area_m2: self.floor_area_m2,
            volume_m3: self.volume_m3,
            glazing_area_m2: self.glazing_area_m2,
            thermal_mass_kg: self.mass_kg,
            ua_envelope_w_k: self.ua_envelope_w_k,
            heater_capacity_w: self.heater_capacity_w,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn build(params: ConstructionParams) -> Result<GreenhouseConfig> {
        GreenhouseConfig::new(Location::default(), params)
    }

    #[test]
    fn test_reference_greenhouse_geometry() {
        let cfg = build(ConstructionParams::default()).unwrap();

        assert_relative_eq!(cfg.floor_area_m2(), 66.3125, max_relative = 1e-4);
        assert_relative_eq!(cfg.wall_area_m2(), 84.1577, max_relative = 1e-4);
        assert_relative_eq!(cfg.roof_area_m2(), 76.2594, max_relative = 1e-4);
        assert_relative_eq!(
            cfg.glazing_area_m2(),
            cfg.wall_area_m2() + cfg.roof_area_m2(),
            max_relative = 1e-12
        );
        assert_relative_eq!(cfg.volume_m3(), 202.1206, max_relative = 1e-4);
    }

    #[test]
    fn test_reference_thermal_mass() {
        let cfg = build(ConstructionParams::default()).unwrap();
        // 8 footings of concrete + coupled soil + plants/benches
        assert_relative_eq!(cfg.mass_kg(), 26_127.8, max_relative = 1e-4);
        assert_relative_eq!(
            cfg.mass_capacitance_j_k(),
            cfg.mass_kg() * 920.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_heater_is_floored_and_includes_safety() {
        let cfg = build(ConstructionParams::default()).unwrap();
        let p = cfg.params();
        let raw = (cfg.ua_envelope_w_k() * p.design_delta_t_c
            + cfg.air_exchange_conductance_w_k(p.design_vent_ach) * p.design_delta_t_c)
            * p.heater_safety_factor;
        assert_eq!(cfg.heater_capacity_w(), raw.floor() as u32);
        assert!(cfg.heater_capacity_w() > 20_000);
    }

    #[rstest]
    #[case::zero_length(0.0, 5.0, 3.0, 2.0)]
    #[case::negative_width(10.0, -1.0, 3.0, 2.0)]
    #[case::zero_height(10.0, 5.0, 0.0, 2.0)]
    #[case::ridge_below_sidewall(10.0, 5.0, 2.0, 3.0)]
    #[case::nan_length(f64::NAN, 5.0, 3.0, 2.0)]
    fn test_rejects_non_physical_dimensions(
        #[case] length_m: f64,
        #[case] width_m: f64,
        #[case] height_m: f64,
        #[case] sidewall_height_m: f64,
    ) {
        let params = ConstructionParams {
            dimensions: GreenhouseDimensions {
                length_m,
                width_m,
                height_m,
                sidewall_height_m,
            },
            ..Default::default()
        };
        assert!(matches!(build(params), Err(TwinError::Configuration(_))));
    }

    #[test]
    fn test_rejects_zero_footings() {
        let params = ConstructionParams {
            footings: 0,
            ..Default::default()
        };
        assert!(matches!(build(params), Err(TwinError::Configuration(_))));
    }

    #[test]
    fn test_rejects_safety_factor_out_of_range() {
        let params = ConstructionParams {
            heater_safety_factor: 2.0,
            ..Default::default()
        };
        assert!(build(params).is_err());
    }

    #[test]
    fn test_rejects_invalid_latitude() {
        let location = Location {
            latitude: 123.0,
            longitude: 0.0,
        };
        assert!(GreenhouseConfig::new(location, ConstructionParams::default()).is_err());
    }

    #[test]
    fn test_rebuild_recomputes_derived_values() {
        let cfg = build(ConstructionParams::default()).unwrap();
        let mut params = cfg.params().clone();
        params.footings = 16;
        let bigger = cfg.with_construction(params).unwrap();

        assert!(bigger.mass_kg() > cfg.mass_kg());
        assert_eq!(bigger.floor_area_m2(), cfg.floor_area_m2());
        assert_eq!(bigger.heater_capacity_w(), cfg.heater_capacity_w());
    }

    fn dims_strategy() -> impl Strategy<Value = GreenhouseDimensions> {
        (1.0f64..50.0, 1.0f64..30.0, 0.5f64..4.0, 0.0f64..4.0).prop_map(
            |(length_m, width_m, sidewall_height_m, extra)| GreenhouseDimensions {
                length_m,
                width_m,
                height_m: sidewall_height_m + extra,
                sidewall_height_m,
            },
        )
    }

    proptest! {
        #[test]
        fn prop_derived_quantities_positive(dims in dims_strategy(), footings in 1u32..40) {
            let cfg = build(ConstructionParams { dimensions: dims, footings, ..Default::default() }).unwrap();
            prop_assert!(cfg.floor_area_m2() > 0.0);
            prop_assert!(cfg.wall_area_m2() > 0.0);
            prop_assert!(cfg.roof_area_m2() > 0.0);
            prop_assert!(cfg.glazing_area_m2() > 0.0);
            prop_assert!(cfg.volume_m3() > 0.0);
            prop_assert!(cfg.mass_kg() > 0.0);
            prop_assert!(cfg.ua_envelope_w_k() > 0.0);
            prop_assert!(cfg.heater_capacity_w() > 0);
        }

        #[test]
        fn prop_doubling_length_grows_envelope(dims in dims_strategy()) {
            let small = build(ConstructionParams { dimensions: dims, ..Default::default() }).unwrap();
            let long = GreenhouseDimensions { length_m: dims.length_m * 2.0, ..dims };
            let large = build(ConstructionParams { dimensions: long, ..Default::default() }).unwrap();

            prop_assert!(large.wall_area_m2() > small.wall_area_m2());
            prop_assert!(large.roof_area_m2() > small.roof_area_m2());
            prop_assert!(large.volume_m3() > small.volume_m3());
            prop_assert!(large.mass_kg() > small.mass_kg());
            prop_assert!(large.heater_capacity_w() >= small.heater_capacity_w());
        }
    }
}
