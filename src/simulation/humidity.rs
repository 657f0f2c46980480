use serde::{Deserialize, Serialize};

/// Hourly interior relative-humidity tracker
///
/// An empirical model: heating dries the air, open vents pull it toward
/// the exterior humidity, and a closed unheated house slowly gains moisture
/// from transpiring plants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HumidityModel {
    /// Percentage points removed per hour of heating
    pub heating_drying_pct: f64,
    /// Fraction of the interior-exterior gap closed per hour of venting
    pub vent_mixing_fraction: f64,
    /// Fraction of the remaining headroom gained per closed, unheated hour
    pub transpiration_fraction: f64,
}

impl Default for HumidityModel {
    fn default() -> Self {
        Self {
            heating_drying_pct: 0.5,
            vent_mixing_fraction: 0.3,
            transpiration_fraction: 0.05,
        }
    }
}

impl HumidityModel {
    pub fn next(&self, interior_pct: f64, exterior_pct: f64, heating: bool, venting: bool) -> f64 {
        let mut delta = 0.0;
        if heating {
            delta -= self.heating_drying_pct;
        }
        if venting {
            delta += self.vent_mixing_fraction * (exterior_pct - interior_pct);
        }
        if !heating && !venting {
            delta += self.transpiration_fraction * (100.0 - interior_pct);
        }
        (interior_pct + delta).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_heating_dries() {
        let m = HumidityModel::default();
        assert_relative_eq!(m.next(70.0, 90.0, true, false), 69.5);
    }

    #[test]
    fn test_venting_moves_toward_exterior() {
        let m = HumidityModel::default();
        assert_relative_eq!(m.next(80.0, 40.0, false, true), 68.0);
    }

    #[test]
    fn test_closed_house_gains_moisture() {
        let m = HumidityModel::default();
        assert_relative_eq!(m.next(60.0, 20.0, false, false), 62.0);
    }

    #[test]
    fn test_clamped_to_percentage() {
        let m = HumidityModel::default();
        assert_eq!(m.next(0.2, 0.0, true, false), 0.0);
        assert!(m.next(100.0, 100.0, false, false) <= 100.0);
    }
}
