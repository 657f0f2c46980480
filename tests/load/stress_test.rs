//! Long-horizon simulation suite
//!
//! Verifies that the closed loop stays well behaved over long runs:
//! - A full year of hourly steps stays finite and bounded
//! - Independent runs on separate threads produce identical results
//! - Throughput stays high enough for interactive what-if runs

use std::f64::consts::PI;
use std::thread;
use std::time::Instant;

use chrono::{Duration, FixedOffset, TimeZone};

use greenhouse_twin::controller::{ControllerParams, PredictiveController};
use greenhouse_twin::domain::{ForecastRow, SimulationState, SolarInput};
use greenhouse_twin::energy::{EnergyAccounting, EnergyParams};
use greenhouse_twin::simulation::{
    ConstructionParams, EngineParams, GreenhouseConfig, Location, ThermalEngine,
};

const HOURS_PER_YEAR: usize = 8760;

/// Seasonal and diurnal temperature swing with a daytime solar bell
fn synthetic_year() -> Vec<ForecastRow> {
    let start = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .unwrap();

    (0..HOURS_PER_YEAR + 24)
        .map(|h| {
            let day = h as f64 / 24.0;
            let hour = (h % 24) as f64;
            let seasonal = 10.0 - 12.0 * (2.0 * PI * (day + 10.0) / 365.0).cos();
            let diurnal = 5.0 * (2.0 * PI * (hour - 9.0) / 24.0).sin();
            let sun = (PI * (hour - 6.0) / 12.0).sin().max(0.0);
            let peak_w = 4000.0 + 6000.0 * (1.0 - (2.0 * PI * (day + 10.0) / 365.0).cos()) / 2.0;

            ForecastRow::calm(start + Duration::hours(h as i64), seasonal + diurnal)
                .with_wind(2.0 + (h % 7) as f64 * 0.5)
                .with_solar(SolarInput::Delivered {
                    watts: peak_w * sun,
                })
        })
        .collect()
}

fn run_year(forecast: &[ForecastRow]) -> Vec<SimulationState> {
    let cfg = GreenhouseConfig::new(Location::default(), ConstructionParams::default()).unwrap();
    let params = EngineParams {
        steps: HOURS_PER_YEAR,
        horizon: 24,
        ..Default::default()
    };
    let controller =
        PredictiveController::for_greenhouse(&cfg, ControllerParams::default(), params.air_mass_exchange_w_k)
            .unwrap();
    let mut engine = ThermalEngine::new(cfg, params, Box::new(controller)).unwrap();
    engine.run(forecast).unwrap()
}

#[test]
#[ignore] // Slow: a full year of hourly steps
fn test_full_year_stays_bounded() {
    let forecast = synthetic_year();
    let states = run_year(&forecast);

    assert_eq!(states.len(), HOURS_PER_YEAR);
    for s in &states {
        assert!(s.air_temp_c.is_finite() && s.mass_temp_c.is_finite());
        assert!(
            (-30.0..60.0).contains(&s.air_temp_c),
            "air temperature out of range at {}: {}",
            s.timestamp,
            s.air_temp_c
        );
        assert!((0.0..=100.0).contains(&s.humidity_pct));
    }

    let report = EnergyAccounting::new(EnergyParams::default())
        .unwrap()
        .estimate(&states);
    println!(
        "Year: {:.0} kWh, ${:.2}, {} heater hours",
        report.total_kwh,
        report.total_cost,
        states.iter().filter(|s| s.heater_on).count()
    );
    assert!(report.total_kwh > 0.0);
}

#[test]
#[ignore] // Slow: several full-year runs
fn test_parallel_runs_are_independent() {
    let forecast = synthetic_year();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let forecast = forecast.clone();
            thread::spawn(move || run_year(&forecast))
        })
        .collect();

    let results: Vec<Vec<SimulationState>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for other in &results[1..] {
        assert_eq!(&results[0], other);
    }
}

#[test]
#[ignore] // Slow: timing measurement
fn test_throughput_benchmark() {
    let forecast = synthetic_year();

    let start = Instant::now();
    let states = run_year(&forecast);
    let elapsed = start.elapsed();

    let per_second = states.len() as f64 / elapsed.as_secs_f64();
    println!("Simulated {} hours in {:?} ({:.0} hours/s)", states.len(), elapsed, per_second);

    assert!(per_second > 1_000.0, "throughput too low: {:.0} hours/s", per_second);
}
