use chrono::{Duration, FixedOffset, TimeZone};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use greenhouse_twin::controller::{
    ControllerParams, HorizonPoint, PredictiveController, ClimateController,
};
use greenhouse_twin::domain::{ForecastRow, SolarInput};
use greenhouse_twin::simulation::{
    ConstructionParams, EngineParams, GreenhouseConfig, Location, ThermalEngine,
};

fn forecast(hours: usize) -> Vec<ForecastRow> {
    let start = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .unwrap();
    (0..hours)
        .map(|h| {
            let hour = (h % 24) as f64;
            ForecastRow::calm(start + Duration::hours(h as i64), -5.0 + 8.0 * (hour / 24.0))
                .with_wind(3.0)
                .with_solar(SolarInput::Delivered {
                    watts: if (8.0..16.0).contains(&hour) { 4000.0 } else { 0.0 },
                })
        })
        .collect()
}

fn bench_simulate(c: &mut Criterion) {
    let cfg = GreenhouseConfig::new(Location::default(), ConstructionParams::default()).unwrap();
    let rows = forecast(8760 + 24);

    c.bench_function("simulate_1year_predictive", |b| {
        b.iter(|| {
            let params = EngineParams {
                steps: 8760,
                horizon: 24,
                ..Default::default()
            };
            let controller =
                PredictiveController::for_greenhouse(&cfg, ControllerParams::default(), 1500.0).unwrap();
            let mut engine = ThermalEngine::new(cfg.clone(), params, Box::new(controller)).unwrap();
            black_box(engine.run(&rows).unwrap())
        })
    });
}

fn bench_decide(c: &mut Criterion) {
    let cfg = GreenhouseConfig::new(Location::default(), ConstructionParams::default()).unwrap();
    let mut controller =
        PredictiveController::for_greenhouse(&cfg, ControllerParams::default(), 1500.0).unwrap();
    let horizon: Vec<HorizonPoint> = forecast(24)
        .into_iter()
        .map(|row| HorizonPoint {
            timestamp: row.timestamp,
            exterior_temp_c: row.exterior_temp_c,
            solar_gain_w: 0.0,
        })
        .collect();

    c.bench_function("predictive_decide_24h", |b| {
        b.iter(|| black_box(controller.decide(black_box(17.5), &horizon)))
    });
}

criterion_group!(benches, bench_simulate, bench_decide);
criterion_main!(benches);
