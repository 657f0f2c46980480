use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use greenhouse_twin::{config, controller, domain, energy, simulation, telemetry, TwinError};
use config::Config;
use controller::{
    ClimateController, PredictiveController, ScheduleConfig, ScheduleController, ThermostatConfig,
    ThermostatController,
};
use domain::{ForecastRow, SimulationState};
use energy::EnergyReport;
use serde::Serialize;
use simulation::{GreenhouseSummary, ThermalEngine};
use std::{
    fs,
    path::{Path, PathBuf},
};
use telemetry::init_tracing;
use tracing::info;

/// Simulate a greenhouse over an hourly exterior forecast
#[derive(Debug, Parser)]
#[command(name = "greenhouse-twin", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "GREENHOUSE_CONFIG")]
    config: Option<PathBuf>,

    /// JSON array of hourly forecast rows
    #[arg(long)]
    forecast: PathBuf,

    #[arg(long, value_enum, default_value_t = ControllerKind::Predictive)]
    controller: ControllerKind,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    json_logs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ControllerKind {
    Predictive,
    Thermostat,
    Schedule,
}

#[derive(Serialize)]
struct RunReport {
    summary: GreenhouseSummary,
    controller: &'static str,
    states: Vec<SimulationState>,
    energy: EnergyReport,
}

/// Read an already-materialised forecast; any failure is reported as unavailable
fn load_forecast(path: &Path) -> greenhouse_twin::Result<Vec<ForecastRow>> {
    let raw = fs::read_to_string(path).map_err(|e| TwinError::ForecastUnavailable(e.to_string()))?;
    let rows: Vec<ForecastRow> =
        serde_json::from_str(&raw).map_err(|e| TwinError::ForecastUnavailable(e.to_string()))?;
    if rows.is_empty() {
        return Err(TwinError::ForecastUnavailable("forecast contains no rows".to_string()));
    }
    Ok(rows)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    if let Some(path) = &args.config {
        anyhow::ensure!(path.exists(), "config file {} not found", path.display());
    }
    let cfg = Config::load(args.config.as_deref())?;
    let greenhouse = cfg.greenhouse()?;
    let summary = greenhouse.summary();
    info!(?summary, "greenhouse configured");

    let forecast = load_forecast(&args.forecast)
        .with_context(|| format!("failed to load forecast {}", args.forecast.display()))?;
    info!(rows = forecast.len(), "forecast loaded");

    let controller: Box<dyn ClimateController> = match args.controller {
        ControllerKind::Predictive => Box::new(PredictiveController::for_greenhouse(
            &greenhouse,
            cfg.controller.clone(),
            cfg.simulation.air_mass_exchange_w_k,
        )?),
        ControllerKind::Thermostat => Box::new(ThermostatController::new(ThermostatConfig {
            target_temp_c: cfg.controller.set_point_c,
            hysteresis_c: cfg.controller.deadband_c / 2.0,
            vent_above_c: cfg.controller.set_point_c
                + cfg.controller.deadband_c / 2.0
                + cfg.controller.vent_excess_margin_c,
            vent_ach: greenhouse.design_vent_ach(),
        })?),
        ControllerKind::Schedule => Box::new(ScheduleController::new(ScheduleConfig {
            vent_ach: greenhouse.design_vent_ach(),
            ..Default::default()
        })?),
    };

    let mut engine = ThermalEngine::new(greenhouse, cfg.simulation.clone(), controller)?;
    let controller_name = engine.controller_name();
    let states = engine.run(&forecast)?;
    let energy = cfg.energy_accounting()?.estimate(&states);
    info!(
        total_kwh = energy.total_kwh,
        total_cost = energy.total_cost,
        "run complete"
    );

    let report = RunReport {
        summary,
        controller: controller_name,
        states,
        energy,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
