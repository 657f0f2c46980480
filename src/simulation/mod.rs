//! # Greenhouse Simulation Module
//!
//! Physical model of a single greenhouse driven by an exterior forecast.
//!
//! ## Components
//!
//! - **Geometry**: areas, volume, thermal mass, envelope conductance and heater sizing
//! - **Thermal**: the solid thermal-mass node and the air-side heat flows
//! - **Solar**: plane-of-array irradiance and glazing gain, cloud attenuation, GHI decomposition
//! - **Humidity**: empirical interior relative-humidity tracker
//! - **Engine**: the hourly closed-loop simulation with sub-stepped integration
//!
//! ## Usage
//!
//! ```rust,no_run
//! use greenhouse_twin::controller::{ControllerParams, PredictiveController};
//! use greenhouse_twin::simulation::{
//!     ConstructionParams, EngineParams, GreenhouseConfig, Location, ThermalEngine,
//! };
//!
//! # fn main() -> greenhouse_twin::Result<()> {
//! let config = GreenhouseConfig::new(Location::default(), ConstructionParams::default())?;
//! let params = EngineParams::default();
//! let controller =
//!     PredictiveController::for_greenhouse(&config, ControllerParams::default(), params.air_mass_exchange_w_k)?;
//!
//! let mut engine = ThermalEngine::new(config, params, Box::new(controller))?;
//! let states = engine.run(&[])?;
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod geometry;
pub mod humidity;
pub mod solar;
pub mod thermal;

pub use engine::{EngineParams, ForecastPolicy, ThermalEngine};
pub use geometry::{
    ConstructionParams, GreenhouseConfig, GreenhouseDimensions, GreenhouseSummary, Location,
    ModelConstants,
};
pub use humidity::HumidityModel;
pub use solar::{cloud_transmittance, erbs_decomposition, SolarGainModel};
pub use thermal::{HeatFlowModel, ThermalMassNode};
