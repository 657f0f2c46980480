//! Greenhouse digital twin
//!
//! Predicts interior air and thermal-mass temperatures of a greenhouse from
//! an exterior weather forecast, under a forecast-driven heating and venting
//! controller, and estimates the resulting energy cost.

pub mod config;
pub mod controller;
pub mod domain;
pub mod energy;
pub mod error;
pub mod simulation;
pub mod telemetry;

pub use error::{Result, TwinError};
