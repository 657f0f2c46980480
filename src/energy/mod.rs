//! Energy use and cost of a simulated run under a time-of-use tariff

pub mod accounting;
pub mod tariff;

pub use accounting::{EnergyAccounting, EnergyParams, EnergyReport, EnergyRow};
pub use tariff::{TouPeriod, TouRates, TouTariff};
