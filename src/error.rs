use thiserror::Error;

/// Errors produced by the greenhouse twin core
#[derive(Debug, Error)]
pub enum TwinError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Insufficient forecast: {required} rows required, {available} available")]
    InsufficientForecast { required: usize, available: usize },
    #[error("Invalid forecast: {0}")]
    InvalidForecast(String),
    #[error("Numerical degeneracy: {0}")]
    NumericalDegeneracy(String),
    #[error("Forecast unavailable: {0}")]
    ForecastUnavailable(String),
}

impl From<validator::ValidationErrors> for TwinError {
    fn from(errors: validator::ValidationErrors) -> Self {
        TwinError::Configuration(errors.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TwinError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_forecast_message() {
        let err = TwinError::InsufficientForecast {
            required: 36,
            available: 24,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient forecast: 36 rows required, 24 available"
        );
    }

    #[test]
    fn test_configuration_message() {
        let err = TwinError::Configuration("length_m must be positive".to_string());
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
