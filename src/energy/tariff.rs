use chrono::{DateTime, Datelike, FixedOffset, Timelike, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use validator::Validate;

/// Time-of-use billing period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TouPeriod {
    Peak,
    OffPeak,
    SuperOffPeak,
}

/// Per-kWh prices ($/kWh)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TouRates {
    #[validate(range(min = 0.0))]
    pub peak: f64,
    #[validate(range(min = 0.0))]
    pub off_peak: f64,
    #[validate(range(min = 0.0))]
    pub super_off_peak: f64,
}

impl Default for TouRates {
    fn default() -> Self {
        Self {
            peak: 0.3065,
            off_peak: 0.1243,
            super_off_peak: 0.0787,
        }
    }
}

impl TouRates {
    pub fn rate(&self, period: TouPeriod) -> f64 {
        match period {
            TouPeriod::Peak => self.peak,
            TouPeriod::OffPeak => self.off_peak,
            TouPeriod::SuperOffPeak => self.super_off_peak,
        }
    }
}

/// Weekday 15:00-21:59 is peak, 23:00-06:59 every day is super-off-peak
#[derive(Debug, Clone, PartialEq)]
pub struct TouTariff {
    rates: TouRates,
    /// Clock the periods are defined on; the timestamp's own offset when unset
    timezone: Option<Tz>,
}

impl TouTariff {
    pub fn new(rates: TouRates) -> Self {
        Self {
            rates,
            timezone: None,
        }
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = Some(timezone);
        self
    }

    pub fn rates(&self) -> &TouRates {
        &self.rates
    }

    pub fn period(&self, timestamp: DateTime<FixedOffset>) -> TouPeriod {
        let (weekday, hour) = match self.timezone {
            Some(tz) => {
                let local = timestamp.with_timezone(&tz);
                (local.weekday(), local.hour())
            }
            None => (timestamp.weekday(), timestamp.hour()),
        };

        let is_weekday = !matches!(weekday, Weekday::Sat | Weekday::Sun);
        if is_weekday && (15..=21).contains(&hour) {
            TouPeriod::Peak
        } else if hour >= 23 || hour <= 6 {
            TouPeriod::SuperOffPeak
        } else {
            TouPeriod::OffPeak
        }
    }

    pub fn classify(&self, timestamp: DateTime<FixedOffset>) -> (TouPeriod, f64) {
        let period = self.period(timestamp);
        (period, self.rates.rate(period))
    }
}
