use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::condition::Icon;

/// Suffix appended to the location name of the error snapshot.
pub const UNAVAILABLE_MARKER: &str = " (Ошибка)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp: i32,
    pub feels_like: i32,
    pub humidity: u8,
    pub pressure: u32,
    /// Metres per second, one decimal.
    pub wind_speed: f64,
    pub wind_deg: u16,
    /// Short condition group reported by the provider.
    pub condition: String,
    /// Localised free-text description.
    pub description: String,
    pub icon: Icon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyPoint {
    /// `HH:MM` in the location's local time.
    pub time: String,
    pub temp: i32,
    pub condition: String,
    pub icon: Icon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPoint {
    /// Day and short month, e.g. `18 окт.`.
    pub date: String,
    pub weekday: String,
    pub temp_high: i32,
    pub temp_low: i32,
    pub condition: String,
    pub icon: Icon,
    pub precipitation_chance: u8,
}

/// One complete forecast result. Replaced as a whole, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub location: Location,
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyPoint>,
    pub forecast: Vec<DayPoint>,
    pub fetched_at: DateTime<Utc>,
}

impl ForecastSnapshot {
    /// The snapshot shown when no tier could produce data for `city`.
    pub fn unavailable(city: &str, now: DateTime<Utc>) -> Self {
        Self {
            location: Location {
                name: format!("{city}{UNAVAILABLE_MARKER}"),
                country: "RU".to_string(),
            },
            current: CurrentConditions {
                temp: 0,
                feels_like: 0,
                humidity: 0,
                pressure: 0,
                wind_speed: 0.0,
                wind_deg: 0,
                condition: "Ошибка".to_string(),
                description: "Не удалось загрузить данные.".to_string(),
                icon: Icon::default(),
            },
            hourly: Vec::new(),
            forecast: Vec::new(),
            fetched_at: now,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.location.name.ends_with(UNAVAILABLE_MARKER)
    }

    /// Current conditions only; the extended forecast could not be fetched.
    pub fn is_degraded(&self) -> bool {
        !self.is_unavailable() && self.hourly.is_empty() && self.forecast.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_snapshot_is_zeroed_and_marked() {
        let now = Utc::now();
        let snap = ForecastSnapshot::unavailable("Котово", now);

        assert_eq!(snap.location.name, "Котово (Ошибка)");
        assert_eq!(snap.location.country, "RU");
        assert_eq!(snap.current.temp, 0);
        assert_eq!(snap.current.wind_speed, 0.0);
        assert!(snap.hourly.is_empty());
        assert!(snap.forecast.is_empty());
        assert!(snap.is_unavailable());
        assert!(!snap.is_degraded());
    }

    #[test]
    fn snapshot_without_sequences_is_degraded() {
        let mut snap = ForecastSnapshot::unavailable("Котово", Utc::now());
        snap.location.name = "Kotovo".to_string();

        assert!(!snap.is_unavailable());
        assert!(snap.is_degraded());
    }
}
