use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    condition::Icon,
    config::ProviderSettings,
    error::{FetchError, truncate_body},
    model::{CurrentConditions, DayPoint, ForecastSnapshot, HourlyPoint, Location},
    normalize::{self, DAILY_LIMIT, HOURLY_LIMIT},
};

const CURRENT_ENDPOINT: &str = "weather";
const ONE_CALL_ENDPOINT: &str = "onecall";

/// Thin client over the two OpenWeather endpoints the dashboard uses.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    base_url: String,
    api_key: String,
    units: String,
    language: String,
    timeout: Duration,
}

impl OpenWeatherClient {
    pub fn new(settings: &ProviderSettings, api_key: String) -> anyhow::Result<Self> {
        let timeout = settings.request_timeout();
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            units: settings.units.clone(),
            language: settings.language.clone(),
            timeout,
        })
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Current conditions by city name. Also the source of coordinates.
    pub async fn current(&self, query: &str) -> Result<OwCurrentResponse, FetchError> {
        let params = [
            ("q", query.to_string()),
            ("appid", self.api_key.clone()),
            ("units", self.units.clone()),
            ("lang", self.language.clone()),
        ];
        self.get_json(CURRENT_ENDPOINT, &params).await
    }

    /// Current, hourly and daily forecast by coordinates.
    pub async fn one_call(&self, coord: &OwCoord) -> Result<OwOneCallResponse, FetchError> {
        let params = [
            ("lat", coord.lat.to_string()),
            ("lon", coord.lon.to_string()),
            ("appid", self.api_key.clone()),
            ("units", self.units.clone()),
            ("lang", self.language.clone()),
            ("exclude", "minutely,alerts".to_string()),
        ];
        self.get_json(ONE_CALL_ENDPOINT, &params).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}/{endpoint}", self.base_url);
        tracing::debug!(%url, "requesting OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| FetchError::transport(endpoint, e, self.timeout))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| FetchError::transport(endpoint, e, self.timeout))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| FetchError::MalformedResponse {
            endpoint,
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwWeather {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OwCoord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    pressure: f64,
    humidity: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct OwWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct OwSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwCurrentResponse {
    pub coord: OwCoord,
    name: String,
    main: OwMain,
    wind: OwWind,
    weather: Vec<OwWeather>,
    #[serde(default)]
    sys: OwSys,
}

#[derive(Debug, Clone, Deserialize)]
struct OwOneCallCurrent {
    temp: f64,
    feels_like: f64,
    pressure: f64,
    humidity: f64,
    wind_speed: f64,
    #[serde(default)]
    wind_deg: f64,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Clone, Deserialize)]
struct OwHourly {
    dt: i64,
    temp: f64,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Clone, Deserialize)]
struct OwDailyTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct OwDaily {
    dt: i64,
    temp: OwDailyTemp,
    weather: Vec<OwWeather>,
    /// Probability of precipitation, 0..1.
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwOneCallResponse {
    #[serde(default)]
    timezone_offset: i32,
    current: OwOneCallCurrent,
    hourly: Vec<OwHourly>,
    daily: Vec<OwDaily>,
}

impl OwCurrentResponse {
    fn location(&self) -> Location {
        Location {
            name: self.name.clone(),
            country: self.sys.country.clone(),
        }
    }

    /// Degraded snapshot: current conditions only.
    pub fn into_snapshot(self, fetched_at: DateTime<Utc>) -> Result<ForecastSnapshot, FetchError> {
        let weather = first_weather(&self.weather, CURRENT_ENDPOINT)?;

        let current = CurrentConditions {
            temp: normalize::round_half_up(self.main.temp),
            feels_like: normalize::round_half_up(self.main.feels_like),
            humidity: normalize::percent(self.main.humidity),
            pressure: normalize::pressure(self.main.pressure),
            wind_speed: normalize::round_tenth(self.wind.speed),
            wind_deg: normalize::degrees(self.wind.deg),
            condition: weather.main.clone(),
            description: weather.description.clone(),
            icon: Icon::from_provider_code(&weather.icon),
        };

        Ok(ForecastSnapshot {
            location: self.location(),
            current,
            hourly: Vec::new(),
            forecast: Vec::new(),
            fetched_at,
        })
    }
}

/// Rich snapshot: location from the lookup, everything else from the extended forecast.
pub fn extended_snapshot(
    lookup: &OwCurrentResponse,
    extended: OwOneCallResponse,
    fetched_at: DateTime<Utc>,
) -> Result<ForecastSnapshot, FetchError> {
    let offset = extended.timezone_offset;
    let now = &extended.current;
    let weather = first_weather(&now.weather, ONE_CALL_ENDPOINT)?;

    let current = CurrentConditions {
        temp: normalize::round_half_up(now.temp),
        feels_like: normalize::round_half_up(now.feels_like),
        humidity: normalize::percent(now.humidity),
        pressure: normalize::pressure(now.pressure),
        wind_speed: normalize::round_tenth(now.wind_speed),
        wind_deg: normalize::degrees(now.wind_deg),
        condition: weather.main.clone(),
        description: weather.description.clone(),
        icon: Icon::from_provider_code(&weather.icon),
    };

    let hourly = extended
        .hourly
        .iter()
        .take(HOURLY_LIMIT)
        .map(|h| -> Result<HourlyPoint, FetchError> {
            let weather = first_weather(&h.weather, ONE_CALL_ENDPOINT)?;
            Ok(HourlyPoint {
                time: normalize::format_time(h.dt, offset).ok_or_else(|| bad_timestamp(h.dt))?,
                temp: normalize::round_half_up(h.temp),
                condition: weather.description.clone(),
                icon: Icon::from_provider_code(&weather.icon),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let forecast = extended
        .daily
        .iter()
        .take(DAILY_LIMIT)
        .map(|d| -> Result<DayPoint, FetchError> {
            let weather = first_weather(&d.weather, ONE_CALL_ENDPOINT)?;
            Ok(DayPoint {
                date: normalize::format_date(d.dt, offset).ok_or_else(|| bad_timestamp(d.dt))?,
                weekday: normalize::format_weekday(d.dt, offset)
                    .ok_or_else(|| bad_timestamp(d.dt))?,
                temp_high: normalize::round_half_up(d.temp.max),
                temp_low: normalize::round_half_up(d.temp.min),
                condition: weather.description.clone(),
                icon: Icon::from_provider_code(&weather.icon),
                precipitation_chance: normalize::percent(d.pop * 100.0),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ForecastSnapshot {
        location: lookup.location(),
        current,
        hourly,
        forecast,
        fetched_at,
    })
}

fn first_weather<'a>(
    weather: &'a [OwWeather],
    endpoint: &'static str,
) -> Result<&'a OwWeather, FetchError> {
    weather.first().ok_or_else(|| FetchError::MalformedResponse {
        endpoint,
        reason: "empty `weather` array".to_string(),
    })
}

fn bad_timestamp(ts: i64) -> FetchError {
    FetchError::MalformedResponse {
        endpoint: ONE_CALL_ENDPOINT,
        reason: format!("timestamp {ts} out of range"),
    }
}
