use serde::{Deserialize, Serialize};

/// Icon class a forecast entry is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    #[default]
    Sun,
    Moon,
    CloudSun,
    CloudMoon,
    Cloud,
    CloudRain,
    Zap,
    Snowflake,
    Wind,
}

impl Icon {
    /// Map an OpenWeather icon code (`"01d"`, `"10n"`, ...) to an icon class.
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_provider_code(code: &str) -> Self {
        match code {
            "01d" => Self::Sun,
            "01n" => Self::Moon,
            "02d" => Self::CloudSun,
            "02n" => Self::CloudMoon,
            "03d" | "03n" | "04d" | "04n" => Self::Cloud,
            "09d" | "09n" | "10d" | "10n" => Self::CloudRain,
            "11d" | "11n" => Self::Zap,
            "13d" | "13n" => Self::Snowflake,
            "50d" | "50n" => Self::Wind,
            _ => Self::Sun, // Unknown codes default to sun
        }
    }

    /// Single-glyph rendering for terminals.
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Sun => "☀",
            Self::Moon => "☾",
            Self::CloudSun => "⛅",
            Self::CloudMoon => "☽",
            Self::Cloud => "☁",
            Self::CloudRain => "☂",
            Self::Zap => "⚡",
            Self::Snowflake => "❄",
            Self::Wind => "≋",
        }
    }
}
