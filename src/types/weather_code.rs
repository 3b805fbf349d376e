//! WMO weather interpretation codes as reported by Open-Meteo's `weather_code` variable.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A daily WMO weather interpretation code (WW, subset used by Open-Meteo).
///
/// See the [Open-Meteo documentation](https://open-meteo.com/en/docs) for the code table.
/// Convert a raw value with [`WeatherCode::from_i64`].
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum WeatherCode {
    /// Code 0.
    ClearSky = 0,
    /// Code 1.
    MainlyClear = 1,
    /// Code 2.
    PartlyCloudy = 2,
    /// Code 3.
    Overcast = 3,
    /// Code 45.
    Fog = 45,
    /// Code 48.
    RimeFog = 48,
    LightDrizzle = 51,
    ModerateDrizzle = 53,
    DenseDrizzle = 55,
    LightFreezingDrizzle = 56,
    DenseFreezingDrizzle = 57,
    SlightRain = 61,
    ModerateRain = 63,
    HeavyRain = 65,
    LightFreezingRain = 66,
    HeavyFreezingRain = 67,
    SlightSnowfall = 71,
    ModerateSnowfall = 73,
    HeavySnowfall = 75,
    SnowGrains = 77,
    SlightRainShowers = 80,
    ModerateRainShowers = 81,
    ViolentRainShowers = 82,
    SlightSnowShowers = 85,
    HeavySnowShowers = 86,
    Thunderstorm = 95,
    ThunderstormSlightHail = 96,
    ThunderstormHeavyHail = 99,
}

impl WeatherCode {
    /// Maps a numeric WMO code to a variant. Codes outside the table give `None`.
    ///
    /// ```rust
    /// use climate_odds::{WeatherCode, WeatherCategory};
    ///
    /// let code = WeatherCode::from_i64(63);
    /// assert_eq!(code, Some(WeatherCode::ModerateRain));
    /// assert_eq!(code.map(|c| c.category()), Some(WeatherCategory::Rain));
    /// assert_eq!(WeatherCode::from_i64(42), None);
    /// ```
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(WeatherCode::ClearSky),
            1 => Some(WeatherCode::MainlyClear),
            2 => Some(WeatherCode::PartlyCloudy),
            3 => Some(WeatherCode::Overcast),
            45 => Some(WeatherCode::Fog),
            48 => Some(WeatherCode::RimeFog),
            51 => Some(WeatherCode::LightDrizzle),
            53 => Some(WeatherCode::ModerateDrizzle),
            55 => Some(WeatherCode::DenseDrizzle),
            56 => Some(WeatherCode::LightFreezingDrizzle),
            57 => Some(WeatherCode::DenseFreezingDrizzle),
            61 => Some(WeatherCode::SlightRain),
            63 => Some(WeatherCode::ModerateRain),
            65 => Some(WeatherCode::HeavyRain),
            66 => Some(WeatherCode::LightFreezingRain),
            67 => Some(WeatherCode::HeavyFreezingRain),
            71 => Some(WeatherCode::SlightSnowfall),
            73 => Some(WeatherCode::ModerateSnowfall),
            75 => Some(WeatherCode::HeavySnowfall),
            77 => Some(WeatherCode::SnowGrains),
            80 => Some(WeatherCode::SlightRainShowers),
            81 => Some(WeatherCode::ModerateRainShowers),
            82 => Some(WeatherCode::ViolentRainShowers),
            85 => Some(WeatherCode::SlightSnowShowers),
            86 => Some(WeatherCode::HeavySnowShowers),
            95 => Some(WeatherCode::Thunderstorm),
            96 => Some(WeatherCode::ThunderstormSlightHail),
            99 => Some(WeatherCode::ThunderstormHeavyHail),
            _ => None,
        }
    }

    /// Rounds a float code (as stored in series) and maps it.
    pub fn from_f64(value: f64) -> Option<Self> {
        if value.is_finite() {
            Self::from_i64(value.round() as i64)
        } else {
            None
        }
    }

    pub fn code(&self) -> i64 {
        *self as i64
    }

    pub fn description(&self) -> &'static str {
        match self {
            WeatherCode::ClearSky => "Clear sky",
            WeatherCode::MainlyClear => "Mainly clear",
            WeatherCode::PartlyCloudy => "Partly cloudy",
            WeatherCode::Overcast => "Overcast",
            WeatherCode::Fog => "Fog",
            WeatherCode::RimeFog => "Depositing rime fog",
            WeatherCode::LightDrizzle => "Light drizzle",
            WeatherCode::ModerateDrizzle => "Moderate drizzle",
            WeatherCode::DenseDrizzle => "Dense drizzle",
            WeatherCode::LightFreezingDrizzle => "Light freezing drizzle",
            WeatherCode::DenseFreezingDrizzle => "Dense freezing drizzle",
            WeatherCode::SlightRain => "Slight rain",
            WeatherCode::ModerateRain => "Moderate rain",
            WeatherCode::HeavyRain => "Heavy rain",
            WeatherCode::LightFreezingRain => "Light freezing rain",
            WeatherCode::HeavyFreezingRain => "Heavy freezing rain",
            WeatherCode::SlightSnowfall => "Slight snowfall",
            WeatherCode::ModerateSnowfall => "Moderate snowfall",
            WeatherCode::HeavySnowfall => "Heavy snowfall",
            WeatherCode::SnowGrains => "Snow grains",
            WeatherCode::SlightRainShowers => "Slight rain showers",
            WeatherCode::ModerateRainShowers => "Moderate rain showers",
            WeatherCode::ViolentRainShowers => "Violent rain showers",
            WeatherCode::SlightSnowShowers => "Slight snow showers",
            WeatherCode::HeavySnowShowers => "Heavy snow showers",
            WeatherCode::Thunderstorm => "Thunderstorm",
            WeatherCode::ThunderstormSlightHail => "Thunderstorm with slight hail",
            WeatherCode::ThunderstormHeavyHail => "Thunderstorm with heavy hail",
        }
    }

    pub fn category(&self) -> WeatherCategory {
        match self.code() {
            0 | 1 => WeatherCategory::Clear,
            2 | 3 => WeatherCategory::Cloudy,
            45 | 48 => WeatherCategory::Fog,
            51..=67 | 80..=82 => WeatherCategory::Rain,
            71..=77 | 85 | 86 => WeatherCategory::Snow,
            _ => WeatherCategory::Thunderstorm,
        }
    }
}

/// Coarse grouping of weather codes used for the `weather_*` probabilities.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCategory {
    Clear,
    Cloudy,
    Fog,
    Rain,
    Snow,
    Thunderstorm,
}

impl WeatherCategory {
    pub const ALL: [WeatherCategory; 6] = [
        WeatherCategory::Clear,
        WeatherCategory::Cloudy,
        WeatherCategory::Fog,
        WeatherCategory::Rain,
        WeatherCategory::Snow,
        WeatherCategory::Thunderstorm,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WeatherCategory::Clear => "clear",
            WeatherCategory::Cloudy => "cloudy",
            WeatherCategory::Fog => "fog",
            WeatherCategory::Rain => "rain",
            WeatherCategory::Snow => "snow",
            WeatherCategory::Thunderstorm => "thunderstorm",
        }
    }
}

impl fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_code_round_trips() {
        for raw in 0..=99 {
            if let Some(code) = WeatherCode::from_i64(raw) {
                assert_eq!(code.code(), raw);
            }
        }
    }

    #[test]
    fn categories_follow_wmo_groups() {
        assert_eq!(WeatherCode::from_f64(0.0).map(|c| c.category()), Some(WeatherCategory::Clear));
        assert_eq!(WeatherCode::from_f64(48.0).map(|c| c.category()), Some(WeatherCategory::Fog));
        assert_eq!(WeatherCode::from_f64(81.2).map(|c| c.category()), Some(WeatherCategory::Rain));
        assert_eq!(WeatherCode::from_f64(86.0).map(|c| c.category()), Some(WeatherCategory::Snow));
        assert_eq!(
            WeatherCode::from_f64(96.0).map(|c| c.category()),
            Some(WeatherCategory::Thunderstorm)
        );
        assert_eq!(WeatherCode::from_f64(f64::NAN), None);
    }
}
