//! Canonical physical parameters understood by every part of the crate.
//!
//! Providers use their own column names (`T2M`, `temperature_2m_mean`, ...). Those names
//! never leave the source adapters: everything downstream speaks [`Parameter`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A physical quantity that can be fetched, reconciled across sources and analyzed.
///
/// Units are fixed per parameter so values from different providers are comparable:
///
/// | Parameter | Unit |
/// |---|---|
/// | temperatures, dew point, apparent temperature | °C |
/// | precipitation | mm/day |
/// | wind speeds and gusts | m/s |
/// | humidity, cloud cover | % |
/// | pressure | kPa |
/// | solar radiation | kWh/m²/day |
/// | snow depth | cm |
/// | air quality | aerosol optical depth (dimensionless) |
/// | black carbon, dust | µg/m³ |
/// | thunderstorm risk | CAPE, J/kg |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    /// Daily mean air temperature at 2 m.
    Temperature,
    /// Daily maximum air temperature at 2 m.
    TemperatureMax,
    /// Daily minimum air temperature at 2 m.
    TemperatureMin,
    DewPoint,
    Precipitation,
    /// Wind speed near the surface (2 m where available).
    WindSpeed,
    #[serde(rename = "wind_speed_10m")]
    WindSpeed10m,
    /// Relative humidity.
    Humidity,
    /// Surface pressure.
    Pressure,
    CloudCover,
    UvIndex,
    SolarRadiation,
    SnowDepth,
    ApparentTemperature,
    /// WMO weather interpretation code (0-99), stored as a float like every other value.
    WeatherCode,
    WindGusts,
    /// Aerosol optical depth.
    AirQuality,
    BlackCarbon,
    Dust,
    /// Convective available potential energy.
    ThunderstormRisk,
}

impl Parameter {
    pub const ALL: [Parameter; 20] = [
        Parameter::Temperature,
        Parameter::TemperatureMax,
        Parameter::TemperatureMin,
        Parameter::DewPoint,
        Parameter::Precipitation,
        Parameter::WindSpeed,
        Parameter::WindSpeed10m,
        Parameter::Humidity,
        Parameter::Pressure,
        Parameter::CloudCover,
        Parameter::UvIndex,
        Parameter::SolarRadiation,
        Parameter::SnowDepth,
        Parameter::ApparentTemperature,
        Parameter::WeatherCode,
        Parameter::WindGusts,
        Parameter::AirQuality,
        Parameter::BlackCarbon,
        Parameter::Dust,
        Parameter::ThunderstormRisk,
    ];

    /// The canonical snake_case name, identical to the serialized form.
    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Temperature => "temperature",
            Parameter::TemperatureMax => "temperature_max",
            Parameter::TemperatureMin => "temperature_min",
            Parameter::DewPoint => "dew_point",
            Parameter::Precipitation => "precipitation",
            Parameter::WindSpeed => "wind_speed",
            Parameter::WindSpeed10m => "wind_speed_10m",
            Parameter::Humidity => "humidity",
            Parameter::Pressure => "pressure",
            Parameter::CloudCover => "cloud_cover",
            Parameter::UvIndex => "uv_index",
            Parameter::SolarRadiation => "solar_radiation",
            Parameter::SnowDepth => "snow_depth",
            Parameter::ApparentTemperature => "apparent_temperature",
            Parameter::WeatherCode => "weather_code",
            Parameter::WindGusts => "wind_gusts",
            Parameter::AirQuality => "air_quality",
            Parameter::BlackCarbon => "black_carbon",
            Parameter::Dust => "dust",
            Parameter::ThunderstormRisk => "thunderstorm_risk",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Temperature
            | Parameter::TemperatureMax
            | Parameter::TemperatureMin
            | Parameter::DewPoint
            | Parameter::ApparentTemperature => "°C",
            Parameter::Precipitation => "mm",
            Parameter::WindSpeed | Parameter::WindSpeed10m | Parameter::WindGusts => "m/s",
            Parameter::Humidity | Parameter::CloudCover => "%",
            Parameter::Pressure => "kPa",
            Parameter::UvIndex => "index",
            Parameter::SolarRadiation => "kWh/m²/day",
            Parameter::SnowDepth => "cm",
            Parameter::WeatherCode => "wmo",
            Parameter::AirQuality => "aod",
            Parameter::BlackCarbon | Parameter::Dust => "µg/m³",
            Parameter::ThunderstormRisk => "J/kg",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownParameter(pub String);

impl fmt::Display for UnknownParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown parameter '{}'", self.0)
    }
}

impl std::error::Error for UnknownParameter {}

impl FromStr for Parameter {
    type Err = UnknownParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parameter::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownParameter(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_serde_representation() {
        for parameter in Parameter::ALL {
            let json = serde_json::to_string(&parameter).unwrap();
            assert_eq!(json, format!("\"{}\"", parameter.name()));
        }
    }

    #[test]
    fn parses_canonical_names() {
        assert_eq!("wind_speed_10m".parse::<Parameter>(), Ok(Parameter::WindSpeed10m));
        assert_eq!(" Dust ".parse::<Parameter>(), Ok(Parameter::Dust));
        assert!("T2M".parse::<Parameter>().is_err());
    }
}
