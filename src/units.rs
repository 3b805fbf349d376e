//! Unit conversion of finished reports.
//!
//! The analysis always works in °C, m/s, mm and kPa. Conversion is applied to the
//! statistics of a report after the fact and never feeds back into probabilities.

use crate::types::report::{AggregatedStatistics, AnalysisReport, CategoryStatistics, RangeReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MS_TO_KMH: f64 = 3.6;
const MS_TO_MPH: f64 = 2.23694;
const MM_PER_INCH: f64 = 25.4;
const KPA_TO_MMHG: f64 = 7.50062;
const KPA_TO_INHG: f64 = 0.2953;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindSpeedUnit {
    #[default]
    Ms,
    Kmh,
    Mph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecipitationUnit {
    #[default]
    Mm,
    Inches,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureUnit {
    #[default]
    Kpa,
    Mmhg,
    Inhg,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

impl WindSpeedUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            WindSpeedUnit::Ms => "m/s",
            WindSpeedUnit::Kmh => "km/h",
            WindSpeedUnit::Mph => "mph",
        }
    }

    fn per_ms(&self) -> f64 {
        match self {
            WindSpeedUnit::Ms => 1.0,
            WindSpeedUnit::Kmh => MS_TO_KMH,
            WindSpeedUnit::Mph => MS_TO_MPH,
        }
    }
}

impl PrecipitationUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            PrecipitationUnit::Mm => "mm",
            PrecipitationUnit::Inches => "inches",
        }
    }

    fn per_mm(&self) -> f64 {
        match self {
            PrecipitationUnit::Mm => 1.0,
            PrecipitationUnit::Inches => 1.0 / MM_PER_INCH,
        }
    }
}

impl PressureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            PressureUnit::Kpa => "kPa",
            PressureUnit::Mmhg => "mmHg",
            PressureUnit::Inhg => "inHg",
        }
    }

    fn per_kpa(&self) -> f64 {
        match self {
            PressureUnit::Kpa => 1.0,
            PressureUnit::Mmhg => KPA_TO_MMHG,
            PressureUnit::Inhg => KPA_TO_INHG,
        }
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

pub fn convert_temperature(value: f64, from: TemperatureUnit, to: TemperatureUnit) -> f64 {
    match (from, to) {
        (TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit) => celsius_to_fahrenheit(value),
        (TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius) => fahrenheit_to_celsius(value),
        _ => value,
    }
}

pub fn convert_wind_speed(value: f64, from: WindSpeedUnit, to: WindSpeedUnit) -> f64 {
    if from == to {
        return value;
    }
    value / from.per_ms() * to.per_ms()
}

pub fn convert_precipitation(value: f64, from: PrecipitationUnit, to: PrecipitationUnit) -> f64 {
    if from == to {
        return value;
    }
    value / from.per_mm() * to.per_mm()
}

pub fn convert_pressure(value: f64, from: PressureUnit, to: PressureUnit) -> f64 {
    if from == to {
        return value;
    }
    value / from.per_kpa() * to.per_kpa()
}

/// Target units for a report. The default keeps the analysis units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitPreferences {
    pub temperature: TemperatureUnit,
    pub wind_speed: WindSpeedUnit,
    pub precipitation: PrecipitationUnit,
    pub pressure: PressureUnit,
}

impl UnitPreferences {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// `value * factor + offset` for levels, including the comfort indices; spreads only
/// scale.
#[derive(Debug, Clone, Copy)]
struct Linear {
    factor: f64,
    offset: f64,
}

impl Linear {
    fn apply(&self, stats: &mut CategoryStatistics, unit: &str) {
        let level = |v: &mut Option<f64>| {
            if let Some(x) = v {
                *x = *x * self.factor + self.offset;
            }
        };
        level(&mut stats.mean);
        level(&mut stats.min);
        level(&mut stats.max);
        level(&mut stats.percentile_10);
        level(&mut stats.percentile_90);
        level(&mut stats.heat_index_mean);
        level(&mut stats.heat_index_max);
        level(&mut stats.wind_chill_mean);
        level(&mut stats.wind_chill_min);
        if let Some(total) = &mut stats.total {
            *total *= self.factor;
        }
        if let Some(std) = &mut stats.std {
            *std *= self.factor.abs();
        }
        stats.unit = Some(unit.to_string());
    }
}

/// Converts the unit-bearing blocks of a statistics map in place.
pub fn convert_statistics(
    statistics: &mut BTreeMap<String, CategoryStatistics>,
    units: &UnitPreferences,
) {
    if units.temperature == TemperatureUnit::Fahrenheit {
        let f = Linear {
            factor: 9.0 / 5.0,
            offset: 32.0,
        };
        for key in ["temperature", "dew_point", "apparent_temperature", "comfort"] {
            if let Some(s) = statistics.get_mut(key) {
                f.apply(s, units.temperature.symbol());
            }
        }
    }
    if units.wind_speed != WindSpeedUnit::Ms {
        let f = Linear {
            factor: units.wind_speed.per_ms(),
            offset: 0.0,
        };
        for key in ["wind", "wind_10m", "wind_gusts"] {
            if let Some(s) = statistics.get_mut(key) {
                f.apply(s, units.wind_speed.symbol());
            }
        }
    }
    if units.precipitation != PrecipitationUnit::Mm {
        if let Some(s) = statistics.get_mut("precipitation") {
            Linear {
                factor: units.precipitation.per_mm(),
                offset: 0.0,
            }
            .apply(s, units.precipitation.symbol());
        }
    }
    if units.pressure != PressureUnit::Kpa {
        if let Some(s) = statistics.get_mut("pressure") {
            Linear {
                factor: units.pressure.per_kpa(),
                offset: 0.0,
            }
            .apply(s, units.pressure.symbol());
        }
    }
}

fn convert_aggregated(stats: &mut AggregatedStatistics, units: &UnitPreferences) {
    let mut map = BTreeMap::new();
    for (key, slot) in [
        ("temperature", &mut stats.temperature),
        ("precipitation", &mut stats.precipitation),
        ("wind", &mut stats.wind),
        ("humidity", &mut stats.humidity),
    ] {
        if let Some(s) = slot.take() {
            map.insert(key.to_string(), s);
        }
    }
    convert_statistics(&mut map, units);
    stats.temperature = map.remove("temperature");
    stats.precipitation = map.remove("precipitation");
    stats.wind = map.remove("wind");
    stats.humidity = map.remove("humidity");
}

pub fn convert_report_units(report: &mut AnalysisReport, units: &UnitPreferences) {
    convert_statistics(&mut report.statistics, units);
}

pub fn convert_range_units(report: &mut RangeReport, units: &UnitPreferences) {
    convert_aggregated(&mut report.aggregated.statistics, units);
    for day in &mut report.daily_breakdown {
        convert_statistics(&mut day.statistics, units);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(mean: f64, std: f64) -> CategoryStatistics {
        CategoryStatistics {
            mean: Some(mean),
            min: Some(mean - 5.0),
            max: Some(mean + 5.0),
            std: Some(std),
            unit: Some("°C".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn temperature_round_trip() {
        for c in [-40.0, -12.3, 0.0, 21.7, 36.6, 57.8] {
            let back = fahrenheit_to_celsius(celsius_to_fahrenheit(c));
            assert!((back - c).abs() < 1e-9, "{c} -> {back}");
        }
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
        assert_eq!(
            convert_temperature(-40.0, TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit),
            -40.0
        );
    }

    #[test]
    fn scalar_conversions() {
        assert!((convert_wind_speed(10.0, WindSpeedUnit::Ms, WindSpeedUnit::Kmh) - 36.0).abs() < 1e-9);
        assert!((convert_wind_speed(36.0, WindSpeedUnit::Kmh, WindSpeedUnit::Mph) - 22.3694).abs() < 1e-9);
        assert!((convert_precipitation(25.4, PrecipitationUnit::Mm, PrecipitationUnit::Inches) - 1.0).abs() < 1e-12);
        assert!((convert_pressure(101.325, PressureUnit::Kpa, PressureUnit::Mmhg) - 760.0).abs() < 0.01);
        assert!((convert_pressure(760.0, PressureUnit::Mmhg, PressureUnit::Inhg) - 29.92).abs() < 0.01);
    }

    #[test]
    fn std_scales_without_offset() {
        let mut stats = BTreeMap::new();
        stats.insert("temperature".to_string(), block(20.0, 2.0));
        stats.insert("humidity".to_string(), block(60.0, 4.0));
        let units = UnitPreferences {
            temperature: TemperatureUnit::Fahrenheit,
            ..Default::default()
        };
        convert_statistics(&mut stats, &units);

        let t = &stats["temperature"];
        assert!((t.mean.unwrap() - 68.0).abs() < 1e-9);
        assert!((t.std.unwrap() - 3.6).abs() < 1e-9);
        assert_eq!(t.unit.as_deref(), Some("°F"));
        assert_eq!(stats["humidity"].mean, Some(60.0));
    }

    #[test]
    fn comfort_indices_follow_temperature_unit() {
        let mut stats = BTreeMap::new();
        stats.insert(
            "comfort".to_string(),
            CategoryStatistics {
                heat_index_mean: Some(30.0),
                heat_index_max: Some(40.0),
                wind_chill_mean: Some(0.0),
                wind_chill_min: Some(-10.0),
                unit: Some("°C".to_string()),
                ..Default::default()
            },
        );
        let units = UnitPreferences {
            temperature: TemperatureUnit::Fahrenheit,
            ..Default::default()
        };
        convert_statistics(&mut stats, &units);

        let c = &stats["comfort"];
        assert!((c.heat_index_mean.unwrap() - 86.0).abs() < 1e-9);
        assert!((c.heat_index_max.unwrap() - 104.0).abs() < 1e-9);
        assert!((c.wind_chill_mean.unwrap() - 32.0).abs() < 1e-9);
        assert!((c.wind_chill_min.unwrap() - 14.0).abs() < 1e-9);
        assert_eq!(c.unit.as_deref(), Some("°F"));
    }

    #[test]
    fn default_preferences_change_nothing() {
        let mut stats = BTreeMap::new();
        stats.insert("wind".to_string(), block(4.0, 1.0));
        let before = stats.clone();
        convert_statistics(&mut stats, &UnitPreferences::default());
        assert_eq!(stats, before);
        assert!(UnitPreferences::default().is_default());
    }

    #[test]
    fn preferences_parse_from_json() {
        let units: UnitPreferences =
            serde_json::from_str(r#"{"temperature": "fahrenheit", "pressure": "inhg"}"#).unwrap();
        assert_eq!(units.temperature, TemperatureUnit::Fahrenheit);
        assert_eq!(units.pressure, PressureUnit::Inhg);
        assert_eq!(units.wind_speed, WindSpeedUnit::Ms);
    }

    #[test]
    fn aggregated_precipitation_total_is_converted() {
        let mut stats = AggregatedStatistics {
            precipitation: Some(CategoryStatistics {
                mean: Some(2.54),
                total: Some(25.4),
                ..Default::default()
            }),
            ..Default::default()
        };
        let units = UnitPreferences {
            precipitation: PrecipitationUnit::Inches,
            ..Default::default()
        };
        convert_aggregated(&mut stats, &units);
        let p = stats.precipitation.unwrap();
        assert!((p.total.unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(p.unit.as_deref(), Some("inches"));
    }
}
