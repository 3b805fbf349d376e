//! Per-category probability rules and statistics for one day-of-year slice.
//!
//! Each rule only looks at records carrying the values it needs, so the denominator of
//! every probability is the number of those records. A category without such records
//! contributes no keys at all.

use crate::analysis::indices::{apparent_temperature, heat_index, wind_chill};
use crate::analysis::stats::{self, fraction, percentile_sorted, sorted};
use crate::analysis::table::DailyClimatology;
use crate::config::{ClimateConfig, HybridThreshold};
use crate::types::parameter::Parameter;
use crate::types::report::CategoryStatistics;
use crate::types::weather_code::{WeatherCategory, WeatherCode};
use std::collections::BTreeMap;

/// Condition name to probability, clamped into `[0, 1]` on insert.
#[derive(Debug, Default)]
pub struct ProbabilityMap(BTreeMap<String, f64>);

impl ProbabilityMap {
    pub fn insert(&mut self, condition: impl Into<String>, probability: f64) {
        let p = if probability.is_finite() {
            probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.0.insert(condition.into(), p);
    }

    pub fn into_inner(self) -> BTreeMap<String, f64> {
        self.0
    }
}

/// `max(percentile, absolute)`: the hot-direction threshold.
fn upper_threshold(sorted_values: &[f64], threshold: HybridThreshold) -> f64 {
    percentile_sorted(sorted_values, threshold.percentile)
        .map_or(threshold.absolute, |p| p.max(threshold.absolute))
}

/// `min(percentile, absolute)`: the cold-direction threshold.
fn lower_threshold(sorted_values: &[f64], threshold: HybridThreshold) -> f64 {
    percentile_sorted(sorted_values, threshold.percentile)
        .map_or(threshold.absolute, |p| p.min(threshold.absolute))
}

pub fn temperature(day: &DailyClimatology, config: &ClimateConfig, out: &mut ProbabilityMap) {
    let t = &config.temperature;

    let highs = day.values_or(Parameter::TemperatureMax, Parameter::Temperature);
    if !highs.is_empty() {
        let sorted_highs = sorted(&highs);
        let very_hot = upper_threshold(&sorted_highs, t.very_hot);
        let hot = upper_threshold(&sorted_highs, t.hot);
        out.insert("very_hot", fraction(&highs, |v| v >= very_hot));
        out.insert("hot", fraction(&highs, |v| v >= hot));
    }

    let lows = day.values_or(Parameter::TemperatureMin, Parameter::Temperature);
    if !lows.is_empty() {
        let sorted_lows = sorted(&lows);
        let very_cold = lower_threshold(&sorted_lows, t.very_cold);
        let cold = lower_threshold(&sorted_lows, t.cold);
        out.insert("very_cold", fraction(&lows, |v| v <= very_cold));
        out.insert("cold", fraction(&lows, |v| v <= cold));
    }

    let means = day.values(Parameter::Temperature);
    if !means.is_empty() {
        let (lo, hi) = t.comfortable_range;
        out.insert(
            "comfortable_temperature",
            fraction(&means, |v| v >= lo && v <= hi),
        );
    }
}

pub fn precipitation(day: &DailyClimatology, config: &ClimateConfig, out: &mut ProbabilityMap) {
    let precip = day.values(Parameter::Precipitation);
    if precip.is_empty() {
        return;
    }
    let p = &config.precipitation;
    out.insert("very_wet", fraction(&precip, |v| v > p.very_wet));
    out.insert("heavy_rain", fraction(&precip, |v| v > p.heavy_rain));
    out.insert(
        "moderate_rain",
        fraction(&precip, |v| v > p.moderate_rain && v <= p.heavy_rain),
    );
    out.insert(
        "light_rain",
        fraction(&precip, |v| v > p.light_rain && v <= p.moderate_rain),
    );
    out.insert("dry", fraction(&precip, |v| v < p.very_dry));
}

pub fn wind(day: &DailyClimatology, config: &ClimateConfig, out: &mut ProbabilityMap) {
    let speeds = day.values(Parameter::WindSpeed);
    if speeds.is_empty() {
        return;
    }
    let w = &config.wind;
    out.insert("very_windy", fraction(&speeds, |v| v > w.very_windy));
    out.insert(
        "strong_wind",
        fraction(&speeds, |v| v > w.strong_wind && v <= w.very_windy),
    );
    out.insert(
        "moderate_wind",
        fraction(&speeds, |v| v > w.moderate_wind && v <= w.strong_wind),
    );
    out.insert("calm", fraction(&speeds, |v| v < w.calm));
}

pub fn humidity(day: &DailyClimatology, config: &ClimateConfig, out: &mut ProbabilityMap) {
    let rh = day.values(Parameter::Humidity);
    if rh.is_empty() {
        return;
    }
    let h = &config.humidity;
    out.insert("dry_air", fraction(&rh, |v| v < h.very_dry));
    out.insert("humid", fraction(&rh, |v| v >= h.humid));
    out.insert("very_humid", fraction(&rh, |v| v >= h.very_humid));
}

/// Temperature and humidity comfort, plus the cold-and-windy discomfort rule.
pub fn comfort(day: &DailyClimatology, config: &ClimateConfig, out: &mut ProbabilityMap) {
    let c = &config.comfort;

    let pairs = day.pairs(Parameter::Temperature, Parameter::Humidity);
    if !pairs.is_empty() {
        let n = pairs.len() as f64;
        let count = |pred: &dyn Fn(f64, f64) -> bool| {
            pairs.iter().filter(|(t, h)| pred(*t, *h)).count() as f64 / n
        };
        out.insert(
            "very_uncomfortable",
            count(&|t: f64, h: f64| heat_index(t, h) > c.very_uncomfortable_heat_index),
        );
        out.insert(
            "uncomfortable_hot",
            count(&|t: f64, h: f64| t > c.uncomfortable_hot_temp_min && h > c.uncomfortable_hot_humidity_min),
        );
        let (lo, hi) = c.comfortable_temp_range;
        out.insert(
            "comfortable",
            count(&|t: f64, h: f64| t >= lo && t <= hi && h <= c.comfortable_humidity_max),
        );
    }

    let windy = day.pairs(Parameter::Temperature, Parameter::WindSpeed);
    if !windy.is_empty() {
        let hits = windy
            .iter()
            .filter(|(t, w)| *t <= c.uncomfortable_cold_temp_max && *w >= c.uncomfortable_cold_wind_min)
            .count();
        out.insert("uncomfortable_cold", hits as f64 / windy.len() as f64);
    }
}

pub fn cloudiness(day: &DailyClimatology, config: &ClimateConfig, out: &mut ProbabilityMap) {
    let cloud = day.values(Parameter::CloudCover);
    if cloud.is_empty() {
        return;
    }
    let c = &config.cloud;
    out.insert("clear", fraction(&cloud, |v| v < c.clear));
    out.insert(
        "partly_cloudy",
        fraction(&cloud, |v| v >= c.clear && v < c.partly_cloudy),
    );
    out.insert(
        "mostly_cloudy",
        fraction(&cloud, |v| v >= c.partly_cloudy && v < c.mostly_cloudy),
    );
    out.insert("overcast", fraction(&cloud, |v| v >= c.mostly_cloudy));
}

pub fn uv_index(day: &DailyClimatology, config: &ClimateConfig, out: &mut ProbabilityMap) {
    let uv = day.values(Parameter::UvIndex);
    if uv.is_empty() {
        return;
    }
    let u = &config.uv;
    out.insert("low_uv", fraction(&uv, |v| v < u.low));
    out.insert("moderate_uv", fraction(&uv, |v| v >= u.low && v < u.moderate));
    out.insert("high_uv", fraction(&uv, |v| v >= u.moderate && v < u.high));
    out.insert("very_high_uv", fraction(&uv, |v| v >= u.high && v < u.very_high));
    out.insert("extreme_uv", fraction(&uv, |v| v >= u.very_high));
}

pub fn pressure(day: &DailyClimatology, config: &ClimateConfig, out: &mut ProbabilityMap) {
    let ps = day.values(Parameter::Pressure);
    if ps.is_empty() {
        return;
    }
    let p = &config.pressure;
    out.insert("very_low_pressure", fraction(&ps, |v| v < p.very_low));
    out.insert("low_pressure", fraction(&ps, |v| v >= p.very_low && v < p.low));
    out.insert("normal_pressure", fraction(&ps, |v| v >= p.low && v < p.high));
    out.insert("high_pressure", fraction(&ps, |v| v >= p.high && v < p.very_high));
    out.insert("very_high_pressure", fraction(&ps, |v| v >= p.very_high));
}

pub fn snow(day: &DailyClimatology, config: &ClimateConfig, out: &mut ProbabilityMap) {
    let depth = day.values(Parameter::SnowDepth);
    if depth.is_empty() {
        return;
    }
    let s = &config.snow;
    out.insert("no_snow", fraction(&depth, |v| v <= s.no_snow));
    out.insert(
        "light_snow",
        fraction(&depth, |v| v > s.no_snow && v <= s.light_snow),
    );
    out.insert(
        "moderate_snow",
        fraction(&depth, |v| v > s.light_snow && v <= s.moderate_snow),
    );
    out.insert(
        "heavy_snow",
        fraction(&depth, |v| v > s.moderate_snow && v <= s.heavy_snow),
    );
    out.insert("very_heavy_snow", fraction(&depth, |v| v > s.heavy_snow));
}

/// Provider apparent temperature when present, otherwise computed from temperature,
/// humidity and wind.
fn apparent_values(day: &DailyClimatology) -> Vec<f64> {
    if day.has(Parameter::ApparentTemperature) {
        return day.values(Parameter::ApparentTemperature);
    }
    day.triples(Parameter::Temperature, Parameter::Humidity, Parameter::WindSpeed)
        .into_iter()
        .map(|(t, h, w)| apparent_temperature(t, h, w, None))
        .collect()
}

pub fn apparent(day: &DailyClimatology, config: &ClimateConfig, out: &mut ProbabilityMap) {
    let at = apparent_values(day);
    if at.is_empty() {
        return;
    }
    let a = &config.apparent_temperature;
    out.insert("extreme_cold_feels_like", fraction(&at, |v| v < a.extreme_cold));
    out.insert(
        "very_cold_feels_like",
        fraction(&at, |v| v >= a.extreme_cold && v < a.very_cold),
    );
    out.insert(
        "cold_feels_like",
        fraction(&at, |v| v >= a.very_cold && v < a.cold),
    );
    out.insert(
        "comfortable_feels_like",
        fraction(&at, |v| v >= a.cold && v <= a.comfortable_max),
    );
    out.insert(
        "hot_feels_like",
        fraction(&at, |v| v > a.comfortable_max && v < a.hot),
    );
    out.insert(
        "very_hot_feels_like",
        fraction(&at, |v| v >= a.hot && v < a.extreme_heat),
    );
    out.insert("extreme_heat_feels_like", fraction(&at, |v| v >= a.extreme_heat));
}

pub fn weather_conditions(day: &DailyClimatology, out: &mut ProbabilityMap) {
    let codes = day.values(Parameter::WeatherCode);
    if codes.is_empty() {
        return;
    }
    let categories: Vec<Option<WeatherCategory>> = codes
        .iter()
        .map(|c| WeatherCode::from_f64(*c).map(|code| code.category()))
        .collect();
    for category in WeatherCategory::ALL {
        let hits = categories.iter().filter(|c| **c == Some(category)).count();
        out.insert(
            format!("weather_{}", category.name()),
            hits as f64 / categories.len() as f64,
        );
    }
}

pub fn wind_gusts(day: &DailyClimatology, config: &ClimateConfig, out: &mut ProbabilityMap) {
    let gusts = day.values(Parameter::WindGusts);
    if gusts.is_empty() {
        return;
    }
    let g = &config.wind_gusts;
    out.insert("calm_gusts", fraction(&gusts, |v| v < g.calm));
    out.insert(
        "moderate_gusts",
        fraction(&gusts, |v| v >= g.calm && v < g.moderate),
    );
    out.insert(
        "strong_gusts",
        fraction(&gusts, |v| v >= g.moderate && v < g.strong),
    );
    out.insert(
        "very_strong_gusts",
        fraction(&gusts, |v| v >= g.strong && v < g.very_strong),
    );
    out.insert(
        "storm_gusts",
        fraction(&gusts, |v| v >= g.very_strong && v < g.hurricane),
    );
    out.insert("hurricane_gusts", fraction(&gusts, |v| v >= g.hurricane));
}

const AIR_QUALITY_LEVELS: [&str; 6] = [
    "excellent",
    "good",
    "moderate",
    "poor",
    "very_poor",
    "hazardous",
];

const THUNDERSTORM_LEVELS: [&str; 7] = [
    "none",
    "very_low",
    "low",
    "moderate",
    "high",
    "very_high",
    "extreme",
];

pub fn air_quality(day: &DailyClimatology, config: &ClimateConfig, out: &mut ProbabilityMap) {
    let aod = day.values(Parameter::AirQuality);
    if !aod.is_empty() {
        for level in AIR_QUALITY_LEVELS {
            out.insert(
                format!("air_quality_{}", level),
                fraction(&aod, |v| config.air_quality.level(v) == level),
            );
        }
    }

    let bc = day.values(Parameter::BlackCarbon);
    if !bc.is_empty() {
        let b = &config.black_carbon;
        out.insert("black_carbon_clean", fraction(&bc, |v| v < b.clean));
        out.insert("black_carbon_low", fraction(&bc, |v| v >= b.clean && v < b.low));
        out.insert("black_carbon_moderate", fraction(&bc, |v| v >= b.low && v < b.high));
        out.insert("black_carbon_high", fraction(&bc, |v| v >= b.high));
    }

    let dust = day.values(Parameter::Dust);
    if !dust.is_empty() {
        let d = &config.dust;
        out.insert("dust_minimal", fraction(&dust, |v| v < d.minimal));
        out.insert("dust_low", fraction(&dust, |v| v >= d.minimal && v < d.low));
        out.insert("dust_moderate", fraction(&dust, |v| v >= d.low && v < d.high));
        out.insert("dust_high", fraction(&dust, |v| v >= d.high && v < d.storm));
        out.insert("dust_storm", fraction(&dust, |v| v >= d.storm));
    }
}

pub fn thunderstorm(day: &DailyClimatology, config: &ClimateConfig, out: &mut ProbabilityMap) {
    let cape = day.values(Parameter::ThunderstormRisk);
    if cape.is_empty() {
        return;
    }
    for level in THUNDERSTORM_LEVELS {
        out.insert(
            format!("thunderstorm_{}", level),
            fraction(&cape, |v| config.thunderstorm.risk_level(v) == level),
        );
    }
}

fn describe(values: &[f64], unit: &str) -> CategoryStatistics {
    let s = sorted(values);
    CategoryStatistics {
        mean: stats::mean(values),
        min: s.first().copied(),
        max: s.last().copied(),
        std: Some(stats::sample_std(values)),
        percentile_10: percentile_sorted(&s, 10.0),
        percentile_90: percentile_sorted(&s, 90.0),
        unit: Some(unit.to_string()),
        ..Default::default()
    }
}

/// Keeps only the listed summary fields of a full description.
fn pick(full: CategoryStatistics, fields: &[&str]) -> CategoryStatistics {
    let keep = |name: &str| fields.contains(&name);
    CategoryStatistics {
        mean: full.mean.filter(|_| keep("mean")),
        min: full.min.filter(|_| keep("min")),
        max: full.max.filter(|_| keep("max")),
        std: full.std.filter(|_| keep("std")),
        percentile_10: full.percentile_10.filter(|_| keep("percentile_10")),
        percentile_90: full.percentile_90.filter(|_| keep("percentile_90")),
        unit: full.unit,
        ..Default::default()
    }
}

fn simple(
    day: &DailyClimatology,
    parameter: Parameter,
    fields: &[&str],
) -> Option<CategoryStatistics> {
    let values = day.values(parameter);
    if values.is_empty() {
        return None;
    }
    Some(pick(describe(&values, parameter.unit()), fields))
}

/// Summary statistics for every category with data in the slice.
pub fn statistics(day: &DailyClimatology, config: &ClimateConfig) -> BTreeMap<String, CategoryStatistics> {
    let mut out = BTreeMap::new();

    let means = day.values(Parameter::Temperature);
    if !means.is_empty() {
        let mut t = pick(
            describe(&means, Parameter::Temperature.unit()),
            &["mean", "min", "max", "std", "percentile_10", "percentile_90"],
        );
        t.min = stats::min(&day.values(Parameter::TemperatureMin)).or(t.min);
        t.max = stats::max(&day.values(Parameter::TemperatureMax)).or(t.max);
        out.insert("temperature".to_string(), t);
    }

    let entries: [(&str, Parameter, &[&str]); 13] = [
        ("precipitation", Parameter::Precipitation, &["mean", "max", "std", "percentile_90"]),
        ("wind", Parameter::WindSpeed, &["mean", "max", "std", "percentile_90"]),
        ("humidity", Parameter::Humidity, &["mean", "min", "max", "std"]),
        ("dew_point", Parameter::DewPoint, &["mean", "min", "max"]),
        ("cloudiness", Parameter::CloudCover, &["mean", "min", "max"]),
        ("uv_index", Parameter::UvIndex, &["mean", "max", "percentile_90"]),
        ("solar_radiation", Parameter::SolarRadiation, &["mean", "max"]),
        ("pressure", Parameter::Pressure, &["mean", "min", "max", "std"]),
        ("wind_10m", Parameter::WindSpeed10m, &["mean", "max"]),
        ("apparent_temperature", Parameter::ApparentTemperature, &["mean", "min", "max", "std"]),
        ("wind_gusts", Parameter::WindGusts, &["mean", "max", "percentile_90"]),
        ("black_carbon", Parameter::BlackCarbon, &["mean", "max", "percentile_90"]),
        ("dust", Parameter::Dust, &["mean", "max", "percentile_90"]),
    ];
    for (name, parameter, fields) in entries {
        if let Some(s) = simple(day, parameter, fields) {
            out.insert(name.to_string(), s);
        }
    }

    let depth = day.values(Parameter::SnowDepth);
    if !depth.is_empty() {
        let mut s = pick(describe(&depth, Parameter::SnowDepth.unit()), &["mean", "max"]);
        s.days_with_snow = Some(depth.iter().filter(|v| **v > 0.0).count());
        out.insert("snow".to_string(), s);
    }

    let codes: Vec<i64> = day
        .values(Parameter::WeatherCode)
        .into_iter()
        .map(|c| c.round() as i64)
        .collect();
    if let Some(most_common) = stats::mode_i64(codes) {
        let code = WeatherCode::from_i64(most_common);
        out.insert(
            "weather_code".to_string(),
            CategoryStatistics {
                most_common: Some(most_common),
                description: Some(code.map_or("Unknown", |c| c.description()).to_string()),
                category: Some(code.map_or("unknown", |c| c.category().name()).to_string()),
                ..Default::default()
            },
        );
    }

    if let Some(mut s) = simple(day, Parameter::AirQuality, &["mean", "max"]) {
        s.level = s.mean.map(|m| config.air_quality.level(m).to_string());
        out.insert("air_quality".to_string(), s);
    }

    if let Some(mut s) = simple(day, Parameter::ThunderstormRisk, &["mean", "max"]) {
        s.level = s.mean.map(|m| config.thunderstorm.risk_level(m).to_string());
        out.insert("thunderstorm".to_string(), s);
    }

    let heat: Vec<f64> = day
        .pairs(Parameter::Temperature, Parameter::Humidity)
        .into_iter()
        .map(|(t, h)| heat_index(t, h))
        .collect();
    let chill: Vec<f64> = day
        .pairs(Parameter::Temperature, Parameter::WindSpeed)
        .into_iter()
        .map(|(t, w)| wind_chill(t, w))
        .collect();
    if !heat.is_empty() || !chill.is_empty() {
        out.insert(
            "comfort".to_string(),
            CategoryStatistics {
                heat_index_mean: stats::mean(&heat),
                heat_index_max: stats::max(&heat),
                wind_chill_mean: stats::mean(&chill),
                wind_chill_min: stats::min(&chill),
                unit: Some("°C".to_string()),
                ..Default::default()
            },
        );
    }

    out
}
