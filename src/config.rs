//! Threshold tables and runtime settings.
//!
//! A [`ClimateConfig`] is built once (defaults or a JSON file), wrapped in an `Arc` and
//! shared read-only by the analyzer, the consensus engine and the sources. Every section
//! is `#[serde(default)]`, so a JSON file only needs the values it overrides.

use crate::error::ClimateError;
use crate::types::source::SourceId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Hybrid threshold: the percentile of the same-day distribution combined with an
/// absolute bound, whichever is more extreme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HybridThreshold {
    /// Percentile in `[0, 100]`.
    pub percentile: f64,
    pub absolute: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureThresholds {
    /// Applied to daily minimum temperature, cold direction.
    pub very_cold: HybridThreshold,
    pub cold: HybridThreshold,
    /// Applied to daily maximum temperature, hot direction.
    pub hot: HybridThreshold,
    pub very_hot: HybridThreshold,
    /// Inclusive mean-temperature band for `comfortable_temperature`.
    pub comfortable_range: (f64, f64),
}

impl Default for TemperatureThresholds {
    fn default() -> Self {
        Self {
            very_cold: HybridThreshold {
                percentile: 10.0,
                absolute: -10.0,
            },
            cold: HybridThreshold {
                percentile: 25.0,
                absolute: 10.0,
            },
            hot: HybridThreshold {
                percentile: 75.0,
                absolute: 25.0,
            },
            very_hot: HybridThreshold {
                percentile: 90.0,
                absolute: 30.0,
            },
            comfortable_range: (15.0, 25.0),
        }
    }
}

/// Daily precipitation in mm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecipitationThresholds {
    pub very_dry: f64,
    pub light_rain: f64,
    pub moderate_rain: f64,
    pub heavy_rain: f64,
    pub very_wet: f64,
}

impl Default for PrecipitationThresholds {
    fn default() -> Self {
        Self {
            very_dry: 0.1,
            light_rain: 2.5,
            moderate_rain: 10.0,
            heavy_rain: 50.0,
            very_wet: 100.0,
        }
    }
}

/// Wind speed in m/s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindThresholds {
    pub calm: f64,
    pub light_breeze: f64,
    pub moderate_wind: f64,
    pub strong_wind: f64,
    pub very_windy: f64,
}

impl Default for WindThresholds {
    fn default() -> Self {
        Self {
            calm: 2.0,
            light_breeze: 5.0,
            moderate_wind: 10.0,
            strong_wind: 15.0,
            very_windy: 20.0,
        }
    }
}

/// Relative humidity in %.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumidityThresholds {
    pub very_dry: f64,
    pub comfortable: f64,
    pub humid: f64,
    pub very_humid: f64,
}

impl Default for HumidityThresholds {
    fn default() -> Self {
        Self {
            very_dry: 30.0,
            comfortable: 60.0,
            humid: 80.0,
            very_humid: 90.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComfortThresholds {
    pub comfortable_temp_range: (f64, f64),
    pub comfortable_humidity_max: f64,
    pub uncomfortable_hot_temp_min: f64,
    pub uncomfortable_hot_humidity_min: f64,
    pub uncomfortable_cold_temp_max: f64,
    pub uncomfortable_cold_wind_min: f64,
    /// Heat index (°C) above which a day counts as very uncomfortable.
    pub very_uncomfortable_heat_index: f64,
}

impl Default for ComfortThresholds {
    fn default() -> Self {
        Self {
            comfortable_temp_range: (15.0, 25.0),
            comfortable_humidity_max: 70.0,
            uncomfortable_hot_temp_min: 27.0,
            uncomfortable_hot_humidity_min: 40.0,
            uncomfortable_cold_temp_max: 5.0,
            uncomfortable_cold_wind_min: 5.0,
            very_uncomfortable_heat_index: 40.0,
        }
    }
}

/// Cloud cover in %.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudThresholds {
    pub clear: f64,
    pub partly_cloudy: f64,
    pub mostly_cloudy: f64,
}

impl Default for CloudThresholds {
    fn default() -> Self {
        Self {
            clear: 25.0,
            partly_cloudy: 50.0,
            mostly_cloudy: 75.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UvThresholds {
    pub low: f64,
    pub moderate: f64,
    pub high: f64,
    pub very_high: f64,
}

impl Default for UvThresholds {
    fn default() -> Self {
        Self {
            low: 3.0,
            moderate: 6.0,
            high: 8.0,
            very_high: 11.0,
        }
    }
}

/// Surface pressure in kPa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureThresholds {
    pub very_low: f64,
    pub low: f64,
    pub high: f64,
    pub very_high: f64,
}

impl Default for PressureThresholds {
    fn default() -> Self {
        Self {
            very_low: 98.0,
            low: 100.0,
            high: 102.0,
            very_high: 103.0,
        }
    }
}

/// Snow depth in cm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowThresholds {
    pub no_snow: f64,
    pub light_snow: f64,
    pub moderate_snow: f64,
    pub heavy_snow: f64,
}

impl Default for SnowThresholds {
    fn default() -> Self {
        Self {
            no_snow: 0.0,
            light_snow: 5.0,
            moderate_snow: 15.0,
            heavy_snow: 30.0,
        }
    }
}

/// Apparent ("feels like") temperature in °C.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApparentTemperatureThresholds {
    pub extreme_cold: f64,
    pub very_cold: f64,
    pub cold: f64,
    pub comfortable_max: f64,
    pub hot: f64,
    pub extreme_heat: f64,
}

impl Default for ApparentTemperatureThresholds {
    fn default() -> Self {
        Self {
            extreme_cold: -27.0,
            very_cold: -10.0,
            cold: 5.0,
            comfortable_max: 25.0,
            hot: 32.0,
            extreme_heat: 41.0,
        }
    }
}

/// Wind gusts in m/s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindGustThresholds {
    pub calm: f64,
    pub moderate: f64,
    pub strong: f64,
    pub very_strong: f64,
    pub hurricane: f64,
}

impl Default for WindGustThresholds {
    fn default() -> Self {
        Self {
            calm: 5.0,
            moderate: 10.0,
            strong: 15.0,
            very_strong: 20.0,
            hurricane: 32.7,
        }
    }
}

/// Aerosol optical depth (dimensionless).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirQualityThresholds {
    pub excellent: f64,
    pub good: f64,
    pub moderate: f64,
    pub poor: f64,
    pub very_poor: f64,
}

impl Default for AirQualityThresholds {
    fn default() -> Self {
        Self {
            excellent: 0.05,
            good: 0.15,
            moderate: 0.35,
            poor: 0.65,
            very_poor: 1.0,
        }
    }
}

impl AirQualityThresholds {
    pub fn level(&self, aod: f64) -> &'static str {
        if aod < self.excellent {
            "excellent"
        } else if aod < self.good {
            "good"
        } else if aod < self.moderate {
            "moderate"
        } else if aod < self.poor {
            "poor"
        } else if aod < self.very_poor {
            "very_poor"
        } else {
            "hazardous"
        }
    }
}

/// Black carbon surface mass in µg/m³.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackCarbonThresholds {
    pub clean: f64,
    pub low: f64,
    pub high: f64,
}

impl Default for BlackCarbonThresholds {
    fn default() -> Self {
        Self {
            clean: 0.5,
            low: 2.0,
            high: 10.0,
        }
    }
}

/// Dust surface mass in µg/m³.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DustThresholds {
    pub minimal: f64,
    pub low: f64,
    pub high: f64,
    pub storm: f64,
}

impl Default for DustThresholds {
    fn default() -> Self {
        Self {
            minimal: 10.0,
            low: 50.0,
            high: 250.0,
            storm: 500.0,
        }
    }
}

/// CAPE in J/kg, lower bound of each risk level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThunderstormThresholds {
    pub very_low: f64,
    pub low: f64,
    pub moderate: f64,
    pub high: f64,
    pub very_high: f64,
    pub extreme: f64,
}

impl Default for ThunderstormThresholds {
    fn default() -> Self {
        Self {
            very_low: 300.0,
            low: 1000.0,
            moderate: 1500.0,
            high: 2500.0,
            very_high: 3500.0,
            extreme: 5000.0,
        }
    }
}

impl ThunderstormThresholds {
    pub fn risk_level(&self, cape: f64) -> &'static str {
        if cape < self.very_low {
            "none"
        } else if cape < self.low {
            "very_low"
        } else if cape < self.moderate {
            "low"
        } else if cape < self.high {
            "moderate"
        } else if cape < self.very_high {
            "high"
        } else if cape < self.extreme {
            "very_high"
        } else {
            "extreme"
        }
    }
}

/// Reliability weight per source, in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceWeights {
    pub nasa_power: f64,
    pub open_meteo: f64,
    pub open_meteo_enhanced: f64,
    pub ges_disc: f64,
    pub cptec: f64,
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            nasa_power: 0.95,
            open_meteo: 0.85,
            open_meteo_enhanced: 0.90,
            ges_disc: 0.95,
            cptec: 0.80,
        }
    }
}

impl SourceWeights {
    pub fn weight(&self, source: SourceId) -> f64 {
        match source {
            SourceId::NasaPower => self.nasa_power,
            SourceId::OpenMeteo => self.open_meteo,
            SourceId::OpenMeteoEnhanced => self.open_meteo_enhanced,
            SourceId::GesDisc => self.ges_disc,
            SourceId::Cptec => self.cptec,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Documented minimum for meaningful statistics; fewer years only log a warning.
    pub min_years_data: usize,
    pub default_years: usize,
    pub cache_enabled: bool,
    pub cache_ttl_days: u64,
    /// Upper bound on simultaneous source fetches.
    pub max_concurrent_fetches: usize,
    /// Relative deviation from the cross-source median that flags a source as outlier.
    pub outlier_fraction: f64,
    /// Drop flagged outliers from the weighted consensus.
    pub exclude_outliers: bool,
    /// Timeout of a single HTTP request to a provider.
    pub http_timeout_secs: u64,
    /// Deadline for a whole analysis call, fetches included.
    pub request_timeout_secs: u64,
    /// Blend the four surrounding 0.5° NASA POWER grid cells instead of one point.
    pub nasa_grid_interpolation: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            min_years_data: 10,
            default_years: 30,
            cache_enabled: true,
            cache_ttl_days: 30,
            max_concurrent_fetches: 5,
            outlier_fraction: 0.20,
            exclude_outliers: false,
            http_timeout_secs: 30,
            request_timeout_secs: 180,
            nasa_grid_interpolation: false,
        }
    }
}

impl AnalysisSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_days * 24 * 60 * 60)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Immutable configuration shared by every component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateConfig {
    pub temperature: TemperatureThresholds,
    pub precipitation: PrecipitationThresholds,
    pub wind: WindThresholds,
    pub humidity: HumidityThresholds,
    pub comfort: ComfortThresholds,
    pub cloud: CloudThresholds,
    pub uv: UvThresholds,
    pub pressure: PressureThresholds,
    pub snow: SnowThresholds,
    pub apparent_temperature: ApparentTemperatureThresholds,
    pub wind_gusts: WindGustThresholds,
    pub air_quality: AirQualityThresholds,
    pub black_carbon: BlackCarbonThresholds,
    pub dust: DustThresholds,
    pub thunderstorm: ThunderstormThresholds,
    pub source_weights: SourceWeights,
    pub analysis: AnalysisSettings,
}

impl ClimateConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ClimateError> {
        serde_json::from_str(json).map_err(ClimateError::ConfigParse)
    }

    pub async fn from_json_file(path: &Path) -> Result<Self, ClimateError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ClimateError::ConfigRead(path.to_path_buf(), e))?;
        Self::from_json_str(&text)
    }
}
