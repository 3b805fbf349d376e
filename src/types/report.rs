//! Serializable result structures handed to callers.
//!
//! All of them serialize to JSON as-is; optional statistics are skipped when absent.

use crate::types::consensus::ConsensusResult;
use crate::types::location::LatLon;
use crate::types::parameter::Parameter;
use crate::types::source::SourceId;
use serde::Serialize;
use std::collections::BTreeMap;

/// The eight headline probabilities reported by [`SummaryReport`].
pub const HEADLINE_CATEGORIES: [&str; 8] = [
    "very_cold",
    "cold",
    "comfortable",
    "hot",
    "very_hot",
    "very_wet",
    "very_windy",
    "very_uncomfortable",
];

/// Summary statistics of one physical category for a day-of-year slice.
///
/// Only the fields meaningful for the category are filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryStatistics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentile_10: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentile_90: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_with_snow: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_common: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heat_index_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heat_index_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_chill_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_chill_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Probabilities and statistics for one day-of-year pooled across all analyzed years.
///
/// Every probability lies in `[0, 1]`. A slice without observations carries an
/// `error` instead of numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityReport {
    pub day_of_year: u32,
    /// Calendar label such as `"July 15"` (resolved in a leap year).
    pub date_example: String,
    pub probabilities: BTreeMap<String, f64>,
    pub statistics: BTreeMap<String, CategoryStatistics>,
    /// Number of yearly observations in the day-of-year slice.
    pub data_points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbabilityReport {
    pub fn insufficient_data(day_of_year: u32, date_example: String) -> Self {
        Self {
            day_of_year,
            date_example,
            probabilities: BTreeMap::new(),
            statistics: BTreeMap::new(),
            data_points: 0,
            error: Some(format!("No historical data for day {}", day_of_year)),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Probability of a condition, 0 when the condition was not computed.
    pub fn probability(&self, condition: &str) -> f64 {
        self.probabilities.get(condition).copied().unwrap_or(0.0)
    }

    pub fn mean_of(&self, category: &str) -> Option<f64> {
        self.statistics.get(category).and_then(|s| s.mean)
    }
}

/// Reduced view of a [`ProbabilityReport`] with only [`HEADLINE_CATEGORIES`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub day_of_year: u32,
    pub date_example: String,
    pub probabilities: BTreeMap<String, f64>,
    pub statistics: BTreeMap<String, CategoryStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ProbabilityReport> for SummaryReport {
    fn from(report: ProbabilityReport) -> Self {
        let probabilities = if report.is_error() {
            BTreeMap::new()
        } else {
            HEADLINE_CATEGORIES
                .iter()
                .map(|key| (key.to_string(), report.probability(key)))
                .collect()
        };
        SummaryReport {
            day_of_year: report.day_of_year,
            date_example: report.date_example,
            probabilities,
            statistics: report.statistics,
            error: report.error,
        }
    }
}

/// Where the numbers of a report came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisMetadata {
    /// Display label of the data origin, e.g. `"NASA POWER"` or `"multi_source"`.
    pub data_source: String,
    pub sources: Vec<SourceId>,
    pub years_analyzed: String,
    pub data_points: usize,
    pub analysis_type: String,
    /// Sources that failed or returned nothing, with the reason.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Result of a single-date analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub location: LatLon,
    pub date: String,
    pub day_of_year: u32,
    pub date_name: String,
    pub probabilities: BTreeMap<String, f64>,
    pub statistics: BTreeMap<String, CategoryStatistics>,
    pub metadata: AnalysisMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One day of a range analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBreakdown {
    pub date: String,
    pub day_of_year: u32,
    pub day_name: String,
    pub probabilities: BTreeMap<String, f64>,
    pub statistics: BTreeMap<String, CategoryStatistics>,
    pub data_points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedStatistics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<CategoryStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<CategoryStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind: Option<CategoryStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<CategoryStatistics>,
}

/// Recommended dates within a range, formatted `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BestDays {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outdoor_activity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimal_rain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warmest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coldest: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedRange {
    pub probabilities: BTreeMap<String, f64>,
    pub statistics: AggregatedStatistics,
    pub best_days: BestDays,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRangeInfo {
    pub start: String,
    pub end: String,
    pub duration_days: usize,
}

/// Result of a date-range analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeReport {
    pub location: LatLon,
    pub date_range: DateRangeInfo,
    pub aggregated: AggregatedRange,
    pub daily_breakdown: Vec<DailyBreakdown>,
    pub metadata: AnalysisMetadata,
}

/// A source that did not contribute, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub source: SourceId,
    /// `source_unavailable` or `data_format_error`.
    pub kind: String,
    pub message: String,
}

/// Per-parameter consensus for one calendar day across the analyzed years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiSourceReport {
    pub location: LatLon,
    pub month: u32,
    pub day: u32,
    pub years_analyzed: String,
    pub data_sources: Vec<SourceId>,
    pub parameters: BTreeMap<Parameter, ConsensusResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<SourceFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_keeps_headline_categories_only() {
        let mut probabilities = BTreeMap::new();
        probabilities.insert("very_hot".to_string(), 0.4);
        probabilities.insert("dust_storm".to_string(), 0.1);
        let report = ProbabilityReport {
            day_of_year: 196,
            date_example: "July 14".to_string(),
            probabilities,
            statistics: BTreeMap::new(),
            data_points: 30,
            error: None,
        };

        let summary = SummaryReport::from(report);
        assert_eq!(summary.probabilities.len(), 8);
        assert_eq!(summary.probabilities["very_hot"], 0.4);
        assert_eq!(summary.probabilities["very_wet"], 0.0);
        assert!(!summary.probabilities.contains_key("dust_storm"));
    }

    #[test]
    fn insufficient_data_serializes_error_field() {
        let report = ProbabilityReport::insufficient_data(60, "February 29".to_string());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["data_points"], 0);
        assert!(json["error"].as_str().unwrap().contains("60"));
        assert!(json["probabilities"].as_object().unwrap().is_empty());
    }
}
