//! Aggregation of per-day reports over a date range, plus the "best day" picks.

use crate::analysis::stats;
use crate::types::report::{
    AggregatedRange, AggregatedStatistics, BestDays, CategoryStatistics, DailyBreakdown,
};
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

/// Weights of the bad-weather score used to pick the best outdoor day.
const OUTDOOR_PENALTIES: [(&str, f64); 5] = [
    ("very_cold", 2.0),
    ("very_hot", 2.0),
    ("very_wet", 3.0),
    ("very_windy", 1.5),
    ("very_uncomfortable", 2.0),
];

fn outdoor_score(day: &DailyBreakdown) -> f64 {
    OUTDOOR_PENALTIES
        .iter()
        .map(|(key, weight)| day.probabilities.get(*key).copied().unwrap_or(0.0) * weight)
        .sum()
}

/// Per-day means of one statistics category, paired with the day's date.
fn daily_means<'a>(days: &'a [DailyBreakdown], category: &str) -> Vec<(&'a str, f64)> {
    days.iter()
        .filter_map(|d| Some((d.date.as_str(), d.statistics.get(category)?.mean?)))
        .collect()
}

fn values(means: &[(&str, f64)]) -> Vec<f64> {
    means.iter().map(|(_, v)| *v).collect()
}

/// Earliest day minimizing `key`; days without a score are skipped.
fn argmin_by<'a, I>(scored: I) -> Option<String>
where
    I: Iterator<Item = (&'a str, f64)>,
{
    scored
        .enumerate()
        .min_by_key(|(i, (_, score))| (OrderedFloat(*score), *i))
        .map(|(_, (date, _))| date.to_string())
}

/// Averages every probability over the days that report it, summarizes the daily
/// means of the four main categories and picks the best days.
///
/// Days carrying an error contribute nothing.
pub fn aggregate(days: &[DailyBreakdown]) -> AggregatedRange {
    let valid: Vec<DailyBreakdown> = days.iter().filter(|d| d.error.is_none()).cloned().collect();
    if valid.is_empty() {
        return AggregatedRange::default();
    }

    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for day in &valid {
        for (name, p) in &day.probabilities {
            let entry = sums.entry(name.as_str()).or_insert((0.0, 0));
            entry.0 += p;
            entry.1 += 1;
        }
    }
    let probabilities = sums
        .into_iter()
        .map(|(name, (sum, n))| (name.to_string(), sum / n as f64))
        .collect();

    let temperature = daily_means(&valid, "temperature");
    let precipitation = daily_means(&valid, "precipitation");
    let wind = daily_means(&valid, "wind");
    let humidity = daily_means(&valid, "humidity");

    let statistics = AggregatedStatistics {
        temperature: (!temperature.is_empty()).then(|| {
            let v = values(&temperature);
            CategoryStatistics {
                mean: stats::mean(&v),
                min: stats::min(&v),
                max: stats::max(&v),
                std: Some(stats::population_std(&v)),
                ..Default::default()
            }
        }),
        precipitation: (!precipitation.is_empty()).then(|| {
            let v = values(&precipitation);
            CategoryStatistics {
                mean: stats::mean(&v),
                total: Some(v.iter().sum()),
                max: stats::max(&v),
                ..Default::default()
            }
        }),
        wind: (!wind.is_empty()).then(|| {
            let v = values(&wind);
            CategoryStatistics {
                mean: stats::mean(&v),
                max: stats::max(&v),
                ..Default::default()
            }
        }),
        humidity: (!humidity.is_empty()).then(|| CategoryStatistics {
            mean: stats::mean(&values(&humidity)),
            ..Default::default()
        }),
    };

    let best_days = BestDays {
        outdoor_activity: argmin_by(valid.iter().map(|d| (d.date.as_str(), outdoor_score(d)))),
        minimal_rain: argmin_by(valid.iter().map(|d| {
            (
                d.date.as_str(),
                d.probabilities.get("very_wet").copied().unwrap_or(0.0),
            )
        })),
        warmest: argmin_by(temperature.iter().map(|(date, t)| (*date, -t))),
        coldest: argmin_by(temperature.iter().copied()),
    };

    AggregatedRange {
        probabilities,
        statistics,
        best_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: &str, probabilities: &[(&str, f64)], temperature: Option<f64>) -> DailyBreakdown {
        let mut statistics = BTreeMap::new();
        if let Some(t) = temperature {
            statistics.insert(
                "temperature".to_string(),
                CategoryStatistics {
                    mean: Some(t),
                    ..Default::default()
                },
            );
        }
        DailyBreakdown {
            date: date.to_string(),
            day_of_year: 1,
            day_name: "Monday".to_string(),
            probabilities: probabilities
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            statistics,
            data_points: 30,
            error: None,
        }
    }

    #[test]
    fn averages_and_best_days() {
        let days = vec![
            day("2025-07-01", &[("very_wet", 0.2), ("very_hot", 0.5)], Some(30.0)),
            day("2025-07-02", &[("very_wet", 0.0), ("very_hot", 0.1)], Some(20.0)),
            day("2025-07-03", &[("very_wet", 0.4)], None),
        ];
        let agg = aggregate(&days);

        assert!((agg.probabilities["very_wet"] - 0.2).abs() < 1e-12);
        // Averaged only over the days reporting it.
        assert!((agg.probabilities["very_hot"] - 0.3).abs() < 1e-12);

        let t = agg.statistics.temperature.unwrap();
        assert_eq!(t.mean, Some(25.0));
        assert_eq!(t.std, Some(5.0));
        assert!(agg.statistics.precipitation.is_none());

        assert_eq!(agg.best_days.outdoor_activity.as_deref(), Some("2025-07-02"));
        assert_eq!(agg.best_days.minimal_rain.as_deref(), Some("2025-07-02"));
        assert_eq!(agg.best_days.warmest.as_deref(), Some("2025-07-01"));
        assert_eq!(agg.best_days.coldest.as_deref(), Some("2025-07-02"));
    }

    #[test]
    fn ties_pick_the_earliest_day() {
        let days = vec![
            day("2025-01-01", &[("very_wet", 0.1)], Some(5.0)),
            day("2025-01-02", &[("very_wet", 0.1)], Some(5.0)),
        ];
        let agg = aggregate(&days);
        assert_eq!(agg.best_days.minimal_rain.as_deref(), Some("2025-01-01"));
        assert_eq!(agg.best_days.warmest.as_deref(), Some("2025-01-01"));
        assert_eq!(agg.best_days.coldest.as_deref(), Some("2025-01-01"));
    }

    #[test]
    fn error_days_are_ignored() {
        let mut bad = day("2025-01-01", &[], None);
        bad.error = Some("no data".to_string());
        assert_eq!(aggregate(&[bad]), AggregatedRange::default());
    }
}
