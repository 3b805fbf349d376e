//! Reconciles per-source estimates of one parameter into a single weighted value with a
//! discrete confidence.
//!
//! Everything here is pure: no I/O, no clock, no randomness.

use crate::analysis::stats::{mean, median, population_std};
use crate::config::{AnalysisSettings, SourceWeights};
use crate::types::consensus::{Confidence, ConsensusResult};
use crate::types::parameter::Parameter;
use crate::types::series::SeriesSet;
use crate::types::source::SourceId;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

/// z-score of the two-sided 95 % interval.
const Z_95: f64 = 1.96;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsensusOptions {
    /// Leave flagged outliers out of the weighted value.
    pub exclude_outliers: bool,
    /// Relative deviation from the median of source means that flags an outlier.
    pub outlier_fraction: f64,
}

impl Default for ConsensusOptions {
    fn default() -> Self {
        Self {
            exclude_outliers: false,
            outlier_fraction: 0.20,
        }
    }
}

impl From<&AnalysisSettings> for ConsensusOptions {
    fn from(settings: &AnalysisSettings) -> Self {
        Self {
            exclude_outliers: settings.exclude_outliers,
            outlier_fraction: settings.outlier_fraction,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConsensusEngine {
    weights: SourceWeights,
    options: ConsensusOptions,
}

impl ConsensusEngine {
    pub fn new(weights: SourceWeights, options: ConsensusOptions) -> Self {
        Self { weights, options }
    }

    /// Consensus of `parameter` over every source set that carries it.
    ///
    /// A source contributes the arithmetic mean of its present values; sources
    /// without a single present value are ignored.
    pub fn consensus(
        &self,
        per_source: &BTreeMap<SourceId, SeriesSet>,
        parameter: Parameter,
    ) -> ConsensusResult {
        let means: BTreeMap<SourceId, f64> = per_source
            .iter()
            .filter_map(|(source, set)| Some((*source, set.get(parameter)?.mean()?)))
            .collect();
        self.consensus_from_means(parameter, &means)
    }

    /// Same as [`Self::consensus`] for already reduced per-source means.
    pub fn consensus_from_means(
        &self,
        parameter: Parameter,
        means: &BTreeMap<SourceId, f64>,
    ) -> ConsensusResult {
        let per_source_values: BTreeMap<SourceId, f64> = means
            .iter()
            .filter(|(_, v)| v.is_finite())
            .map(|(s, v)| (*s, *v))
            .collect();
        if per_source_values.is_empty() {
            debug!("No source reported {}", parameter);
            return ConsensusResult::empty(parameter);
        }

        let outlier_sources = self.flag_outliers(&per_source_values);
        if !outlier_sources.is_empty() {
            debug!(
                "{} outliers for {}: {:?}",
                outlier_sources.len(),
                parameter,
                outlier_sources
            );
        }

        let mut outliers_excluded = false;
        let mut contributing: BTreeMap<SourceId, f64> = per_source_values.clone();
        if self.options.exclude_outliers && !outlier_sources.is_empty() {
            if outlier_sources.len() == per_source_values.len() {
                warn!(
                    "Every source of {} is an outlier, keeping all of them",
                    parameter
                );
            } else {
                contributing.retain(|s, _| !outlier_sources.contains(s));
                outliers_excluded = true;
            }
        }

        let values: Vec<f64> = contributing.values().copied().collect();
        let (weighted, weight_sum) = contributing.iter().fold((0.0, 0.0), |(num, den), (s, v)| {
            let w = self.weights.weight(*s).max(0.0);
            (num + w * v, den + w)
        });
        let value = if weight_sum > 0.0 {
            weighted / weight_sum
        } else {
            mean(&values).unwrap_or_default()
        };

        let std = population_std(&values);
        let agreement = agreement_level(&values, std);
        let confidence = classify(values.len(), agreement);

        ConsensusResult {
            parameter,
            consensus_value: Some(value),
            confidence,
            agreement_level: agreement,
            contributing_sources: contributing.keys().copied().collect(),
            per_source_values,
            standard_deviation: std,
            confidence_interval: Some((value - Z_95 * std, value + Z_95 * std)),
            outlier_sources,
            outliers_excluded,
        }
    }

    /// Sources deviating from the median of all means by more than the outlier
    /// fraction. Nothing is flagged for a single source or a zero median.
    fn flag_outliers(&self, means: &BTreeMap<SourceId, f64>) -> BTreeSet<SourceId> {
        if means.len() < 2 {
            return BTreeSet::new();
        }
        let values: Vec<f64> = means.values().copied().collect();
        let Some(mid) = median(&values) else {
            return BTreeSet::new();
        };
        if mid == 0.0 {
            return BTreeSet::new();
        }
        let limit = self.options.outlier_fraction * mid.abs();
        means
            .iter()
            .filter(|(_, v)| (*v - mid).abs() > limit)
            .map(|(s, _)| *s)
            .collect()
    }
}

/// `exp(-2 * cv)`; exactly 1 for a single value, identical values or a zero mean.
fn agreement_level(values: &[f64], std: f64) -> f64 {
    if values.len() < 2 || std == 0.0 {
        return 1.0;
    }
    let m = mean(values).unwrap_or_default();
    if m == 0.0 {
        return 1.0;
    }
    (-2.0 * std / m.abs()).exp().clamp(0.0, 1.0)
}

fn classify(sources: usize, agreement: f64) -> Confidence {
    match sources {
        0 => Confidence::None,
        n if n >= 3 && agreement > 0.90 => Confidence::High,
        n if n >= 2 && agreement > 0.75 => Confidence::Medium,
        _ if agreement > 0.50 => Confidence::Low,
        _ => Confidence::VeryLow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::series::{DataPoint, ParameterSeries};
    use chrono::NaiveDate;

    fn engine() -> ConsensusEngine {
        ConsensusEngine::default()
    }

    fn means(entries: &[(SourceId, f64)]) -> BTreeMap<SourceId, f64> {
        entries.iter().copied().collect()
    }

    fn set(source: SourceId, parameter: Parameter, values: &[Option<f64>]) -> SeriesSet {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                DataPoint::new(
                    NaiveDate::from_ymd_opt(2000 + i as i32, 7, 15).unwrap(),
                    *v,
                )
            })
            .collect();
        let mut set = SeriesSet::new(source);
        set.insert(ParameterSeries::new(parameter, source, points));
        set
    }

    #[test]
    fn two_sources_weighted_medium() {
        let result = engine().consensus_from_means(
            Parameter::Temperature,
            &means(&[(SourceId::NasaPower, 20.0), (SourceId::OpenMeteo, 22.0)]),
        );
        let expected = (20.0 * 0.95 + 22.0 * 0.85) / (0.95 + 0.85);
        assert!((result.consensus_value.unwrap() - expected).abs() < 1e-12);
        assert!((result.consensus_value.unwrap() - 20.944).abs() < 1e-3);
        assert_eq!(result.standard_deviation, 1.0);
        let agreement = (-2.0_f64 * (1.0 / 21.0)).exp();
        assert!((result.agreement_level - agreement).abs() < 1e-12);
        assert_eq!(result.confidence, Confidence::Medium);
        assert_eq!(result.source_count(), 2);

        let (lo, hi) = result.confidence_interval.unwrap();
        assert!((lo - (expected - 1.96)).abs() < 1e-12);
        assert!((hi - (expected + 1.96)).abs() < 1e-12);
    }

    #[test]
    fn no_sources_gives_none() {
        let result = engine().consensus(&BTreeMap::new(), Parameter::Dust);
        assert_eq!(result.consensus_value, None);
        assert_eq!(result.confidence, Confidence::None);
        assert!(result.contributing_sources.is_empty());
    }

    #[test]
    fn single_source_is_never_medium() {
        let result = engine()
            .consensus_from_means(Parameter::Humidity, &means(&[(SourceId::NasaPower, 60.0)]));
        assert_eq!(result.agreement_level, 1.0);
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.standard_deviation, 0.0);
        assert_eq!(result.confidence_interval, Some((60.0, 60.0)));
    }

    #[test]
    fn identical_means_agree_exactly() {
        let result = engine().consensus_from_means(
            Parameter::Precipitation,
            &means(&[
                (SourceId::NasaPower, 0.1),
                (SourceId::OpenMeteo, 0.1),
                (SourceId::OpenMeteoEnhanced, 0.1),
            ]),
        );
        assert_eq!(result.agreement_level, 1.0);
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn divergent_sources_lower_confidence() {
        let result = engine().consensus_from_means(
            Parameter::Precipitation,
            &means(&[(SourceId::NasaPower, 1.0), (SourceId::OpenMeteo, 5.0)]),
        );
        assert!(result.agreement_level < 0.5);
        assert_eq!(result.confidence, Confidence::VeryLow);
    }

    #[test]
    fn outliers_flagged_but_kept_by_default() {
        let input = means(&[
            (SourceId::NasaPower, 20.0),
            (SourceId::OpenMeteo, 21.0),
            (SourceId::OpenMeteoEnhanced, 40.0),
        ]);
        let kept = engine().consensus_from_means(Parameter::Temperature, &input);
        assert_eq!(
            kept.outlier_sources,
            BTreeSet::from([SourceId::OpenMeteoEnhanced])
        );
        assert_eq!(kept.source_count(), 3);
        assert!(!kept.outliers_excluded);

        let excluding = ConsensusEngine::new(
            SourceWeights::default(),
            ConsensusOptions {
                exclude_outliers: true,
                ..Default::default()
            },
        );
        let dropped = excluding.consensus_from_means(Parameter::Temperature, &input);
        assert!(dropped.outliers_excluded);
        assert_eq!(dropped.source_count(), 2);
        assert_eq!(dropped.per_source_values.len(), 3);
        assert!(dropped.consensus_value.unwrap() < 21.0);
    }

    #[test]
    fn two_diverging_sources_are_both_flagged() {
        let input = means(&[(SourceId::NasaPower, 10.0), (SourceId::OpenMeteo, 20.0)]);
        let kept = engine().consensus_from_means(Parameter::Temperature, &input);
        assert_eq!(
            kept.outlier_sources,
            BTreeSet::from([SourceId::NasaPower, SourceId::OpenMeteo])
        );
        assert!(!kept.outliers_excluded);
        assert_eq!(kept.source_count(), 2);

        let excluding = ConsensusEngine::new(
            SourceWeights::default(),
            ConsensusOptions {
                exclude_outliers: true,
                ..Default::default()
            },
        );
        let all_flagged = excluding.consensus_from_means(Parameter::Temperature, &input);
        assert!(!all_flagged.outliers_excluded);
        assert_eq!(all_flagged.source_count(), 2);

        let close = means(&[(SourceId::NasaPower, 20.0), (SourceId::OpenMeteo, 22.0)]);
        assert!(engine()
            .consensus_from_means(Parameter::Temperature, &close)
            .outlier_sources
            .is_empty());
    }

    #[test]
    fn series_means_skip_missing_values() {
        let mut per_source = BTreeMap::new();
        per_source.insert(
            SourceId::NasaPower,
            set(SourceId::NasaPower, Parameter::WindSpeed, &[Some(2.0), None, Some(4.0)]),
        );
        per_source.insert(
            SourceId::OpenMeteo,
            set(SourceId::OpenMeteo, Parameter::WindSpeed, &[None, None]),
        );
        let result = engine().consensus(&per_source, Parameter::WindSpeed);
        let value = result.consensus_value.unwrap();
        assert!((value - 3.0).abs() < 1e-9, "{value}");
        assert_eq!(
            result.contributing_sources,
            BTreeSet::from([SourceId::NasaPower])
        );
    }

    #[test]
    fn consensus_is_repeatable() {
        let input = means(&[
            (SourceId::NasaPower, 12.3),
            (SourceId::OpenMeteo, 11.9),
            (SourceId::OpenMeteoEnhanced, 12.8),
        ]);
        let a = engine().consensus_from_means(Parameter::Temperature, &input);
        let b = engine().consensus_from_means(Parameter::Temperature, &input);
        assert_eq!(a, b);
    }
}
