//! Small descriptive-statistics helpers over `f64` slices.
//!
//! None of them return NaN: empty input yields `None`, and non-finite values are
//! expected to have been filtered out by the caller.

use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().map(OrderedFloat).min().map(|v| v.0)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().map(OrderedFloat).max().map(|v| v.0)
}

fn all_identical(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

fn sum_sq_dev(values: &[f64], mean: f64) -> f64 {
    values.iter().map(|v| (v - mean).powi(2)).sum()
}

/// Sample standard deviation (n - 1). Zero for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 || all_identical(values) {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    (sum_sq_dev(values, m) / (values.len() - 1) as f64).sqrt()
}

/// Population standard deviation (n). Exactly zero when all values are equal.
pub fn population_std(values: &[f64]) -> f64 {
    if values.len() < 2 || all_identical(values) {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    (sum_sq_dev(values, m) / values.len() as f64).sqrt()
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by_key(|v| OrderedFloat(*v));
    sorted
}

/// Percentile (`q` in `[0, 100]`) with linear interpolation between closest ranks.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    percentile_sorted(&sorted(values), q)
}

pub fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    match sorted.len() {
        0 => None,
        1 => Some(sorted[0]),
        n => {
            let rank = (q.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let fraction = rank - lower as f64;
            Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
        }
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 50.0)
}

/// Most frequent integer value; ties resolve to the smallest value.
pub fn mode_i64(values: impl IntoIterator<Item = i64>) -> Option<i64> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    counts
        .iter()
        .fold(None, |best: Option<(i64, usize)>, (&value, &count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((value, count)),
        })
        .map(|(value, _)| value)
}

/// Share of `values` matching `predicate`, 0 for empty input.
pub fn fraction<F>(values: &[f64], predicate: F) -> f64
where
    F: Fn(f64) -> bool,
{
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|v| predicate(**v)).count() as f64 / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_linearly() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 100.0), Some(4.0));
        assert_eq!(percentile(&values, 50.0), Some(2.5));
        assert!((percentile(&values, 90.0).unwrap() - 3.7).abs() < 1e-12);
        assert_eq!(percentile(&[], 50.0), None);
        assert_eq!(percentile(&[7.0], 10.0), Some(7.0));
    }

    #[test]
    fn standard_deviations() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(population_std(&values), 2.0);
        assert!((sample_std(&values) - 2.138089935299395).abs() < 1e-12);
        assert_eq!(sample_std(&[3.0]), 0.0);
        assert_eq!(population_std(&[0.1, 0.1, 0.1]), 0.0);
    }

    #[test]
    fn mode_prefers_smallest_on_tie() {
        assert_eq!(mode_i64([3, 61, 61, 3, 0]), Some(3));
        assert_eq!(mode_i64([95, 95, 1]), Some(95));
        assert_eq!(mode_i64(Vec::new()), None);
    }

    #[test]
    fn fraction_of_empty_is_zero() {
        assert_eq!(fraction(&[], |v| v > 0.0), 0.0);
        assert_eq!(fraction(&[1.0, -1.0], |v| v > 0.0), 0.5);
    }
}
