use crate::types::parameter::Parameter;
use crate::types::source::SourceId;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// One daily observation. `None` marks a value the provider did not deliver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl DataPoint {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self { date, value }
    }
}

/// Time series of one parameter as delivered by one source, ordered by date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSeries {
    pub parameter: Parameter,
    pub source: SourceId,
    pub points: Vec<DataPoint>,
}

impl ParameterSeries {
    pub fn new(parameter: Parameter, source: SourceId, mut points: Vec<DataPoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self {
            parameter,
            source,
            points,
        }
    }

    pub fn present_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().filter_map(|p| p.value)
    }

    pub fn present_count(&self) -> usize {
        self.present_values().count()
    }

    /// Arithmetic mean over the present values, `None` when nothing is present.
    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self
            .present_values()
            .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
        (count > 0).then(|| sum / count as f64)
    }

    pub fn filter_dates<F>(&self, mut keep: F) -> ParameterSeries
    where
        F: FnMut(NaiveDate) -> bool,
    {
        ParameterSeries {
            parameter: self.parameter,
            source: self.source,
            points: self.points.iter().copied().filter(|p| keep(p.date)).collect(),
        }
    }
}

/// Everything one source returned for one request, keyed by canonical parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSet {
    pub source: SourceId,
    series: BTreeMap<Parameter, ParameterSeries>,
}

impl SeriesSet {
    pub fn new(source: SourceId) -> Self {
        Self {
            source,
            series: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, series: ParameterSeries) {
        self.series.insert(series.parameter, series);
    }

    pub fn get(&self, parameter: Parameter) -> Option<&ParameterSeries> {
        self.series.get(&parameter)
    }

    pub fn parameters(&self) -> impl Iterator<Item = Parameter> + '_ {
        self.series.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterSeries> {
        self.series.values()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// True when no series carries at least one present value.
    pub fn is_empty(&self) -> bool {
        self.series.values().all(|s| s.present_count() == 0)
    }

    pub fn filter_dates<F>(&self, mut keep: F) -> SeriesSet
    where
        F: FnMut(NaiveDate) -> bool,
    {
        SeriesSet {
            source: self.source,
            series: self
                .series
                .iter()
                .map(|(p, s)| (*p, s.filter_dates(&mut keep)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn mean_skips_missing_values() {
        let series = ParameterSeries::new(
            Parameter::Temperature,
            SourceId::NasaPower,
            vec![
                DataPoint::new(date(2001, 1, 1), Some(10.0)),
                DataPoint::new(date(2000, 1, 1), None),
                DataPoint::new(date(2002, 1, 1), Some(20.0)),
            ],
        );
        assert_eq!(series.mean(), Some(15.0));
        assert_eq!(series.points[0].date, date(2000, 1, 1));
    }

    #[test]
    fn set_with_only_missing_values_is_empty() {
        let mut set = SeriesSet::new(SourceId::Cptec);
        set.insert(ParameterSeries::new(
            Parameter::ThunderstormRisk,
            SourceId::Cptec,
            vec![DataPoint::new(date(2000, 1, 1), None)],
        ));
        assert_eq!(set.len(), 1);
        assert!(set.is_empty());
    }
}
