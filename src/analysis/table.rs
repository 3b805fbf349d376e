//! Row-oriented view of historical series: one record per calendar date holding every
//! parameter known for that date. This is what the analyzer slices by day-of-year.

use crate::config::SourceWeights;
use crate::types::parameter::Parameter;
use crate::types::series::SeriesSet;
use crate::types::source::SourceId;
use crate::utils;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ClimateRecord {
    pub date: NaiveDate,
    values: BTreeMap<Parameter, f64>,
}

impl ClimateRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style setter, handy for tests and fixtures.
    pub fn with(mut self, parameter: Parameter, value: f64) -> Self {
        self.set(parameter, value);
        self
    }

    /// Non-finite values are ignored so they can never reach the statistics.
    pub fn set(&mut self, parameter: Parameter, value: f64) {
        if value.is_finite() {
            self.values.insert(parameter, value);
        }
    }

    pub fn get(&self, parameter: Parameter) -> Option<f64> {
        self.values.get(&parameter).copied()
    }

    pub fn has(&self, parameter: Parameter) -> bool {
        self.values.contains_key(&parameter)
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Leap-year calendar day, see [`utils::day_of_year`].
    pub fn day_of_year(&self) -> u32 {
        utils::day_of_year(self.date)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Historical observations restricted to one day-of-year, one record per year.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyClimatology {
    pub day_of_year: u32,
    pub records: Vec<ClimateRecord>,
}

impl DailyClimatology {
    pub fn new(day_of_year: u32, records: Vec<ClimateRecord>) -> Self {
        Self {
            day_of_year,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has(&self, parameter: Parameter) -> bool {
        self.records.iter().any(|r| r.has(parameter))
    }

    pub fn values(&self, parameter: Parameter) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.get(parameter)).collect()
    }

    /// Values of the first parameter that has data, tried per record.
    pub fn values_or(&self, primary: Parameter, fallback: Parameter) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|r| r.get(primary).or_else(|| r.get(fallback)))
            .collect()
    }

    /// Records where both parameters are present.
    pub fn pairs(&self, a: Parameter, b: Parameter) -> Vec<(f64, f64)> {
        self.records
            .iter()
            .filter_map(|r| Some((r.get(a)?, r.get(b)?)))
            .collect()
    }

    pub fn triples(&self, a: Parameter, b: Parameter, c: Parameter) -> Vec<(f64, f64, f64)> {
        self.records
            .iter()
            .filter_map(|r| Some((r.get(a)?, r.get(b)?, r.get(c)?)))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClimateTable {
    records: Vec<ClimateRecord>,
}

impl ClimateTable {
    pub fn from_records(mut records: Vec<ClimateRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        Self { records }
    }

    /// One source's series, merged per date. Dates without a single present value
    /// produce no record.
    pub fn from_series_set(set: &SeriesSet) -> Self {
        let mut by_date: BTreeMap<NaiveDate, ClimateRecord> = BTreeMap::new();
        for series in set.iter() {
            for point in &series.points {
                if let Some(value) = point.value {
                    by_date
                        .entry(point.date)
                        .or_insert_with(|| ClimateRecord::new(point.date))
                        .set(series.parameter, value);
                }
            }
        }
        Self {
            records: by_date.into_values().filter(|r| !r.is_empty()).collect(),
        }
    }

    /// Consensus series from several sources: per date and parameter, the
    /// reliability-weighted mean of every source reporting a value that day.
    pub fn from_sources(sources: &BTreeMap<SourceId, SeriesSet>, weights: &SourceWeights) -> Self {
        // (date, parameter) -> (weighted sum, weight sum, plain sum, count)
        let mut acc: BTreeMap<(NaiveDate, Parameter), (f64, f64, f64, usize)> = BTreeMap::new();
        for (source, set) in sources {
            let weight = weights.weight(*source).max(0.0);
            for series in set.iter() {
                for point in &series.points {
                    if let Some(value) = point.value.filter(|v| v.is_finite()) {
                        let entry = acc
                            .entry((point.date, series.parameter))
                            .or_insert((0.0, 0.0, 0.0, 0));
                        entry.0 += weight * value;
                        entry.1 += weight;
                        entry.2 += value;
                        entry.3 += 1;
                    }
                }
            }
        }

        let mut by_date: BTreeMap<NaiveDate, ClimateRecord> = BTreeMap::new();
        for ((date, parameter), (weighted, weight_sum, plain, count)) in acc {
            let value = if weight_sum > 0.0 {
                weighted / weight_sum
            } else {
                plain / count as f64
            };
            by_date
                .entry(date)
                .or_insert_with(|| ClimateRecord::new(date))
                .set(parameter, value);
        }
        Self {
            records: by_date.into_values().collect(),
        }
    }

    pub fn records(&self) -> &[ClimateRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First and last year present in the table.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        Some((self.records.first()?.year(), self.records.last()?.year()))
    }

    pub fn for_day(&self, day_of_year: u32) -> DailyClimatology {
        DailyClimatology::new(
            day_of_year,
            self.records
                .iter()
                .filter(|r| r.day_of_year() == day_of_year)
                .cloned()
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::series::{DataPoint, ParameterSeries};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn set(source: SourceId, parameter: Parameter, points: &[(NaiveDate, Option<f64>)]) -> SeriesSet {
        let mut set = SeriesSet::new(source);
        set.insert(ParameterSeries::new(
            parameter,
            source,
            points.iter().map(|(d, v)| DataPoint::new(*d, *v)).collect(),
        ));
        set
    }

    #[test]
    fn day_slice_pools_years() {
        let s = set(
            SourceId::NasaPower,
            Parameter::Temperature,
            &[
                (date(2000, 2, 1), Some(1.0)),
                (date(2001, 2, 1), Some(2.0)),
                (date(2001, 2, 2), Some(3.0)),
                (date(2002, 2, 1), None),
            ],
        );
        let table = ClimateTable::from_series_set(&s);
        assert_eq!(table.len(), 3);
        assert_eq!(table.year_span(), Some((2000, 2001)));

        let day = table.for_day(32);
        assert_eq!(day.len(), 2);
        assert_eq!(day.values(Parameter::Temperature), vec![1.0, 2.0]);
    }

    #[test]
    fn leap_years_pool_the_same_calendar_date() {
        let points: Vec<(NaiveDate, Option<f64>)> = (1991..=2020)
            .flat_map(|y| [(date(y, 7, 14), Some(10.0)), (date(y, 7, 15), Some(35.0))])
            .collect();
        let table = ClimateTable::from_series_set(&set(
            SourceId::NasaPower,
            Parameter::TemperatureMax,
            &points,
        ));

        let day = table.for_day(utils::day_of_year(date(2023, 7, 15)));
        assert_eq!(day.len(), 30);
        assert!(day.values(Parameter::TemperatureMax).iter().all(|v| *v == 35.0));
        assert!(day.records.iter().all(|r| r.date.day() == 15));
    }

    #[test]
    fn all_missing_dates_leave_no_records() {
        let points: Vec<(NaiveDate, Option<f64>)> =
            (1991..=2020).map(|y| (date(y, 1, 1), None)).collect();
        let table = ClimateTable::from_series_set(&set(
            SourceId::NasaPower,
            Parameter::Temperature,
            &points,
        ));
        assert!(table.is_empty());
        assert!(table.for_day(1).is_empty());
    }

    #[test]
    fn sources_merge_with_weights() {
        let mut sources = BTreeMap::new();
        sources.insert(
            SourceId::NasaPower,
            set(SourceId::NasaPower, Parameter::Temperature, &[(date(2000, 1, 1), Some(20.0))]),
        );
        sources.insert(
            SourceId::OpenMeteo,
            set(
                SourceId::OpenMeteo,
                Parameter::Temperature,
                &[(date(2000, 1, 1), Some(22.0)), (date(2000, 1, 2), Some(5.0))],
            ),
        );
        let table = ClimateTable::from_sources(&sources, &SourceWeights::default());
        let first = table.records()[0].get(Parameter::Temperature).unwrap();
        assert!((first - (20.0 * 0.95 + 22.0 * 0.85) / 1.8).abs() < 1e-12);
        assert_eq!(table.records()[1].get(Parameter::Temperature), Some(5.0));
    }

    #[test]
    fn non_finite_values_are_dropped() {
        let record = ClimateRecord::new(date(2000, 1, 1)).with(Parameter::Dust, f64::NAN);
        assert!(!record.has(Parameter::Dust));
    }
}
