use crate::analysis::categories::{self, ProbabilityMap};
use crate::analysis::table::{ClimateTable, DailyClimatology};
use crate::config::ClimateConfig;
use crate::types::report::{ProbabilityReport, SummaryReport};
use crate::utils::{day_of_year, day_of_year_label};
use chrono::NaiveDate;
use log::{debug, warn};
use std::sync::Arc;

/// Turns day-of-year slices of historical data into probability reports.
///
/// Pure computation: no I/O, no randomness. The same table always yields the same
/// report.
#[derive(Debug, Clone)]
pub struct StatisticalAnalyzer {
    config: Arc<ClimateConfig>,
}

impl StatisticalAnalyzer {
    pub fn new(config: Arc<ClimateConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClimateConfig {
        &self.config
    }

    /// Analyzes the records of `table` falling on `day_of_year`.
    pub fn analyze_day(&self, table: &ClimateTable, day_of_year: u32) -> ProbabilityReport {
        self.analyze_climatology(&table.for_day(day_of_year))
    }

    /// Probabilities and statistics for an already sliced day.
    ///
    /// An empty slice yields a report with `error` set and no probabilities.
    pub fn analyze_climatology(&self, day: &DailyClimatology) -> ProbabilityReport {
        let date_example = day_of_year_label(day.day_of_year);
        if day.is_empty() {
            debug!("No historical rows for day {}", day.day_of_year);
            return ProbabilityReport::insufficient_data(day.day_of_year, date_example);
        }
        if day.len() < self.config.analysis.min_years_data {
            warn!(
                "Day {} has only {} historical observations, {} recommended",
                day.day_of_year,
                day.len(),
                self.config.analysis.min_years_data
            );
        }

        let config = self.config.as_ref();
        let mut probabilities = ProbabilityMap::default();
        categories::temperature(day, config, &mut probabilities);
        categories::precipitation(day, config, &mut probabilities);
        categories::wind(day, config, &mut probabilities);
        categories::humidity(day, config, &mut probabilities);
        categories::comfort(day, config, &mut probabilities);
        categories::cloudiness(day, config, &mut probabilities);
        categories::uv_index(day, config, &mut probabilities);
        categories::pressure(day, config, &mut probabilities);
        categories::snow(day, config, &mut probabilities);
        categories::apparent(day, config, &mut probabilities);
        categories::weather_conditions(day, &mut probabilities);
        categories::wind_gusts(day, config, &mut probabilities);
        categories::air_quality(day, config, &mut probabilities);
        categories::thunderstorm(day, config, &mut probabilities);

        ProbabilityReport {
            day_of_year: day.day_of_year,
            date_example,
            probabilities: probabilities.into_inner(),
            statistics: categories::statistics(day, config),
            data_points: day.len(),
            error: None,
        }
    }

    /// The eight headline probabilities of [`Self::analyze_day`], missing ones as 0.
    pub fn summary_probabilities(&self, table: &ClimateTable, day_of_year: u32) -> SummaryReport {
        SummaryReport::from(self.analyze_day(table, day_of_year))
    }

    /// One report per calendar day from `start` to `end` inclusive, in order.
    ///
    /// Ranges spanning New Year work because each date maps to its own calendar day.
    pub fn analyze_date_range(
        &self,
        table: &ClimateTable,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<ProbabilityReport> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|d| self.analyze_day(table, day_of_year(d)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::table::ClimateRecord;
    use crate::types::parameter::Parameter;
    use crate::types::series::{DataPoint, ParameterSeries, SeriesSet};
    use crate::types::source::SourceId;

    /// July 15 on the leap-year calendar.
    const JULY_15: u32 = 197;

    fn analyzer() -> StatisticalAnalyzer {
        StatisticalAnalyzer::new(Arc::new(ClimateConfig::default()))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hot_july_table() -> ClimateTable {
        let records = (1991..=2020)
            .map(|year| {
                ClimateRecord::new(date(year, 7, 15))
                    .with(Parameter::TemperatureMax, 35.0)
                    .with(Parameter::TemperatureMin, 20.0)
                    .with(Parameter::Temperature, 27.5)
                    .with(Parameter::Humidity, 50.0)
                    .with(Parameter::Precipitation, 0.0)
                    .with(Parameter::WindSpeed, 3.0)
            })
            .collect();
        ClimateTable::from_records(records)
    }

    #[test]
    fn identical_hot_years_are_always_very_hot() {
        let table = hot_july_table();
        let report = analyzer().analyze_day(&table, JULY_15);
        assert_eq!(report.data_points, 30);
        assert!(report.error.is_none());
        assert_eq!(report.probabilities["very_hot"], 1.0);
        assert_eq!(report.probabilities["hot"], 1.0);
        assert_eq!(report.probabilities["very_cold"], 0.0);
        assert_eq!(report.probabilities["cold"], 0.0);
        assert_eq!(report.probabilities["dry"], 1.0);
        assert_eq!(report.statistics["temperature"].max, Some(35.0));
        assert_eq!(report.statistics["temperature"].min, Some(20.0));
        assert_eq!(report.statistics["temperature"].std, Some(0.0));
    }

    #[test]
    fn empty_day_reports_error_instead_of_nan() {
        let report = analyzer().analyze_day(&hot_july_table(), 10);
        assert_eq!(report.data_points, 0);
        assert!(report.error.is_some());
        assert!(report.probabilities.is_empty());
    }

    #[test]
    fn probabilities_stay_in_unit_interval() {
        let records = (0..40)
            .map(|i| {
                let year = 1980 + i;
                let x = i as f64;
                ClimateRecord::new(date(year, 3, 1))
                    .with(Parameter::TemperatureMax, -20.0 + x * 1.5)
                    .with(Parameter::TemperatureMin, -35.0 + x)
                    .with(Parameter::Temperature, -25.0 + x * 1.2)
                    .with(Parameter::Humidity, (x * 2.5) % 100.0)
                    .with(Parameter::Precipitation, x * 4.0)
                    .with(Parameter::WindSpeed, x * 0.6)
                    .with(Parameter::CloudCover, x * 2.5)
                    .with(Parameter::UvIndex, x / 3.0)
                    .with(Parameter::Pressure, 96.0 + x * 0.2)
                    .with(Parameter::SnowDepth, 40.0 - x)
                    .with(Parameter::WeatherCode, [0.0, 3.0, 45.0, 63.0, 73.0, 95.0][i as usize % 6])
                    .with(Parameter::WindGusts, x)
                    .with(Parameter::AirQuality, x / 20.0)
                    .with(Parameter::BlackCarbon, x / 2.0)
                    .with(Parameter::Dust, x * 20.0)
                    .with(Parameter::ThunderstormRisk, x * 150.0)
            })
            .collect();
        let table = ClimateTable::from_records(records);
        let report = analyzer().analyze_day(&table, day_of_year(date(2001, 3, 1)));
        assert_eq!(report.data_points, 40);
        assert!(report.probabilities.len() > 60);
        for (name, p) in &report.probabilities {
            assert!((0.0..=1.0).contains(p), "{name} = {p}");
        }
        let weather: f64 = report
            .probabilities
            .iter()
            .filter(|(k, _)| k.starts_with("weather_"))
            .map(|(_, v)| v)
            .sum();
        assert!((weather - 1.0).abs() < 1e-9);
        assert_eq!(report.statistics["snow"].days_with_snow, Some(40));
        assert_eq!(report.statistics["weather_code"].most_common, Some(0));
    }

    #[test]
    fn repeated_analysis_is_identical() {
        let table = hot_july_table();
        let a = analyzer();
        assert_eq!(a.analyze_day(&table, JULY_15), a.analyze_day(&table, JULY_15));
    }

    #[test]
    fn summary_has_eight_keys() {
        let summary = analyzer().summary_probabilities(&hot_july_table(), JULY_15);
        assert_eq!(summary.probabilities.len(), 8);
        assert_eq!(summary.probabilities["very_hot"], 1.0);
        assert_eq!(summary.probabilities["very_windy"], 0.0);
    }

    #[test]
    fn range_wraps_over_new_year() {
        let records = (2000..2010)
            .flat_map(|y| {
                [
                    ClimateRecord::new(date(y, 12, 31)).with(Parameter::Temperature, -1.0),
                    ClimateRecord::new(date(y + 1, 1, 1)).with(Parameter::Temperature, -2.0),
                ]
            })
            .collect();
        let table = ClimateTable::from_records(records);
        let reports = analyzer().analyze_date_range(&table, date(2025, 12, 30), date(2026, 1, 2));
        assert_eq!(reports.len(), 4);
        assert_eq!(reports[0].day_of_year, 365);
        assert_eq!(reports[1].day_of_year, 366);
        assert_eq!(reports[2].day_of_year, 1);
        assert!(reports[0].is_error());
        assert_eq!(reports[1].data_points, 10);
        assert_eq!(reports[2].data_points, 10);
    }

    #[test]
    fn neighbouring_day_in_leap_years_is_not_pooled() {
        let records = (1991..=2020)
            .flat_map(|year| {
                [
                    ClimateRecord::new(date(year, 7, 14))
                        .with(Parameter::TemperatureMax, 10.0)
                        .with(Parameter::TemperatureMin, 5.0)
                        .with(Parameter::Temperature, 7.5),
                    ClimateRecord::new(date(year, 7, 15))
                        .with(Parameter::TemperatureMax, 35.0)
                        .with(Parameter::TemperatureMin, 20.0)
                        .with(Parameter::Temperature, 27.5),
                ]
            })
            .collect();
        let table = ClimateTable::from_records(records);

        let reports = analyzer().analyze_date_range(&table, date(2023, 7, 15), date(2023, 7, 15));
        assert_eq!(reports[0].data_points, 30);
        assert_eq!(reports[0].probabilities["very_hot"], 1.0);
        assert_eq!(reports[0].statistics["temperature"].min, Some(20.0));
    }

    #[test]
    fn all_missing_day_is_insufficient_data() {
        let mut set = SeriesSet::new(SourceId::NasaPower);
        set.insert(ParameterSeries::new(
            Parameter::Temperature,
            SourceId::NasaPower,
            (1991..=2020).map(|y| DataPoint::new(date(y, 1, 1), None)).collect(),
        ));
        let table = ClimateTable::from_series_set(&set);

        let report = analyzer().analyze_day(&table, 1);
        assert_eq!(report.data_points, 0);
        assert!(report.is_error());
        assert!(report.probabilities.is_empty());
    }
}
