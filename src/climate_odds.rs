//! This module provides the main entry point of the crate. A [`ClimateOdds`] client
//! fetches decades of daily records for a location, pools them per day-of-year and
//! turns them into probabilities of weather conditions, optionally reconciling
//! several providers first.

use crate::analysis::analyzer::StatisticalAnalyzer;
use crate::analysis::range::aggregate;
use crate::analysis::table::ClimateTable;
use crate::config::ClimateConfig;
use crate::consensus::{ConsensusEngine, ConsensusOptions};
use crate::error::ClimateError;
use crate::orchestrator::FetchOrchestrator;
use crate::sources::registry::SourceRegistry;
use crate::sources::FetchRequest;
use crate::types::location::{LatLon, YearRange};
use crate::types::parameter::Parameter;
use crate::types::report::{
    AnalysisMetadata, AnalysisReport, DailyBreakdown, DateRangeInfo, MultiSourceReport,
    RangeReport, SummaryReport,
};
use crate::types::source::SourceId;
use crate::units::{convert_range_units, convert_report_units, UnitPreferences};
use crate::utils::{day_of_year, ensure_cache_dir_exists, get_cache_dir, parse_date};
use bon::bon;
use chrono::{Datelike, NaiveDate};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Longest date range accepted by [`ClimateOdds::analyze_range`], in days.
const MAX_RANGE_DAYS: i64 = 366;

/// Which provider a single-source analysis should try first.
///
/// If the preferred provider fails or returns nothing, the other one is tried before
/// giving up.
///
/// # Examples
///
/// ```
/// use climate_odds::DataSource;
///
/// let source: DataSource = "openmeteo".parse().unwrap();
/// assert_eq!(source, DataSource::OpenMeteo);
/// assert!("weather.com".parse::<DataSource>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    #[default]
    Nasa,
    OpenMeteo,
}

impl DataSource {
    fn fallback_order(&self) -> [SourceId; 2] {
        match self {
            DataSource::Nasa => [SourceId::NasaPower, SourceId::OpenMeteo],
            DataSource::OpenMeteo => [SourceId::OpenMeteo, SourceId::NasaPower],
        }
    }
}

impl FromStr for DataSource {
    type Err = ClimateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nasa" | "nasa_power" => Ok(DataSource::Nasa),
            "open_meteo" | "openmeteo" => Ok(DataSource::OpenMeteo),
            other => Err(ClimateError::InvalidArgument(format!(
                "Unknown data source '{}', expected 'nasa' or 'open_meteo'",
                other
            ))),
        }
    }
}

/// Pooled records plus where they came from.
struct FetchedTable {
    table: ClimateTable,
    data_source: String,
    sources: Vec<SourceId>,
    warnings: Vec<String>,
}

impl FetchedTable {
    fn metadata(&self, years: YearRange, data_points: usize, analysis_type: &str) -> AnalysisMetadata {
        AnalysisMetadata {
            data_source: self.data_source.clone(),
            sources: self.sources.clone(),
            years_analyzed: years.to_string(),
            data_points,
            analysis_type: analysis_type.to_string(),
            warnings: self.warnings.clone(),
        }
    }
}

/// The main client struct of the crate.
///
/// It owns the shared configuration, the source registry (HTTP clients and parquet
/// cache), the consensus engine and the statistical analyzer. Create an instance with
/// [`ClimateOdds::new()`] for the default cache directory, or
/// [`ClimateOdds::with_cache_folder()`] / [`ClimateOdds::with_config()`] to control
/// where provider responses are cached and which thresholds are used.
///
/// # Examples
///
/// ```rust,no_run
/// # use climate_odds::{ClimateOdds, ClimateError};
/// # async fn run() -> Result<(), ClimateError> {
/// let client = ClimateOdds::new().await?;
/// # Ok(())
/// # }
/// ```
pub struct ClimateOdds {
    config: Arc<ClimateConfig>,
    orchestrator: FetchOrchestrator,
    consensus: ConsensusEngine,
    analyzer: StatisticalAnalyzer,
}

#[bon]
impl ClimateOdds {
    /// Creates a client with default thresholds that caches provider responses in
    /// `cache_folder`.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::CacheDirCreation`] if the directory cannot be created and
    /// [`ClimateError::HttpClient`] if the HTTP client cannot be built.
    pub async fn with_cache_folder(cache_folder: PathBuf) -> Result<Self, ClimateError> {
        Self::with_config(ClimateConfig::default(), cache_folder).await
    }

    /// Creates a client using the default cache directory
    /// (e.g. `~/.cache/climate_odds_cache` on Linux).
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::CacheDirResolution`] if the system cache directory cannot
    /// be determined, otherwise the errors of [`ClimateOdds::with_cache_folder`].
    pub async fn new() -> Result<Self, ClimateError> {
        let cache_folder = get_cache_dir().map_err(ClimateError::CacheDirResolution)?;
        Self::with_cache_folder(cache_folder).await
    }

    /// Creates a client with a custom configuration, for example one loaded with
    /// [`ClimateConfig::from_json_file`].
    pub async fn with_config(
        config: ClimateConfig,
        cache_folder: PathBuf,
    ) -> Result<Self, ClimateError> {
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| ClimateError::CacheDirCreation(cache_folder.clone(), e))?;
        let registry = SourceRegistry::with_defaults(&config, &cache_folder)?;
        Ok(Self::with_registry(config, registry))
    }

    /// Creates a client over an explicit set of adapters.
    pub fn with_registry(config: ClimateConfig, registry: SourceRegistry) -> Self {
        let config = Arc::new(config);
        Self {
            orchestrator: FetchOrchestrator::new(
                registry,
                config.analysis.max_concurrent_fetches,
            ),
            consensus: ConsensusEngine::new(
                config.source_weights.clone(),
                ConsensusOptions::from(&config.analysis),
            ),
            analyzer: StatisticalAnalyzer::new(config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &ClimateConfig {
        &self.config
    }

    /// Probabilities of weather conditions on one calendar date, based on the same
    /// date in every year of `years`.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.location(LatLon)`: **Required.** The point to analyze.
    /// * `.date(&str)`: **Required.** Target date as `YYYY-MM-DD`. Only month and day matter.
    /// * `.years(YearRange)`: Optional. Historical years to pool. Defaults to `1990-2023`.
    /// * `.detailed(bool)`: Optional. `false` (default) keeps only the eight headline
    ///   probabilities, `true` returns every computed condition.
    /// * `.units(UnitPreferences)`: Optional. Units of the returned statistics.
    /// * `.data_source(DataSource)`: Optional. Preferred single provider. Defaults to NASA POWER.
    /// * `.use_multi_source(bool)`: Optional. Pool every provider into a reliability-weighted
    ///   consensus series instead of using a single one. Defaults to `false`.
    ///
    /// # Errors
    ///
    /// [`ClimateError::InvalidArgument`] for bad coordinates, dates or years,
    /// [`ClimateError::NoSourcesAvailable`] when no provider returned data and
    /// [`ClimateError::Timeout`] when the whole call exceeds the configured deadline.
    /// A date without historical records is not an error: the report carries an `error`.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use climate_odds::{ClimateOdds, ClimateError, LatLon, YearRange};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), ClimateError> {
    /// let client = ClimateOdds::new().await?;
    /// let report = client
    ///     .analyze()
    ///     .location(LatLon(55.7558, 37.6173))
    ///     .date("2024-06-15")
    ///     .years(YearRange::new(1994, 2023))
    ///     .call()
    ///     .await?;
    /// println!("very hot: {:.1}%", report.probabilities["very_hot"] * 100.0);
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn analyze(
        &self,
        location: LatLon,
        date: &str,
        years: Option<YearRange>,
        detailed: Option<bool>,
        units: Option<UnitPreferences>,
        data_source: Option<DataSource>,
        use_multi_source: Option<bool>,
    ) -> Result<AnalysisReport, ClimateError> {
        validate_location(location)?;
        let date_value = parse_date(date)?;
        let years = years.unwrap_or_default();
        let detailed = detailed.unwrap_or(false);
        let fetched = self
            .with_deadline(self.fetch_table(
                location,
                years,
                data_source.unwrap_or_default(),
                use_multi_source.unwrap_or(false),
            ))
            .await?;

        let doy = day_of_year(date_value);
        let full = self.analyzer.analyze_day(&fetched.table, doy);
        let data_points = full.data_points;
        let (probabilities, statistics, date_name, error) = if detailed {
            (full.probabilities, full.statistics, full.date_example, full.error)
        } else {
            let summary = SummaryReport::from(full);
            (summary.probabilities, summary.statistics, summary.date_example, summary.error)
        };

        let mut report = AnalysisReport {
            location,
            date: date_value.format("%Y-%m-%d").to_string(),
            day_of_year: doy,
            date_name,
            probabilities,
            statistics,
            metadata: fetched.metadata(
                years,
                data_points,
                if detailed { "detailed" } else { "summary" },
            ),
            error,
        };
        if let Some(units) = units {
            convert_report_units(&mut report, &units);
        }
        Ok(report)
    }

    /// Per-day probabilities for every date in `[start_date, end_date]` plus range-wide
    /// averages and recommended days, from a single fetch.
    ///
    /// Takes the same optional arguments as [`ClimateOdds::analyze`] (except `detailed`;
    /// every day is analyzed in full). Ranges may cross New Year and span at most 366 days.
    ///
    /// # Errors
    ///
    /// As [`ClimateOdds::analyze`], plus [`ClimateError::InvalidArgument`] when
    /// `start_date` is after `end_date` or the range is too long.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use climate_odds::{ClimateOdds, ClimateError, LatLon};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), ClimateError> {
    /// let client = ClimateOdds::new().await?;
    /// let range = client
    ///     .analyze_range()
    ///     .location(LatLon(55.7558, 37.6173))
    ///     .start_date("2026-01-12")
    ///     .end_date("2026-01-21")
    ///     .call()
    ///     .await?;
    /// println!("best day outdoors: {:?}", range.aggregated.best_days.outdoor_activity);
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn analyze_range(
        &self,
        location: LatLon,
        start_date: &str,
        end_date: &str,
        years: Option<YearRange>,
        units: Option<UnitPreferences>,
        data_source: Option<DataSource>,
        use_multi_source: Option<bool>,
    ) -> Result<RangeReport, ClimateError> {
        validate_location(location)?;
        let start = parse_date(start_date)?;
        let end = parse_date(end_date)?;
        if start > end {
            return Err(ClimateError::InvalidArgument(format!(
                "Start date {} is after end date {}",
                start, end
            )));
        }
        let duration_days = (end - start).num_days() + 1;
        if duration_days > MAX_RANGE_DAYS {
            return Err(ClimateError::InvalidArgument(format!(
                "Date range of {} days exceeds the maximum of {}",
                duration_days, MAX_RANGE_DAYS
            )));
        }
        let years = years.unwrap_or_default();
        let fetched = self
            .with_deadline(self.fetch_table(
                location,
                years,
                data_source.unwrap_or_default(),
                use_multi_source.unwrap_or(false),
            ))
            .await?;

        let reports = self.analyzer.analyze_date_range(&fetched.table, start, end);
        let daily_breakdown: Vec<DailyBreakdown> = start
            .iter_days()
            .zip(reports)
            .map(|(date, report)| DailyBreakdown {
                date: date.format("%Y-%m-%d").to_string(),
                day_of_year: report.day_of_year,
                day_name: report.date_example,
                probabilities: report.probabilities,
                statistics: report.statistics,
                data_points: report.data_points,
                error: report.error,
            })
            .collect();
        let analyzed_days = daily_breakdown.iter().filter(|d| d.error.is_none()).count();
        if analyzed_days < daily_breakdown.len() {
            warn!(
                "{} of {} days in the range had no historical data",
                daily_breakdown.len() - analyzed_days,
                daily_breakdown.len()
            );
        }
        let data_points = daily_breakdown.iter().map(|d| d.data_points).sum();

        let mut report = RangeReport {
            location,
            date_range: DateRangeInfo {
                start: start.format("%Y-%m-%d").to_string(),
                end: end.format("%Y-%m-%d").to_string(),
                duration_days: duration_days as usize,
            },
            aggregated: aggregate(&daily_breakdown),
            daily_breakdown,
            metadata: fetched.metadata(years, data_points, "date_range"),
        };
        if let Some(units) = units {
            convert_range_units(&mut report, &units);
        }
        Ok(report)
    }

    /// Headline probabilities for several independent dates, sharing one fetch.
    ///
    /// # Errors
    ///
    /// As [`ClimateOdds::analyze`]. Any malformed date fails the whole call; an empty
    /// list is rejected.
    #[builder]
    pub async fn analyze_dates(
        &self,
        location: LatLon,
        dates: &[&str],
        years: Option<YearRange>,
        data_source: Option<DataSource>,
        use_multi_source: Option<bool>,
    ) -> Result<Vec<AnalysisReport>, ClimateError> {
        validate_location(location)?;
        if dates.is_empty() {
            return Err(ClimateError::InvalidArgument(
                "At least one date is required".to_string(),
            ));
        }
        let parsed = dates
            .iter()
            .map(|d| parse_date(d))
            .collect::<Result<Vec<NaiveDate>, _>>()?;
        let years = years.unwrap_or_default();
        let fetched = self
            .with_deadline(self.fetch_table(
                location,
                years,
                data_source.unwrap_or_default(),
                use_multi_source.unwrap_or(false),
            ))
            .await?;

        Ok(parsed
            .into_iter()
            .map(|date| {
                let doy = day_of_year(date);
                let summary = self.analyzer.summary_probabilities(&fetched.table, doy);
                let data_points = fetched.table.for_day(doy).len();
                AnalysisReport {
                    location,
                    date: date.format("%Y-%m-%d").to_string(),
                    day_of_year: doy,
                    date_name: summary.date_example,
                    probabilities: summary.probabilities,
                    statistics: summary.statistics,
                    metadata: fetched.metadata(years, data_points, "summary"),
                    error: summary.error,
                }
            })
            .collect())
    }

    /// Cross-provider consensus of every parameter on one calendar day.
    ///
    /// Every provider covering the location is queried concurrently. For each parameter,
    /// each provider's mean over the matching days of `years` is combined into a
    /// reliability-weighted value with an agreement level and a confidence class.
    /// Providers that failed are listed in `failures`.
    ///
    /// # Errors
    ///
    /// [`ClimateError::InvalidArgument`] for bad input, [`ClimateError::NoSourcesAvailable`]
    /// when every provider failed or returned nothing.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use climate_odds::{ClimateOdds, ClimateError, LatLon, Parameter};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), ClimateError> {
    /// let client = ClimateOdds::new().await?;
    /// let report = client
    ///     .multi_source()
    ///     .location(LatLon(-23.55, -46.63))
    ///     .date("2024-01-15")
    ///     .call()
    ///     .await?;
    /// if let Some(t) = report.parameters.get(&Parameter::Temperature) {
    ///     println!("{:?} ({})", t.consensus_value, t.confidence);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn multi_source(
        &self,
        location: LatLon,
        date: &str,
        years: Option<YearRange>,
    ) -> Result<MultiSourceReport, ClimateError> {
        validate_location(location)?;
        let date_value = parse_date(date)?;
        let years = years.unwrap_or_default();
        let request = fetch_request(location, years, Parameter::ALL.to_vec())?;
        let data = self
            .with_deadline(self.orchestrator.fetch_all(&request))
            .await?;

        let (month, day) = (date_value.month(), date_value.day());
        let same_day: BTreeMap<SourceId, _> = data
            .series
            .iter()
            .map(|(id, set)| {
                (
                    *id,
                    set.filter_dates(|d| d.month() == month && d.day() == day),
                )
            })
            .collect();

        let parameters: BTreeMap<_, _> = Parameter::ALL
            .iter()
            .map(|p| (*p, self.consensus.consensus(&same_day, *p)))
            .filter(|(_, result)| result.source_count() > 0)
            .collect();
        info!(
            "Consensus for {}-{:02} at ({}, {}): {} parameters from {} sources",
            month,
            day,
            location.0,
            location.1,
            parameters.len(),
            data.series.len()
        );

        Ok(MultiSourceReport {
            location,
            month,
            day,
            years_analyzed: years.to_string(),
            data_sources: data.sources(),
            parameters,
            failures: data.failures,
        })
    }
}

impl ClimateOdds {
    async fn with_deadline<T>(
        &self,
        future: impl Future<Output = Result<T, ClimateError>>,
    ) -> Result<T, ClimateError> {
        let limit = self.config.analysis.request_timeout();
        tokio::time::timeout(limit, future)
            .await
            .map_err(|_| ClimateError::Timeout(limit))?
    }

    async fn fetch_table(
        &self,
        location: LatLon,
        years: YearRange,
        preference: DataSource,
        use_multi_source: bool,
    ) -> Result<FetchedTable, ClimateError> {
        let request = fetch_request(location, years, Parameter::ALL.to_vec())?;
        if years.len() < self.config.analysis.min_years_data {
            warn!(
                "Only {} years requested, at least {} are recommended",
                years.len(),
                self.config.analysis.min_years_data
            );
        }

        if use_multi_source {
            let data = self.orchestrator.fetch_all(&request).await?;
            let table = ClimateTable::from_sources(&data.series, &self.config.source_weights);
            return Ok(FetchedTable {
                table,
                data_source: "multi_source".to_string(),
                sources: data.sources(),
                warnings: data.warnings(),
            });
        }

        let order = preference.fallback_order();
        let mut warnings = Vec::new();
        for source in order {
            let Some(adapter) = self.orchestrator.registry().get(source) else {
                continue;
            };
            match adapter.fetch(&request).await {
                Ok(set) if !set.is_empty() => {
                    info!("Using {} for ({}, {})", source.display_name(), location.0, location.1);
                    return Ok(FetchedTable {
                        table: ClimateTable::from_series_set(&set),
                        data_source: source.display_name().to_string(),
                        sources: vec![source],
                        warnings,
                    });
                }
                Ok(_) => {
                    warn!("{} returned no data, trying next source", source);
                    warnings.push(format!("{}: no data", source));
                }
                Err(e) => {
                    warn!("{} failed, trying next source: {}", source, e);
                    warnings.push(format!("{} ({}): {}", source, e.kind(), e));
                }
            }
        }
        Err(ClimateError::NoSourcesAvailable {
            attempted: order.to_vec(),
        })
    }
}

fn validate_location(location: LatLon) -> Result<(), ClimateError> {
    if location.is_valid() {
        Ok(())
    } else {
        Err(ClimateError::InvalidArgument(format!(
            "Invalid coordinates ({}, {}): latitude must be within [-90, 90] and longitude within [-180, 180]",
            location.0, location.1
        )))
    }
}

fn fetch_request(
    location: LatLon,
    years: YearRange,
    parameters: Vec<Parameter>,
) -> Result<FetchRequest, ClimateError> {
    let invalid = || ClimateError::InvalidArgument(format!("Invalid year range {}", years));
    if years.is_empty() {
        return Err(invalid());
    }
    let start = NaiveDate::from_ymd_opt(years.start, 1, 1).ok_or_else(invalid)?;
    let end = NaiveDate::from_ymd_opt(years.end, 12, 31).ok_or_else(invalid)?;
    Ok(FetchRequest::new(
        location.0, location.1, start, end, parameters,
    ))
}
