//! NASA POWER daily point API (<https://power.larc.nasa.gov/docs/>).

use crate::sources::error::SourceError;
use crate::sources::frame::NativeTable;
use crate::sources::http::get_json;
use crate::sources::{FetchRequest, FrameSource};
use crate::types::parameter::Parameter;
use crate::types::source::{Coverage, ParameterAlias, SourceDescriptor, SourceId};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::future::join_all;
use haversine::{distance, Location as HaversineLocation, Units};
use log::{info, warn};
use polars::prelude::DataFrame;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

const BASE_URL: &str = "https://power.larc.nasa.gov/api/temporal/daily/point";
/// Marker POWER uses for missing values.
const FILL_VALUE: f64 = -999.0;
/// Resolution of the POWER meteorology grid, in degrees.
const GRID_SIZE: f64 = 0.5;

static ALIASES: [ParameterAlias; 13] = [
    ParameterAlias::new(Parameter::Temperature, &["T2M"]),
    ParameterAlias::new(Parameter::TemperatureMax, &["T2M_MAX"]),
    ParameterAlias::new(Parameter::TemperatureMin, &["T2M_MIN"]),
    ParameterAlias::new(Parameter::DewPoint, &["T2MDEW"]),
    ParameterAlias::new(Parameter::Precipitation, &["PRECTOTCORR", "PRECTOT"]),
    ParameterAlias::new(Parameter::WindSpeed, &["WS2M"]),
    ParameterAlias::new(Parameter::WindSpeed10m, &["WS10M"]),
    ParameterAlias::new(Parameter::Humidity, &["RH2M"]),
    ParameterAlias::new(Parameter::Pressure, &["PS"]),
    ParameterAlias::new(Parameter::CloudCover, &["CLOUD_AMT"]),
    ParameterAlias::new(Parameter::SolarRadiation, &["ALLSKY_SFC_SW_DWN"]),
    ParameterAlias::new(Parameter::UvIndex, &["ALLSKY_SFC_UV_INDEX"]),
    ParameterAlias::new(Parameter::SnowDepth, &["SNODP"]),
];

pub fn descriptor(weight: f64) -> SourceDescriptor {
    SourceDescriptor::new(SourceId::NasaPower, weight, Coverage::Global, &ALIASES)
}

#[derive(Debug, Deserialize)]
struct PowerResponse {
    properties: PowerProperties,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    /// Variable name to `YYYYMMDD` to value.
    parameter: BTreeMap<String, BTreeMap<String, Option<f64>>>,
}

pub struct NasaPowerSource {
    client: Client,
    descriptor: SourceDescriptor,
    grid_interpolation: bool,
}

impl NasaPowerSource {
    pub fn new(client: Client, weight: f64) -> Self {
        Self {
            client,
            descriptor: descriptor(weight),
            grid_interpolation: false,
        }
    }

    /// Blend the four surrounding grid cells instead of querying the point itself.
    pub fn with_grid_interpolation(mut self, enabled: bool) -> Self {
        self.grid_interpolation = enabled;
        self
    }

    fn url(request: &FetchRequest, native_columns: &[&'static str]) -> String {
        format!(
            "{}?parameters={}&community=RE&longitude={}&latitude={}&start={}&end={}&format=JSON",
            BASE_URL,
            native_columns.join(","),
            request.longitude,
            request.latitude,
            request.start.format("%Y%m%d"),
            request.end.format("%Y%m%d"),
        )
    }

    async fn fetch_point(
        &self,
        request: &FetchRequest,
        native_columns: &[&'static str],
    ) -> Result<NativeTable, SourceError> {
        let url = Self::url(request, native_columns);
        let response: PowerResponse = get_json(&self.client, &url).await?;
        parse_power(response.properties, native_columns)
    }

    async fn fetch_interpolated(
        &self,
        request: &FetchRequest,
        native_columns: &[&'static str],
    ) -> Result<NativeTable, SourceError> {
        let corners = grid_corners(request.latitude, request.longitude);
        let results = join_all(corners.iter().map(|(lat, lon)| {
            let corner = request.at(*lat, *lon);
            async move { self.fetch_point(&corner, native_columns).await }
        }))
        .await;

        let mut tables = Vec::new();
        let mut last_error = None;
        for ((lat, lon), result) in corners.iter().zip(results) {
            match result {
                Ok(table) => {
                    let weight = idw_weight(request.latitude, request.longitude, *lat, *lon);
                    tables.push((weight, table));
                }
                Err(e) => {
                    warn!("Grid corner ({}, {}) failed: {}", lat, lon, e);
                    last_error = Some(e);
                }
            }
        }
        if tables.is_empty() {
            return Err(last_error.unwrap_or_else(|| SourceError::UnexpectedFormat {
                source_id: SourceId::NasaPower,
                message: "no grid corners available".to_string(),
            }));
        }
        info!(
            "Interpolating ({}, {}) from {} grid corners",
            request.latitude,
            request.longitude,
            tables.len()
        );
        blend(&tables, native_columns)
    }
}

#[async_trait]
impl FrameSource for NasaPowerSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn native_frame(
        &self,
        request: &FetchRequest,
        native_columns: &[&'static str],
    ) -> Result<DataFrame, SourceError> {
        let table = if self.grid_interpolation {
            self.fetch_interpolated(request, native_columns).await?
        } else {
            self.fetch_point(request, native_columns).await?
        };
        table.into_frame()
    }
}

fn parse_power(
    properties: PowerProperties,
    native_columns: &[&'static str],
) -> Result<NativeTable, SourceError> {
    let mut dates = BTreeSet::new();
    for values in properties.parameter.values() {
        for key in values.keys() {
            let date = NaiveDate::parse_from_str(key, "%Y%m%d").map_err(|_| {
                SourceError::UnexpectedFormat {
                    source_id: SourceId::NasaPower,
                    message: format!("invalid date key '{}'", key),
                }
            })?;
            dates.insert(date);
        }
    }
    let dates: Vec<NaiveDate> = dates.into_iter().collect();
    let mut table = NativeTable::new(SourceId::NasaPower, dates.clone());
    for column in native_columns {
        let Some(values) = properties.parameter.get(*column) else {
            continue;
        };
        let column_values = dates
            .iter()
            .map(|d| {
                values
                    .get(&d.format("%Y%m%d").to_string())
                    .copied()
                    .flatten()
                    .filter(|v| *v != FILL_VALUE)
            })
            .collect();
        table.push_column(*column, column_values)?;
    }
    Ok(table)
}

/// The four 0.5° grid points around a location: SW, SE, NW, NE.
pub fn grid_corners(latitude: f64, longitude: f64) -> [(f64, f64); 4] {
    let lat_low = (latitude / GRID_SIZE).floor() * GRID_SIZE;
    let lon_low = (longitude / GRID_SIZE).floor() * GRID_SIZE;
    let lat_high = (lat_low + GRID_SIZE).min(90.0);
    let lon_high = (lon_low + GRID_SIZE).min(180.0);
    [
        (lat_low, lon_low),
        (lat_low, lon_high),
        (lat_high, lon_low),
        (lat_high, lon_high),
    ]
}

fn idw_weight(latitude: f64, longitude: f64, corner_lat: f64, corner_lon: f64) -> f64 {
    let km = distance(
        HaversineLocation {
            latitude,
            longitude,
        },
        HaversineLocation {
            latitude: corner_lat,
            longitude: corner_lon,
        },
        Units::Kilometers,
    );
    1.0 / (km + 0.001)
}

/// Inverse-distance weighted mean per date and column over the corners that have a
/// value there.
fn blend(
    tables: &[(f64, NativeTable)],
    native_columns: &[&'static str],
) -> Result<NativeTable, SourceError> {
    let mut dates = BTreeSet::new();
    for (_, table) in tables {
        dates.extend(table.dates().iter().copied());
    }
    let dates: Vec<NaiveDate> = dates.into_iter().collect();
    let mut out = NativeTable::new(SourceId::NasaPower, dates.clone());

    for column in native_columns {
        let lookups: Vec<(f64, BTreeMap<NaiveDate, f64>)> = tables
            .iter()
            .filter_map(|(w, t)| {
                let values = t.column(column)?;
                let by_date = t
                    .dates()
                    .iter()
                    .zip(values)
                    .filter_map(|(d, v)| Some((*d, (*v)?)))
                    .collect();
                Some((*w, by_date))
            })
            .collect();
        if lookups.is_empty() {
            continue;
        }
        let values = dates
            .iter()
            .map(|d| {
                let (sum, weight) = lookups
                    .iter()
                    .filter_map(|(w, by_date)| by_date.get(d).map(|v| (w * v, *w)))
                    .fold((0.0, 0.0), |(s, ws), (v, w)| (s + v, ws + w));
                (weight > 0.0).then(|| sum / weight)
            })
            .collect();
        out.push_column(*column, values)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::frame::extract_series;

    const SAMPLE: &str = r#"{
        "type": "Feature",
        "properties": {
            "parameter": {
                "T2M": {"20200101": 1.5, "20200102": -999.0, "20200103": 2.5},
                "RH2M": {"20200101": 80.0, "20200102": 82.0, "20200103": 79.0}
            }
        }
    }"#;

    #[test]
    fn fill_values_become_missing() {
        let response: PowerResponse = serde_json::from_str(SAMPLE).unwrap();
        let table = parse_power(response.properties, &["RH2M", "T2M", "WS2M"]).unwrap();
        assert_eq!(table.len(), 3);
        let df = table.into_frame().unwrap();
        let set = extract_series(
            &df,
            &descriptor(0.95),
            &[Parameter::Temperature, Parameter::Humidity, Parameter::WindSpeed],
        )
        .unwrap();
        let t = set.get(Parameter::Temperature).unwrap();
        assert_eq!(t.points[1].value, None);
        assert_eq!(t.mean(), Some(2.0));
        assert!(set.get(Parameter::WindSpeed).is_none());
    }

    #[test]
    fn missing_properties_is_a_parse_error() {
        assert!(serde_json::from_str::<PowerResponse>(r#"{"messages": []}"#).is_err());
    }

    #[test]
    fn corners_surround_the_point() {
        let corners = grid_corners(52.37, 4.89);
        assert_eq!(corners[0], (52.0, 4.5));
        assert_eq!(corners[3], (52.5, 5.0));
        for (lat, lon) in corners {
            assert!((lat - 52.37).abs() <= 0.5 && (lon - 4.89).abs() <= 0.5);
        }
    }

    #[test]
    fn blend_weights_nearer_corner_more() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let mut near = NativeTable::new(SourceId::NasaPower, vec![date]);
        near.push_column("T2M", vec![Some(10.0)]).unwrap();
        let mut far = NativeTable::new(SourceId::NasaPower, vec![date]);
        far.push_column("T2M", vec![Some(20.0)]).unwrap();
        let mut gap = NativeTable::new(SourceId::NasaPower, vec![date]);
        gap.push_column("T2M", vec![None]).unwrap();

        let blended = blend(&[(3.0, near), (1.0, far), (5.0, gap)], &["T2M"]).unwrap();
        assert_eq!(blended.column("T2M").unwrap(), &[Some(12.5)]);
    }

    #[tokio::test]
    #[ignore = "hits the live NASA POWER API"]
    async fn live_point_request() {
        let source = NasaPowerSource::new(Client::new(), 0.95);
        let request = FetchRequest::new(
            52.37,
            4.89,
            NaiveDate::from_ymd_opt(2020, 7, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 7, 10).unwrap(),
            vec![Parameter::Temperature],
        );
        let df = source.native_frame(&request, &["T2M"]).await.unwrap();
        assert_eq!(df.height(), 10);
    }
}
