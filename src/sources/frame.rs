//! Provider tables as polars frames: a `date` column (`YYYY-MM-DD`) plus one `f64`
//! column per provider variable, named the way the provider names it.

use crate::sources::error::SourceError;
use crate::types::parameter::Parameter;
use crate::types::series::{DataPoint, ParameterSeries, SeriesSet};
use crate::types::source::{SourceDescriptor, SourceId};
use chrono::NaiveDate;
use polars::prelude::*;

pub const COL_DATE: &str = "date";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Column-oriented provider payload, checked for consistent lengths before it becomes
/// a [`DataFrame`].
#[derive(Debug, Clone)]
pub struct NativeTable {
    source: SourceId,
    dates: Vec<NaiveDate>,
    columns: Vec<(String, Vec<Option<f64>>)>,
}

impl NativeTable {
    pub fn new(source: SourceId, dates: Vec<NaiveDate>) -> Self {
        Self {
            source,
            dates,
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), SourceError> {
        let name = name.into();
        if values.len() != self.dates.len() {
            return Err(SourceError::UnexpectedFormat {
                source_id: self.source,
                message: format!(
                    "column '{}' has {} values for {} dates",
                    name,
                    values.len(),
                    self.dates.len()
                ),
            });
        }
        self.columns.retain(|(existing, _)| *existing != name);
        self.columns.push((name, values));
        Ok(())
    }

    pub fn into_frame(self) -> Result<DataFrame, SourceError> {
        let dates: Vec<String> = self
            .dates
            .iter()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .collect();
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(Column::new(COL_DATE.into(), dates));
        for (name, values) in self.columns {
            columns.push(Column::new(name.as_str().into(), values));
        }
        Ok(DataFrame::new(columns)?)
    }
}

fn get_column<'a>(df: &'a DataFrame, source: SourceId, col: &str) -> Result<&'a Column, SourceError> {
    df.column(col).map_err(|_| SourceError::UnexpectedFormat {
        source_id: source,
        message: format!("missing column '{}'", col),
    })
}

fn parse_dates(df: &DataFrame, source: SourceId) -> Result<Vec<NaiveDate>, SourceError> {
    get_column(df, source, COL_DATE)?
        .str()?
        .into_iter()
        .map(|value| {
            value
                .and_then(|v| NaiveDate::parse_from_str(v, DATE_FORMAT).ok())
                .ok_or_else(|| SourceError::UnexpectedFormat {
                    source_id: source,
                    message: format!("invalid date {:?}", value),
                })
        })
        .collect()
}

/// Translates a native frame into canonical series through the descriptor's aliases.
///
/// For each parameter the first alias name present in the frame is used and scaled into
/// the canonical unit. Parameters the source has no alias for, or whose columns are all
/// absent, are left out without error. Non-finite values become missing.
pub fn extract_series(
    df: &DataFrame,
    descriptor: &SourceDescriptor,
    parameters: &[Parameter],
) -> Result<SeriesSet, SourceError> {
    let mut set = SeriesSet::new(descriptor.id);
    if df.height() == 0 {
        return Ok(set);
    }
    let dates = parse_dates(df, descriptor.id)?;

    for parameter in parameters {
        let Some(alias) = descriptor.alias(*parameter) else {
            continue;
        };
        let Some(column) = alias.native_names.iter().find_map(|n| df.column(n).ok()) else {
            continue;
        };
        let values = column.cast(&DataType::Float64)?;
        let points = dates
            .iter()
            .zip(values.f64()?.into_iter())
            .map(|(date, value)| {
                let value = value.filter(|v| v.is_finite()).map(|v| v * alias.scale);
                DataPoint::new(*date, value)
            })
            .collect();
        set.insert(ParameterSeries::new(*parameter, descriptor.id, points));
    }
    Ok(set)
}
