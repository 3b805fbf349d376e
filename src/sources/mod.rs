//! Provider adapters. Each one turns a [`FetchRequest`] into canonical series for one
//! [`SourceId`], hiding the provider's schema, units and transport.

pub mod cache;
pub mod cptec;
pub mod error;
pub mod frame;
pub mod ges_disc;
mod http;
pub mod nasa_power;
pub mod open_meteo;
pub mod registry;
pub mod seasonal;

use crate::sources::cache::FrameCache;
use crate::sources::error::SourceError;
use crate::sources::frame::extract_series;
use crate::types::parameter::Parameter;
use crate::types::series::SeriesSet;
use crate::types::source::SourceDescriptor;
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use polars::prelude::DataFrame;

/// What to fetch: one point, an inclusive date window and canonical parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    parameters: Vec<Parameter>,
}

impl FetchRequest {
    pub fn new(
        latitude: f64,
        longitude: f64,
        start: NaiveDate,
        end: NaiveDate,
        mut parameters: Vec<Parameter>,
    ) -> Self {
        parameters.sort();
        parameters.dedup();
        Self {
            latitude,
            longitude,
            start,
            end,
            parameters,
        }
    }

    /// Requested parameters, sorted and without duplicates.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Same window and parameters at another point.
    pub fn at(&self, latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            ..self.clone()
        }
    }

    pub fn with_parameters(&self, parameters: Vec<Parameter>) -> Self {
        Self::new(self.latitude, self.longitude, self.start, self.end, parameters)
    }
}

/// A data provider as seen by the orchestrator.
///
/// An out-of-coverage request is not an error: it yields an empty [`SeriesSet`].
/// Canonical parameters the source does not know are silently omitted.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn descriptor(&self) -> &SourceDescriptor;

    async fn fetch(&self, request: &FetchRequest) -> Result<SeriesSet, SourceError>;
}

/// The provider-specific half of an adapter: produce the native table for a set of
/// provider column names.
#[async_trait]
pub trait FrameSource: Send + Sync {
    fn descriptor(&self) -> &SourceDescriptor;

    async fn native_frame(
        &self,
        request: &FetchRequest,
        native_columns: &[&'static str],
    ) -> Result<DataFrame, SourceError>;
}

/// Wraps a [`FrameSource`] with coverage checks, alias resolution and the parquet
/// cache.
pub struct CachedAdapter<S> {
    inner: S,
    cache: Option<FrameCache>,
}

impl<S: FrameSource> CachedAdapter<S> {
    pub fn new(inner: S, cache: Option<FrameCache>) -> Self {
        Self { inner, cache }
    }

    /// Always asks the source; nothing is read from or written to disk.
    pub fn uncached(inner: S) -> Self {
        Self { inner, cache: None }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: FrameSource> SourceAdapter for CachedAdapter<S> {
    fn descriptor(&self) -> &SourceDescriptor {
        self.inner.descriptor()
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<SeriesSet, SourceError> {
        let descriptor = self.inner.descriptor();
        if !descriptor.covers(request.latitude, request.longitude) {
            info!(
                "{} does not cover ({}, {}), skipping",
                descriptor.display_name, request.latitude, request.longitude
            );
            return Ok(SeriesSet::new(descriptor.id));
        }

        let served: Vec<Parameter> = request
            .parameters()
            .iter()
            .copied()
            .filter(|p| descriptor.serves(*p))
            .collect();
        if served.is_empty() {
            debug!("{} serves none of {:?}", descriptor.display_name, request.parameters());
            return Ok(SeriesSet::new(descriptor.id));
        }
        let served_request = request.with_parameters(served);

        let mut native_columns: Vec<&'static str> = served_request
            .parameters()
            .iter()
            .filter_map(|p| descriptor.alias(*p)?.request_name())
            .collect();
        native_columns.sort_unstable();
        native_columns.dedup();

        let key = FrameCache::key(descriptor.id, &served_request);
        let cached = match &self.cache {
            Some(cache) => cache.load(&key).await,
            None => None,
        };
        let df = match cached {
            Some(df) => df,
            None => {
                let df = self.inner.native_frame(&served_request, &native_columns).await?;
                if let Some(cache) = &self.cache {
                    cache.store(&key, df.clone()).await;
                }
                df
            }
        };

        let set = extract_series(&df, descriptor, served_request.parameters())?;
        info!(
            "{} returned {} parameters over {} rows",
            descriptor.display_name,
            set.len(),
            df.height()
        );
        Ok(set)
    }
}
