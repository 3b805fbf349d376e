//! Concurrent fan-out of one request to every relevant source.

use crate::error::ClimateError;
use crate::sources::registry::SourceRegistry;
use crate::sources::{FetchRequest, SourceAdapter};
use crate::types::report::SourceFailure;
use crate::types::series::SeriesSet;
use crate::types::source::SourceId;
use futures_util::stream::{self, StreamExt};
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Everything the sources delivered for one request.
#[derive(Debug, Clone, Default)]
pub struct MultiSourceData {
    /// Only sources that returned at least one present value.
    pub series: BTreeMap<SourceId, SeriesSet>,
    pub failures: Vec<SourceFailure>,
}

impl MultiSourceData {
    pub fn sources(&self) -> Vec<SourceId> {
        self.series.keys().copied().collect()
    }

    /// One line per failed source, for report metadata.
    pub fn warnings(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|f| format!("{} ({}): {}", f.source, f.kind, f.message))
            .collect()
    }
}

pub struct FetchOrchestrator {
    registry: SourceRegistry,
    max_concurrent: usize,
}

impl FetchOrchestrator {
    pub fn new(registry: SourceRegistry, max_concurrent: usize) -> Self {
        Self {
            registry,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Fetches from every registered source relevant to the request's parameters.
    pub async fn fetch_all(&self, request: &FetchRequest) -> Result<MultiSourceData, ClimateError> {
        let sources = self.registry.sources_for(request.parameters());
        self.fetch_from(&sources, request).await
    }

    /// Fetches from the given sources, at most `max_concurrent` at a time.
    ///
    /// A failing source is logged and recorded but never aborts its siblings. Fails with
    /// [`ClimateError::NoSourcesAvailable`] only when no source produced data.
    pub async fn fetch_from(
        &self,
        sources: &[SourceId],
        request: &FetchRequest,
    ) -> Result<MultiSourceData, ClimateError> {
        let adapters: Vec<Arc<dyn SourceAdapter>> =
            sources.iter().filter_map(|s| self.registry.get(*s)).collect();
        let limit = adapters.len().min(self.max_concurrent).max(1);
        info!(
            "Fetching {} parameters from {} sources ({} at a time)",
            request.parameters().len(),
            adapters.len(),
            limit
        );

        let results: Vec<_> = stream::iter(adapters.into_iter().map(|adapter| async move {
            let id = adapter.descriptor().id;
            (id, adapter.fetch(request).await)
        }))
        .buffer_unordered(limit)
        .collect()
        .await;

        let mut data = MultiSourceData::default();
        for (source, result) in results {
            match result {
                Ok(set) if set.is_empty() => {
                    info!("{} returned no data", source);
                }
                Ok(set) => {
                    data.series.insert(source, set);
                }
                Err(e) => {
                    warn!("{} failed: {}", source, e);
                    data.failures.push(SourceFailure {
                        source,
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
        data.failures.sort_by_key(|f| f.source);

        if data.series.is_empty() {
            return Err(ClimateError::NoSourcesAvailable {
                attempted: sources.to_vec(),
            });
        }
        Ok(data)
    }
}
