use crate::config::ClimateConfig;
use crate::error::ClimateError;
use crate::sources::cache::FrameCache;
use crate::sources::cptec::CptecSource;
use crate::sources::ges_disc::GesDiscSource;
use crate::sources::nasa_power::NasaPowerSource;
use crate::sources::open_meteo::{OpenMeteoSource, OpenMeteoVariant};
use crate::sources::{CachedAdapter, SourceAdapter};
use crate::types::parameter::Parameter;
use crate::types::source::SourceId;
use reqwest::Client;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

/// Which sources can deliver each canonical parameter.
///
/// Parameters listed with more than one source are reconciled by consensus; the rest
/// come from their single source as-is.
pub fn sources_for_parameter(parameter: Parameter) -> &'static [SourceId] {
    use Parameter::*;
    use SourceId::*;
    match parameter {
        Temperature | Precipitation | WindSpeed | Humidity => {
            &[NasaPower, OpenMeteo, OpenMeteoEnhanced]
        }
        TemperatureMax | TemperatureMin | Pressure => &[NasaPower, OpenMeteo],
        DewPoint | CloudCover | UvIndex | SolarRadiation | SnowDepth | WindSpeed10m => {
            &[NasaPower]
        }
        ApparentTemperature | WeatherCode | WindGusts => &[OpenMeteoEnhanced],
        AirQuality | BlackCarbon | Dust => &[GesDisc],
        ThunderstormRisk => &[Cptec],
    }
}

/// The adapters available to an orchestrator, keyed by source.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    adapters: BTreeMap<SourceId, Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every known provider, sharing one HTTP client and, when enabled, one parquet
    /// cache under `cache_dir`.
    pub fn with_defaults(config: &ClimateConfig, cache_dir: &Path) -> Result<Self, ClimateError> {
        let client = Client::builder()
            .timeout(config.analysis.http_timeout())
            .gzip(true)
            .build()
            .map_err(ClimateError::HttpClient)?;
        let cache = config
            .analysis
            .cache_enabled
            .then(|| FrameCache::new(cache_dir, config.analysis.cache_ttl()));
        let weights = &config.source_weights;

        let mut registry = Self::empty();
        registry.register(Arc::new(CachedAdapter::new(
            NasaPowerSource::new(client.clone(), weights.nasa_power)
                .with_grid_interpolation(config.analysis.nasa_grid_interpolation),
            cache.clone(),
        )));
        registry.register(Arc::new(CachedAdapter::new(
            OpenMeteoSource::new(client.clone(), OpenMeteoVariant::Basic, weights.open_meteo),
            cache.clone(),
        )));
        registry.register(Arc::new(CachedAdapter::new(
            OpenMeteoSource::new(
                client,
                OpenMeteoVariant::Enhanced,
                weights.open_meteo_enhanced,
            ),
            cache,
        )));
        // Seasonal climatologies are synthesized locally and never cached.
        registry.register(Arc::new(CachedAdapter::uncached(GesDiscSource::new(
            weights.ges_disc,
        ))));
        registry.register(Arc::new(CachedAdapter::uncached(CptecSource::new(
            weights.cptec,
        ))));
        Ok(registry)
    }

    /// Adds or replaces the adapter for its source.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.insert(adapter.descriptor().id, adapter);
    }

    pub fn get(&self, source: SourceId) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(&source).cloned()
    }

    pub fn ids(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.adapters.keys().copied()
    }

    /// Registered sources relevant to any of `parameters`, in source order.
    pub fn sources_for(&self, parameters: &[Parameter]) -> Vec<SourceId> {
        let wanted: BTreeSet<SourceId> = parameters
            .iter()
            .flat_map(|p| sources_for_parameter(*p).iter().copied())
            .collect();
        wanted
            .into_iter()
            .filter(|s| self.adapters.contains_key(s))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::FetchRequest;
    use chrono::NaiveDate;

    #[test]
    fn every_parameter_has_a_source() {
        for parameter in Parameter::ALL {
            assert!(!sources_for_parameter(parameter).is_empty(), "{parameter}");
        }
    }

    #[test]
    fn table_matches_adapter_aliases() {
        let registry =
            SourceRegistry::with_defaults(&ClimateConfig::default(), Path::new("/nonexistent"))
                .unwrap();
        for parameter in Parameter::ALL {
            for source in sources_for_parameter(parameter) {
                let adapter = registry.get(*source).unwrap();
                assert!(
                    adapter.descriptor().serves(parameter),
                    "{} should serve {}",
                    source,
                    parameter
                );
            }
        }
    }

    #[tokio::test]
    async fn seasonal_sources_bypass_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SourceRegistry::with_defaults(&ClimateConfig::default(), dir.path()).unwrap();
        let request = FetchRequest::new(
            -15.79,
            -47.88,
            NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2010, 3, 31).unwrap(),
            vec![Parameter::Dust, Parameter::ThunderstormRisk],
        );
        for source in [SourceId::GesDisc, SourceId::Cptec] {
            let set = registry.get(source).unwrap().fetch(&request).await.unwrap();
            assert!(!set.is_empty(), "{source}");
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn relevant_sources_are_deduplicated() {
        let registry =
            SourceRegistry::with_defaults(&ClimateConfig::default(), Path::new("/nonexistent"))
                .unwrap();
        assert_eq!(
            registry.sources_for(&[Parameter::Temperature, Parameter::Dust, Parameter::Humidity]),
            vec![
                SourceId::NasaPower,
                SourceId::OpenMeteo,
                SourceId::OpenMeteoEnhanced,
                SourceId::GesDisc
            ]
        );
        assert!(SourceRegistry::empty()
            .sources_for(&[Parameter::Temperature])
            .is_empty());
    }
}
