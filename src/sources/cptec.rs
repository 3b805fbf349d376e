//! CPTEC/INPE convective indices for South America.
//!
//! The model output on CPTEC's FTP is region-specific GRIB; this source serves a
//! seasonal CAPE climatology within the same coverage area.

use crate::sources::error::SourceError;
use crate::sources::seasonal::{synthesize, SeasonalModel, Spikes};
use crate::sources::{FetchRequest, FrameSource};
use crate::types::parameter::Parameter;
use crate::types::source::{Coverage, ParameterAlias, SourceDescriptor, SourceId};
use async_trait::async_trait;
use polars::prelude::DataFrame;

pub const CAPE: &str = "cape";

static ALIASES: [ParameterAlias; 1] = [ParameterAlias::new(Parameter::ThunderstormRisk, &[CAPE])];

const THUNDERSTORM_DAYS: Spikes = Spikes {
    probability: 0.3,
    min: 500.0,
    max: 2000.0,
};

pub fn descriptor(weight: f64) -> SourceDescriptor {
    SourceDescriptor::new(SourceId::Cptec, weight, Coverage::SOUTH_AMERICA, &ALIASES)
}

fn model(column: &str, latitude: f64) -> Option<SeasonalModel> {
    match column {
        CAPE if latitude.abs() < 23.5 => Some(
            SeasonalModel::new(1500.0, 800.0, 200.0)
                .spikes(THUNDERSTORM_DAYS)
                .at_least(0.0),
        ),
        CAPE => Some(
            SeasonalModel::new(800.0, 1200.0, 200.0)
                .phase(80.0)
                .seasonal_floor(-500.0)
                .spikes(THUNDERSTORM_DAYS)
                .at_least(0.0),
        ),
        _ => None,
    }
}

pub struct CptecSource {
    descriptor: SourceDescriptor,
}

impl CptecSource {
    pub fn new(weight: f64) -> Self {
        Self {
            descriptor: descriptor(weight),
        }
    }
}

#[async_trait]
impl FrameSource for CptecSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn native_frame(
        &self,
        request: &FetchRequest,
        native_columns: &[&'static str],
    ) -> Result<DataFrame, SourceError> {
        let models: Vec<(&'static str, SeasonalModel)> = native_columns
            .iter()
            .filter_map(|c| Some((*c, model(c, request.latitude)?)))
            .collect();
        synthesize(SourceId::Cptec, request, &models)
    }
}
