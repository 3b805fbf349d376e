//! NASA GES DISC (MERRA-2 aerosol collection M2T1NXAER).
//!
//! The OPeNDAP endpoint needs an Earthdata login, so this source serves a regional
//! seasonal climatology of the same variables instead.

use crate::sources::error::SourceError;
use crate::sources::seasonal::{synthesize, SeasonalModel};
use crate::sources::{FetchRequest, FrameSource};
use crate::types::parameter::Parameter;
use crate::types::source::{Coverage, ParameterAlias, SourceDescriptor, SourceId};
use async_trait::async_trait;
use log::debug;
use polars::prelude::DataFrame;

pub const AOD: &str = "AODANA";
pub const BLACK_CARBON: &str = "BCSMASS";
pub const DUST: &str = "DUSMASS";

static ALIASES: [ParameterAlias; 3] = [
    ParameterAlias::new(Parameter::AirQuality, &[AOD, "aod"]),
    ParameterAlias::new(Parameter::BlackCarbon, &[BLACK_CARBON, "black_carbon"]),
    ParameterAlias::new(Parameter::Dust, &[DUST, "dust"]),
];

pub fn descriptor(weight: f64) -> SourceDescriptor {
    SourceDescriptor::new(SourceId::GesDisc, weight, Coverage::Global, &ALIASES)
}

/// Broad regional classes driving the baseline levels.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Region {
    populated: bool,
    arid: bool,
}

impl Region {
    fn classify(latitude: f64, longitude: f64) -> Self {
        Self {
            populated: latitude.abs() < 60.0,
            arid: latitude.abs() < 35.0 && longitude.abs() > 30.0,
        }
    }
}

fn model(column: &str, region: Region) -> Option<SeasonalModel> {
    match column {
        AOD => {
            let base = match region {
                Region { arid: true, .. } => 0.35,
                Region { populated: true, .. } => 0.2,
                _ => 0.1,
            };
            Some(SeasonalModel::new(base, 0.1, 0.05).at_least(0.05))
        }
        BLACK_CARBON => {
            let base = if region.populated { 2.5 } else { 0.5 };
            Some(SeasonalModel::new(base, 0.5, 0.3).at_least(0.1))
        }
        DUST => {
            let base = match region {
                Region { populated: true, .. } => 20.0,
                Region { arid: true, .. } => 50.0,
                _ => 10.0,
            };
            // Dust peaks in spring and summer.
            Some(
                SeasonalModel::new(base, base * 0.5, base * 0.2)
                    .phase(80.0)
                    .at_least(1.0),
            )
        }
        _ => None,
    }
}

pub struct GesDiscSource {
    descriptor: SourceDescriptor,
}

impl GesDiscSource {
    pub fn new(weight: f64) -> Self {
        Self {
            descriptor: descriptor(weight),
        }
    }
}

#[async_trait]
impl FrameSource for GesDiscSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    async fn native_frame(
        &self,
        request: &FetchRequest,
        native_columns: &[&'static str],
    ) -> Result<DataFrame, SourceError> {
        let region = Region::classify(request.latitude, request.longitude);
        debug!(
            "Generating MERRA-2 climatology {:?} for {:?}",
            native_columns, region
        );
        let models: Vec<(&'static str, SeasonalModel)> = native_columns
            .iter()
            .filter_map(|c| Some((*c, model(c, region)?)))
            .collect();
        synthesize(SourceId::GesDisc, request, &models)
    }
}
