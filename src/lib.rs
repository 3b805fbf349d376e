pub mod analysis;
mod climate_odds;
mod config;
mod consensus;
mod error;
mod orchestrator;
pub mod sources;
mod types;
pub mod units;
mod utils;

pub use climate_odds::*;
pub use config::*;
pub use error::ClimateError;

pub use consensus::{ConsensusEngine, ConsensusOptions};
pub use orchestrator::{FetchOrchestrator, MultiSourceData};

pub use sources::error::{SourceError, SourceErrorKind};
pub use sources::registry::{sources_for_parameter, SourceRegistry};
pub use sources::{FetchRequest, SourceAdapter};

pub use types::consensus::{Confidence, ConsensusResult};
pub use types::location::{LatLon, YearRange};
pub use types::parameter::{Parameter, UnknownParameter};
pub use types::report::*;
pub use types::series::{DataPoint, ParameterSeries, SeriesSet};
pub use types::source::{Coverage, ParameterAlias, SourceDescriptor, SourceId};
pub use types::weather_code::{WeatherCategory, WeatherCode};

pub use units::UnitPreferences;
pub use utils::{
    categorize_probability, day_of_year_label, format_probability, probability_description,
    season_for_day, Hemisphere,
};
