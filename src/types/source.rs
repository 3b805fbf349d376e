//! Identifiers and static descriptions of the climate data providers.

use crate::types::parameter::Parameter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one of the known climate data providers.
///
/// Sources are addressed by this enum everywhere (registry, consensus, reports) so a
/// misspelled provider name is a compile error instead of a silent lookup miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// NASA POWER daily point API (MERRA-2 / GEOS based reanalysis).
    NasaPower,
    /// Open-Meteo historical archive, basic daily variables.
    OpenMeteo,
    /// Open-Meteo historical archive, extended variables (apparent temperature, weather code, gusts).
    OpenMeteoEnhanced,
    /// NASA GES DISC MERRA-2 aerosol products.
    GesDisc,
    /// CPTEC/INPE regional model output, South America only.
    Cptec,
}

impl SourceId {
    pub const ALL: [SourceId; 5] = [
        SourceId::NasaPower,
        SourceId::OpenMeteo,
        SourceId::OpenMeteoEnhanced,
        SourceId::GesDisc,
        SourceId::Cptec,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SourceId::NasaPower => "nasa_power",
            SourceId::OpenMeteo => "open_meteo",
            SourceId::OpenMeteoEnhanced => "open_meteo_enhanced",
            SourceId::GesDisc => "ges_disc",
            SourceId::Cptec => "cptec",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SourceId::NasaPower => "NASA POWER",
            SourceId::OpenMeteo => "Open-Meteo Archive",
            SourceId::OpenMeteoEnhanced => "Open-Meteo Archive (extended)",
            SourceId::GesDisc => "NASA GES DISC MERRA-2",
            SourceId::Cptec => "CPTEC/INPE",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Geographic area a source can answer for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coverage {
    Global,
    /// Exclusive latitude/longitude bounds.
    BoundingBox {
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    },
}

impl Coverage {
    pub const SOUTH_AMERICA: Coverage = Coverage::BoundingBox {
        min_lat: -60.0,
        max_lat: 15.0,
        min_lon: -85.0,
        max_lon: -30.0,
    };

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        match *self {
            Coverage::Global => true,
            Coverage::BoundingBox {
                min_lat,
                max_lat,
                min_lon,
                max_lon,
            } => {
                latitude > min_lat
                    && latitude < max_lat
                    && longitude > min_lon
                    && longitude < max_lon
            }
        }
    }
}

/// Maps one canonical parameter to the provider column(s) carrying it.
///
/// Native names are tried in order; the first one present in a provider table wins.
/// `scale` converts the provider's unit into the canonical unit of the parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterAlias {
    pub parameter: Parameter,
    pub native_names: &'static [&'static str],
    pub scale: f64,
}

impl ParameterAlias {
    pub const fn new(parameter: Parameter, native_names: &'static [&'static str]) -> Self {
        Self {
            parameter,
            native_names,
            scale: 1.0,
        }
    }

    pub const fn scaled(
        parameter: Parameter,
        native_names: &'static [&'static str],
        scale: f64,
    ) -> Self {
        Self {
            parameter,
            native_names,
            scale,
        }
    }

    /// The name used when requesting this parameter from the provider.
    pub fn request_name(&self) -> Option<&'static str> {
        self.native_names.first().copied()
    }
}

/// Static description of a provider: identity, trust and the alias table that
/// translates its schema into canonical parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDescriptor {
    pub id: SourceId,
    pub display_name: &'static str,
    /// Reliability weight in `[0, 1]` used by the weighted consensus.
    pub reliability_weight: f64,
    pub coverage: Coverage,
    pub aliases: &'static [ParameterAlias],
}

impl SourceDescriptor {
    pub fn new(
        id: SourceId,
        reliability_weight: f64,
        coverage: Coverage,
        aliases: &'static [ParameterAlias],
    ) -> Self {
        Self {
            id,
            display_name: id.display_name(),
            reliability_weight: reliability_weight.clamp(0.0, 1.0),
            coverage,
            aliases,
        }
    }

    pub fn alias(&self, parameter: Parameter) -> Option<&ParameterAlias> {
        self.aliases.iter().find(|a| a.parameter == parameter)
    }

    pub fn serves(&self, parameter: Parameter) -> bool {
        self.alias(parameter).is_some()
    }

    pub fn covers(&self, latitude: f64, longitude: f64) -> bool {
        self.coverage.contains(latitude, longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn south_america_bounds_are_exclusive() {
        let coverage = Coverage::SOUTH_AMERICA;
        assert!(coverage.contains(-23.55, -46.63)); // São Paulo
        assert!(!coverage.contains(52.52, 13.40)); // Berlin
        assert!(!coverage.contains(15.0, -50.0));
        assert!(!coverage.contains(-10.0, -30.0));
        assert!(Coverage::Global.contains(89.9, 179.9));
    }

    #[test]
    fn descriptor_clamps_weight() {
        static ALIASES: [ParameterAlias; 1] = [ParameterAlias::new(Parameter::Dust, &["DUSMASS"])];
        let descriptor = SourceDescriptor::new(SourceId::GesDisc, 1.7, Coverage::Global, &ALIASES);
        assert_eq!(descriptor.reliability_weight, 1.0);
        assert!(descriptor.serves(Parameter::Dust));
        assert!(!descriptor.serves(Parameter::Temperature));
        assert_eq!(
            descriptor.alias(Parameter::Dust).and_then(|a| a.request_name()),
            Some("DUSMASS")
        );
    }
}
