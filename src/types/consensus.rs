use crate::types::parameter::Parameter;
use crate::types::source::SourceId;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Discrete confidence of a consensus value, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// No source contributed, there is no value.
    None,
    VeryLow,
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::None => "none",
            Confidence::VeryLow => "very_low",
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        })
    }
}

/// Reconciled estimate of one parameter across all sources that reported it.
///
/// Built fresh for every query and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusResult {
    pub parameter: Parameter,
    /// Reliability-weighted mean of the contributing source means.
    pub consensus_value: Option<f64>,
    pub confidence: Confidence,
    /// `exp(-2 * cv)` of the contributing source means, in `[0, 1]`.
    pub agreement_level: f64,
    pub contributing_sources: BTreeSet<SourceId>,
    /// Mean reported by every source carrying the parameter, outliers included.
    pub per_source_values: BTreeMap<SourceId, f64>,
    /// Population standard deviation of the contributing source means.
    pub standard_deviation: f64,
    pub confidence_interval: Option<(f64, f64)>,
    /// Sources whose mean deviates from the cross-source median by more than the
    /// configured fraction.
    pub outlier_sources: BTreeSet<SourceId>,
    /// True when flagged outliers were left out of `contributing_sources`.
    pub outliers_excluded: bool,
}

impl ConsensusResult {
    pub fn empty(parameter: Parameter) -> Self {
        Self {
            parameter,
            consensus_value: None,
            confidence: Confidence::None,
            agreement_level: 0.0,
            contributing_sources: BTreeSet::new(),
            per_source_values: BTreeMap::new(),
            standard_deviation: 0.0,
            confidence_interval: None,
            outlier_sources: BTreeSet::new(),
            outliers_excluded: false,
        }
    }

    pub fn source_count(&self) -> usize {
        self.contributing_sources.len()
    }
}
