use crate::sources::error::SourceError;
use crate::types::source::SourceId;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClimateError {
    /// Bad coordinates, dates or ranges supplied by the caller.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No data source returned data (attempted: {})", format_sources(.attempted))]
    NoSourcesAvailable { attempted: Vec<SourceId> },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Request did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),

    #[error("Failed to read configuration file '{0}'")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse configuration")]
    ConfigParse(#[source] serde_json::Error),

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

impl ClimateError {
    /// Errors caused by the caller's input (HTTP 400 class) rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ClimateError::InvalidArgument(_))
    }
}

fn format_sources(sources: &[SourceId]) -> String {
    if sources.is_empty() {
        return "none".to_string();
    }
    sources
        .iter()
        .map(|s| s.name())
        .collect::<Vec<_>>()
        .join(", ")
}
