use crate::types::source::SourceId;
use polars::error::PolarsError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::SystemTimeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("Request to {0} timed out")]
    Timeout(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse JSON response from {url}")]
    JsonParse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected response format from {source_id}: {message}")]
    UnexpectedFormat { source_id: SourceId, message: String },

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Failed to read metadata for cache file '{0}'")]
    CacheMetadataRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to calculate system time difference for {0:?}")]
    SystemTimeCalculation(PathBuf, #[source] SystemTimeError),

    #[error("Failed to scan parquet cache file '{0}'")]
    ParquetScan(PathBuf, #[source] PolarsError),

    #[error("I/O error writing parquet cache file '{0}'")]
    ParquetWriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing parquet cache file '{0}'")]
    ParquetWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to move cache file into place at '{0}'")]
    CachePersist(PathBuf, #[source] tempfile::PersistError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// The two ways a single source can fail to contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    /// Transport, provider or local I/O failure.
    SourceUnavailable,
    /// The provider answered but the payload did not match the expected schema.
    DataFormatError,
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceErrorKind::SourceUnavailable => "source_unavailable",
            SourceErrorKind::DataFormatError => "data_format_error",
        })
    }
}

impl SourceError {
    pub fn kind(&self) -> SourceErrorKind {
        match self {
            SourceError::JsonParse { .. }
            | SourceError::UnexpectedFormat { .. }
            | SourceError::DataFrameProcessing(_) => SourceErrorKind::DataFormatError,
            _ => SourceErrorKind::SourceUnavailable,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            SourceError::HttpStatus { status, .. } if *status == reqwest::StatusCode::TOO_MANY_REQUESTS
        )
    }

    pub(crate) fn from_status(url: String, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return SourceError::Timeout(url, error);
        }
        match error.status() {
            Some(status) => SourceError::HttpStatus {
                url,
                status,
                source: error,
            },
            None => SourceError::NetworkRequest(url, error),
        }
    }
}
