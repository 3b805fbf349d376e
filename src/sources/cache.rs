use crate::sources::error::SourceError;
use crate::sources::FetchRequest;
use crate::types::source::SourceId;
use log::{debug, info, warn};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;
use tokio::{fs, task};

/// Parquet files holding native provider frames, one per request key.
///
/// Entries older than the TTL count as absent. A failing cache never fails a fetch:
/// read and write errors are logged and treated as a miss.
#[derive(Debug, Clone)]
pub struct FrameCache {
    dir: PathBuf,
    ttl: Duration,
}

impl FrameCache {
    pub fn new(dir: &Path, ttl: Duration) -> Self {
        Self {
            dir: dir.to_path_buf(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic file name for `(source, lat, lon, start, end, sorted parameters)`.
    ///
    /// The suffix is a CRC-32 of the exact coordinates and the parameter list, so the
    /// same request maps to the same file across builds and toolchains.
    pub fn key(source: SourceId, request: &FetchRequest) -> String {
        let parameters: Vec<&str> = request.parameters().iter().map(|p| p.name()).collect();
        let identity = format!(
            "{}|{:016x}|{:016x}|{}|{}|{}",
            source.name(),
            request.latitude.to_bits(),
            request.longitude.to_bits(),
            request.start,
            request.end,
            parameters.join(",")
        );
        format!(
            "{}_{:.2}_{:.2}_{}_{}_{:08x}.parquet",
            source.name(),
            request.latitude,
            request.longitude,
            request.start.format("%Y%m%d"),
            request.end.format("%Y%m%d"),
            crc32fast::hash(identity.as_bytes())
        )
    }

    pub async fn load(&self, key: &str) -> Option<DataFrame> {
        let path = self.dir.join(key);
        match self.try_load(&path).await {
            Ok(Some(df)) => {
                info!("Cache hit for {:?} ({} rows)", path, df.height());
                Some(df)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring unreadable cache file {:?}: {}", path, e);
                None
            }
        }
    }

    async fn try_load(&self, path: &Path) -> Result<Option<DataFrame>, SourceError> {
        let metadata = match fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(_) => {
                debug!("Cache miss for {:?}", path);
                return Ok(None);
            }
        };
        let modified = metadata
            .modified()
            .map_err(|e| SourceError::CacheMetadataRead(path.to_path_buf(), e))?;
        let age = SystemTime::now()
            .duration_since(modified)
            .map_err(|e| SourceError::SystemTimeCalculation(path.to_path_buf(), e))?;
        if age > self.ttl {
            warn!(
                "Cache entry {:?} is {} days old, refetching",
                path,
                age.as_secs() / 86_400
            );
            return Ok(None);
        }

        let path_buf = path.to_path_buf();
        let df = task::spawn_blocking(move || {
            LazyFrame::scan_parquet(&path_buf, Default::default())
                .and_then(|lf| lf.collect())
                .map_err(|e| SourceError::ParquetScan(path_buf, e))
        })
        .await??;
        Ok(Some(df))
    }

    pub async fn store(&self, key: &str, df: DataFrame) {
        let path = self.dir.join(key);
        match self.try_store(&path, df).await {
            Ok(()) => info!("Cached native frame to {:?}", path),
            Err(e) => warn!("Failed to cache frame to {:?}: {}", path, e),
        }
    }

    /// Writes through a temp file in the cache dir and renames it into place, so
    /// concurrent writers of the same key never leave a torn file behind.
    async fn try_store(&self, path: &Path, mut df: DataFrame) -> Result<(), SourceError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SourceError::ParquetWriteIo(self.dir.clone(), e))?;
        let dir = self.dir.clone();
        let path_buf = path.to_path_buf();
        task::spawn_blocking(move || {
            let mut temp = NamedTempFile::new_in(&dir)
                .map_err(|e| SourceError::ParquetWriteIo(path_buf.clone(), e))?;
            ParquetWriter::new(&mut temp)
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)
                .map_err(|e| SourceError::ParquetWritePolars(path_buf.clone(), e))?;
            temp.persist(&path_buf)
                .map_err(|e| SourceError::CachePersist(path_buf, e))?;
            Ok::<(), SourceError>(())
        })
        .await??;
        Ok(())
    }
}
