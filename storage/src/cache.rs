use kgprep_core::error::{ErrorCode, KgprepError};
use kgprep_core::hash::ContentHash;
use kgprep_core::model::{Split, Triple};
use rkyv::ser::{serializers::AllocSerializer, Serializer};
use rkyv::{AlignedVec, Deserialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

pub const CACHE_EXTENSION: &str = "rkyv";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to persist {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no cached triples at {0}")]
    Missing(PathBuf),
    #[error("cached triples at {0} failed validation")]
    Corrupt(PathBuf),
}

impl CacheError {
    fn persistence(path: &Path, source: io::Error) -> Self {
        CacheError::Persistence {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl KgprepError for CacheError {
    fn error_code(&self) -> ErrorCode {
        match self {
            CacheError::Persistence { .. } => ErrorCode::Internal,
            CacheError::Missing(_) => ErrorCode::NotFound,
            CacheError::Corrupt(_) => ErrorCode::Internal,
        }
    }
}

/// Whether a cache entry exists. An in-flight write only exists as a staging
/// file next to the entry, so readers never see a partial entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Absent,
    Present,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { path: PathBuf, content_hash: String },
    AlreadyExists { path: PathBuf },
}

impl SaveOutcome {
    pub fn path(&self) -> &Path {
        match self {
            SaveOutcome::Saved { path, .. } => path,
            SaveOutcome::AlreadyExists { path } => path,
        }
    }

    pub fn was_written(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

/// Write-once store of per-split triple sequences.
pub struct SplitCache {
    dir: PathBuf,
}

impl SplitCache {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// `<dir>/<dataset>_triples_<split>.rkyv`
    pub fn path_for(&self, dataset: &str, split: Split) -> PathBuf {
        self.dir
            .join(format!("{}_triples_{}.{}", dataset, split, CACHE_EXTENSION))
    }

    /// Where a write of `(dataset, split)` is staged before it is published.
    pub fn staging_path_for(&self, dataset: &str, split: Split) -> PathBuf {
        temp_path_for(&self.path_for(dataset, split))
    }

    pub async fn state(&self, dataset: &str, split: Split) -> Result<CacheState, CacheError> {
        let path = self.path_for(dataset, split);
        entry_state(&path).await
    }

    /// Persist `triples` unless an entry for `(dataset, split)` already exists.
    /// The file appears complete or not at all; an existing file is never
    /// replaced.
    pub async fn save(
        &self,
        dataset: &str,
        split: Split,
        triples: &[Triple],
    ) -> Result<SaveOutcome, CacheError> {
        let path = self.path_for(dataset, split);

        if entry_state(&path).await? == CacheState::Present {
            info!(path = %path.display(), "triples already cached, skipping");
            return Ok(SaveOutcome::AlreadyExists { path });
        }

        debug!(path = %path.display(), triples = triples.len(), "writing triples");
        let bytes = encode(triples).map_err(|e| CacheError::persistence(&path, e))?;
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CacheError::persistence(&path, e))?;

        let staging = temp_path_for(&path);
        if !publish(&staging, &path, &bytes).await? {
            info!(path = %path.display(), "triples cached concurrently, skipping");
            return Ok(SaveOutcome::AlreadyExists { path });
        }

        let content_hash = triples.content_hash();
        info!(
            path = %path.display(),
            triples = triples.len(),
            content_hash = %content_hash,
            "saved triples"
        );
        Ok(SaveOutcome::Saved { path, content_hash })
    }

    /// Read a cached split back in its original order.
    pub async fn load(&self, dataset: &str, split: Split) -> Result<Vec<Triple>, CacheError> {
        let path = self.path_for(dataset, split);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CacheError::Missing(path));
            }
            Err(e) => return Err(CacheError::persistence(&path, e)),
        };

        let mut aligned = AlignedVec::with_capacity(bytes.len());
        aligned.extend_from_slice(&bytes);

        let archived = rkyv::check_archived_root::<Vec<Triple>>(&aligned[..])
            .map_err(|_| CacheError::Corrupt(path.clone()))?;
        archived
            .deserialize(&mut rkyv::Infallible)
            .map_err(|_| CacheError::Corrupt(path))
    }
}

async fn entry_state(path: &Path) -> Result<CacheState, CacheError> {
    match fs::try_exists(path).await {
        Ok(true) => Ok(CacheState::Present),
        Ok(false) => Ok(CacheState::Absent),
        Err(e) => Err(CacheError::persistence(path, e)),
    }
}

/// Writes `bytes` to `staging`, then links it to `path`. Returns `false`
/// without touching `path` if it appeared after the existence check.
async fn publish(staging: &Path, path: &Path, bytes: &[u8]) -> Result<bool, CacheError> {
    if let Err(e) = write_synced(staging, bytes).await {
        discard(staging).await;
        return Err(CacheError::persistence(path, e));
    }

    // hard_link refuses to replace an existing target, unlike rename.
    let linked = fs::hard_link(staging, path).await;
    discard(staging).await;
    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(CacheError::persistence(path, e)),
    }
}

fn encode(triples: &[Triple]) -> Result<AlignedVec, io::Error> {
    let mut serializer = AllocSerializer::<4096>::default();
    serializer
        .serialize_value(&triples.to_vec())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{:?}", e)))?;
    Ok(serializer.into_serializer().into_inner())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

async fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove temp file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn path_follows_naming_scheme() {
        let cache = SplitCache::new("data/triples");
        assert_eq!(
            cache.path_for("WN18RR", Split::Train),
            PathBuf::from("data/triples/WN18RR_triples_train.rkyv")
        );
        assert_eq!(
            cache.path_for("FB15k-237", Split::Validation),
            PathBuf::from("data/triples/FB15k-237_triples_valid.rkyv")
        );
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let cache = SplitCache::new(dir.path().join("triples"));
        let triples = vec![
            Triple::new(0u64, 5u64, 9534u64),
            Triple::new(1u64, 10u64, 9788u64),
            Triple::new(0u64, 5u64, 9534u64),
        ];

        assert_eq!(
            cache.state("WN18", Split::Test).await.unwrap(),
            CacheState::Absent
        );

        let outcome = cache.save("WN18", Split::Test, &triples).await.unwrap();
        assert!(outcome.was_written());
        assert_eq!(
            cache.state("WN18", Split::Test).await.unwrap(),
            CacheState::Present
        );

        let loaded = cache.load("WN18", Split::Test).await.unwrap();
        assert_eq!(loaded, triples);
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let cache = SplitCache::new(dir.path());
        cache
            .save("YAGO3-10", Split::Train, &[Triple::new("a", "r", "b")])
            .await
            .unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["YAGO3-10_triples_train.rkyv".to_string()]);
    }

    #[tokio::test]
    async fn test_publish_never_replaces_a_late_entry() {
        let dir = tempdir().unwrap();
        let cache = SplitCache::new(dir.path());
        let path = cache.path_for("WN18", Split::Train);
        let staging = cache.staging_path_for("WN18", Split::Train);

        // Another writer finished between the existence check and the link.
        std::fs::write(&path, b"first writer").unwrap();

        let linked = publish(&staging, &path, b"second writer").await.unwrap();
        assert!(!linked);
        assert_eq!(std::fs::read(&path).unwrap(), b"first writer");
        assert!(!staging.exists());
    }

    #[tokio::test]
    async fn test_load_missing() {
        let dir = tempdir().unwrap();
        let cache = SplitCache::new(dir.path());
        let err = cache.load("WN18", Split::Train).await.unwrap_err();
        assert!(matches!(err, CacheError::Missing(_)));
        assert_eq!(err.error_code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_load_rejects_garbage() {
        let dir = tempdir().unwrap();
        let cache = SplitCache::new(dir.path());
        std::fs::write(cache.path_for("WN18", Split::Train), b"not an archive").unwrap();
        let err = cache.load("WN18", Split::Train).await.unwrap_err();
        assert!(matches!(err, CacheError::Corrupt(_)));
    }
}
