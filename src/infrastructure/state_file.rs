//! JSON file implementation of the crash-state store.
//!
//! The record is written atomically (temp file + rename) and fsynced
//! before `persist` returns, because the apply that follows may take the
//! whole machine down. A corrupted record is cleared and treated as
//! absent rather than blocking startup.

use crate::domain::models::CrashState;
use crate::domain::ports::errors::StateStoreError;
use crate::domain::ports::CrashStateStore;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Crash-state store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonStateFile {
    path: PathBuf,
}

impl JsonStateFile {
    /// Create a store writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the record on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

#[async_trait]
impl CrashStateStore for JsonStateFile {
    async fn persist(&self, state: &CrashState) -> Result<(), StateStoreError> {
        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp = self.tmp_path();

        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &self.path).await?;

        debug!(
            path = %self.path.display(),
            core = state.current_core,
            value = state.current_value,
            "persisted crash record"
        );
        Ok(())
    }

    async fn load(&self) -> Result<Option<CrashState>, StateStoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice::<CrashState>(&bytes) {
            Ok(state) => Ok(Some(state)),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "corrupted crash record; clearing"
                );
                self.clear().await?;
                Ok(None)
            }
        }
    }

    async fn clear(&self) -> Result<(), StateStoreError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "cleared crash record");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::PersistedConfig;
    use std::collections::BTreeMap;

    fn sample_state() -> CrashState {
        let mut failed = BTreeMap::new();
        failed.insert(2, vec![-20, -25]);
        CrashState::for_test(
            2,
            -25,
            [-15, -20, -15, 0],
            failed,
            PersistedConfig {
                step_size: 5,
                test_duration: 60,
                safety_margin: 5,
            },
        )
    }

    #[tokio::test]
    async fn test_persist_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateFile::new(dir.path().join("state.json"));

        let state = sample_state();
        store.persist(&state).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateFile::new(dir.path().join("state.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateFile::new(dir.path().join("state.json"));

        store.persist(&sample_state()).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupted_record_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{not json").await.unwrap();

        let store = JsonStateFile::new(&path);
        assert!(store.load().await.unwrap().is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_persist_overwrites_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateFile::new(dir.path().join("state.json"));

        let mut state = sample_state();
        store.persist(&state).await.unwrap();
        state.current_value = -30;
        store.persist(&state).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.current_value, -30);
    }
}
