//! C8 — settings store: durable persistence for [`EngineSettings`] on a
//! plain JSON file, write-temp-then-rename so a crash mid-write can never
//! leave a half-written settings file behind.

use std::path::{Path, PathBuf};

use engine_common::EngineSettings;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum SettingsStoreError {
    #[error("failed to read settings file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to write settings file {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("settings file {path} is not valid JSON: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("failed to serialize settings: {0}")]
    Serialize(serde_json::Error),
}

/// Guards concurrent `save` calls with a dedicated lock, independent of
/// whatever lock the engine manager holds over its own in-memory state —
/// a failed write never touches the caller's in-memory snapshot, so a
/// recoverable I/O error here leaves the engine running on the settings it
/// already had.
pub struct SettingsStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file is not an error: a fresh install has no settings yet,
    /// so this returns `EngineSettings::empty()`.
    pub async fn load(&self) -> Result<EngineSettings, SettingsStoreError> {
        let _permit = self.lock.read().await;
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| SettingsStoreError::Parse {
                path: self.path.clone(),
                source,
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(EngineSettings::empty()),
            Err(source) => Err(SettingsStoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    pub async fn save(&self, settings: &EngineSettings) -> Result<(), SettingsStoreError> {
        let _permit = self.lock.write().await;
        let json = serde_json::to_string_pretty(settings).map_err(SettingsStoreError::Serialize)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| SettingsStoreError::Write {
                        path: self.path.clone(),
                        source,
                    })?;
            }
        }

        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, json.as_bytes())
            .await
            .map_err(|source| SettingsStoreError::Write {
                path: tmp_path.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| SettingsStoreError::Write {
                path: self.path.clone(),
                source,
            })
    }

    fn tmp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| format!("{}.tmp", n.to_string_lossy()))
            .unwrap_or_else(|| "settings.tmp".to_string());
        self.path.with_file_name(file_name)
    }
}
